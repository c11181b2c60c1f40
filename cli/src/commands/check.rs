use anyhow::Result;

use super::open_program;

pub fn check_file(path: &str) -> Result<()> {
    println!("{}", check_summary(path)?);
    Ok(())
}

/// One-line summary of a verified executable.
pub fn check_summary(path: &str) -> Result<String> {
    let program = open_program(path, true)?;
    let entry = program
        .entry_code()
        .map(|c| c.name.as_str())
        .unwrap_or("?");
    Ok(format!(
        "{}: ok ({} code objects, entry P[{}] '{}')",
        path,
        program.prototypes.len(),
        program.entry,
        entry
    ))
}
