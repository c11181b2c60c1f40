pub mod check;
pub mod disassemble;
pub mod run;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use vm::loader::{self, Program};

/// Open `path` and parse it, verifying unless `verify` is false.
pub(crate) fn open_program(path: &str, verify: bool) -> Result<Program> {
    let file = File::open(path).with_context(|| format!("Failed to open executable {}", path))?;
    let mut reader = BufReader::new(file);
    let program = if verify {
        loader::load_program(&mut reader)
    } else {
        loader::read_program(&mut reader)
    };
    program.map_err(|e| anyhow::anyhow!("Loader Error: {}", e))
}
