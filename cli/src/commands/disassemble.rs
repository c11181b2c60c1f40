use anyhow::Result;
use std::fmt::Write;
use vm::opcode::{self, OpCode};
use vm::Program;

use super::open_program;

/// Print every code object. The program is not verified, so broken
/// executables can still be inspected.
pub fn disassemble_file(path: &str) -> Result<()> {
    let program = open_program(path, false)?;
    println!("== Disassembly of {} ==", path);
    print!("{}", disassemble(&program)?);
    Ok(())
}

pub fn disassemble(program: &Program) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "entry: P[{}]", program.entry)?;

    for (p, code) in program.prototypes.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "P[{}] {} (stack_size {}, {} instructions)",
            p,
            code.name,
            code.stack_size,
            code.instructions.len()
        )?;

        // Re-encode so the listing shows the raw word next to the decoded form.
        let mut constants = Vec::new();
        for (i, instr) in code.instructions.iter().enumerate() {
            let word = opcode::encode(instr, &mut constants)?;
            match OpCode::of(instr) {
                OpCode::LoadConstant => {
                    let k = opcode::instruction::decode_bx(word);
                    writeln!(out, "{:04} {:08x} {} ; K[{}]", i, word, instr, k)?;
                }
                _ => writeln!(out, "{:04} {:08x} {}", i, word, instr)?,
            }
        }
    }
    Ok(out)
}
