//! Load-time checks the interpreter is entitled to assume.
//!
//! The VM still guards register and upvalue accesses at run time, but a
//! program that passes `verify_program` never trips those guards through
//! its operands alone.

use memory::Instruction;
use thiserror::Error;

use crate::loader::Program;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("program has no code objects")]
    NoPrototypes,

    #[error("entry P[{entry}] out of range ({count} code objects)")]
    EntryOutOfRange { entry: u16, count: usize },

    #[error("'{code}' has no instructions")]
    EmptyCode { code: String },

    #[error("'{code}' instruction {index}: register R{reg} outside stack size {size}")]
    RegisterOutOfBounds {
        code: String,
        index: usize,
        reg: u8,
        size: u16,
    },

    #[error("'{code}' instruction {index}: MAKE_FUNCTION references P[{proto}] ({count} code objects)")]
    UnknownPrototype {
        code: String,
        index: usize,
        proto: u16,
        count: usize,
    },

    #[error("'{code}' instruction {index}: BIND does not follow MAKE_FUNCTION")]
    OrphanBind { code: String, index: usize },
}

pub fn verify_program(program: &Program) -> Result<(), VerifyError> {
    let count = program.prototypes.len();
    if count == 0 {
        return Err(VerifyError::NoPrototypes);
    }
    if program.entry as usize >= count {
        return Err(VerifyError::EntryOutOfRange {
            entry: program.entry,
            count,
        });
    }

    for code in &program.prototypes {
        if code.instructions.is_empty() {
            return Err(VerifyError::EmptyCode {
                code: code.name.clone(),
            });
        }

        // True while inside a MAKE_FUNCTION + BIND* run.
        let mut binding = false;

        for (index, instr) in code.instructions.iter().enumerate() {
            for reg in instr.registers() {
                if reg as u16 >= code.stack_size {
                    return Err(VerifyError::RegisterOutOfBounds {
                        code: code.name.clone(),
                        index,
                        reg,
                        size: code.stack_size,
                    });
                }
            }

            match instr {
                Instruction::MakeFunction { code: proto, .. } => {
                    if *proto as usize >= count {
                        return Err(VerifyError::UnknownPrototype {
                            code: code.name.clone(),
                            index,
                            proto: *proto,
                            count,
                        });
                    }
                    binding = true;
                }
                Instruction::Bind { .. } => {
                    if !binding {
                        return Err(VerifyError::OrphanBind {
                            code: code.name.clone(),
                            index,
                        });
                    }
                }
                _ => binding = false,
            }
        }
    }

    Ok(())
}
