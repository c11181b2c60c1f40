//! Compiled code objects and the logical instruction set.
//!
//! A `CodeObject` is immutable once built. Many closures may share the same
//! code object; the heap hands out `u32` handles to it.

use std::fmt;

/// One decoded instruction. Register operands are relative to the executing
/// frame's base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// R[target] = new closure over prototype `code`; becomes the pending closure.
    MakeFunction { target: u8, code: u16 },
    /// pending.upvalues[upval_index] = capture(base + stack_offset)
    Bind { upval_index: u8, stack_offset: u8 },
    /// R[target] = R[a] + R[b]
    Add { target: u8, a: u8, b: u8 },
    /// R[0] = R[result]; close upvalues >= base; pop frame
    Return { result: u8 },
    /// R[target] = Upval[upval_index]
    GetUpval { target: u8, upval_index: u8 },
    /// Upval[upval_index] = R[source]
    SetUpval { source: u8, upval_index: u8 },
    /// R[target] = value
    LoadConstant { target: u8, value: f64 },
    /// Push frame for R[function] with base = base + arg_base
    Call { function: u8, arg_base: u8, n_args: u8 },
    /// R[target] = R[source]
    Copy { target: u8, source: u8 },
    /// Stop the machine
    Halt,
}

impl Instruction {
    /// Canonical upper-case mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::MakeFunction { .. } => "MAKE_FUNCTION",
            Instruction::Bind { .. } => "BIND",
            Instruction::Add { .. } => "ADD",
            Instruction::Return { .. } => "RETURN",
            Instruction::GetUpval { .. } => "GET_UPVAL",
            Instruction::SetUpval { .. } => "SET_UPVAL",
            Instruction::LoadConstant { .. } => "LOAD_CONSTANT",
            Instruction::Call { .. } => "CALL",
            Instruction::Copy { .. } => "COPY",
            Instruction::Halt => "HALT",
        }
    }

    /// Registers this instruction reads or writes in its own frame.
    ///
    /// BIND's stack offset counts as a register: it must lie inside the
    /// window of the frame creating the closure.
    pub fn registers(&self) -> Vec<u8> {
        match *self {
            Instruction::MakeFunction { target, .. } => vec![target],
            Instruction::Bind { stack_offset, .. } => vec![stack_offset],
            Instruction::Add { target, a, b } => vec![target, a, b],
            Instruction::Return { result } => vec![result],
            Instruction::GetUpval { target, .. } => vec![target],
            Instruction::SetUpval { source, .. } => vec![source],
            Instruction::LoadConstant { target, .. } => vec![target],
            Instruction::Call {
                function, arg_base, ..
            } => vec![function, arg_base],
            Instruction::Copy { target, source } => vec![target, source],
            Instruction::Halt => vec![],
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic();
        match *self {
            Instruction::MakeFunction { target, code } => {
                write!(f, "{:<14} R{}, P[{}]", name, target, code)
            }
            Instruction::Bind {
                upval_index,
                stack_offset,
            } => write!(f, "{:<14} U{}, R{}", name, upval_index, stack_offset),
            Instruction::Add { target, a, b } => {
                write!(f, "{:<14} R{}, R{}, R{}", name, target, a, b)
            }
            Instruction::Return { result } => write!(f, "{:<14} R{}", name, result),
            Instruction::GetUpval {
                target,
                upval_index,
            } => write!(f, "{:<14} R{}, U{}", name, target, upval_index),
            Instruction::SetUpval {
                source,
                upval_index,
            } => write!(f, "{:<14} R{}, U{}", name, source, upval_index),
            Instruction::LoadConstant { target, value } => {
                write!(f, "{:<14} R{}, {}", name, target, value)
            }
            Instruction::Call {
                function,
                arg_base,
                n_args,
            } => write!(f, "{:<14} R{}, R{}, {}", name, function, arg_base, n_args),
            Instruction::Copy { target, source } => {
                write!(f, "{:<14} R{}, R{}", name, target, source)
            }
            Instruction::Halt => write!(f, "{}", name),
        }
    }
}

/// An immutable compiled unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub name: String,
    /// Register window this code needs, starting at its frame's base.
    pub stack_size: u16,
    pub instructions: Vec<Instruction>,
}

impl CodeObject {
    pub fn new(name: impl Into<String>, stack_size: u16, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            stack_size,
            instructions,
        }
    }
}
