//! OpCode definitions and the on-disk instruction encoding.
//!
//! Instructions are encoded as 32-bit values with the following formats:
//!
//! Format ABC: [8-bit opcode][8-bit A][8-bit B][8-bit C]
//! Format ABx: [8-bit opcode][8-bit A][16-bit Bx]
//!
//! LOAD_CONSTANT cannot carry an `f64` in 16 bits, so its literal lives in
//! the code object's constant pool and Bx indexes it.

use memory::Instruction;
use std::fmt;
use thiserror::Error;

use instruction::*;

/// Virtual machine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Closure: R[A] = Closure(P[Bx])
    MakeFunction = 1,
    /// Bind: pending.Upval[A] = capture(base + B)
    Bind = 2,
    /// Addition: R[A] = R[B] + R[C]
    Add = 3,
    /// Return: return R[A]
    Return = 4,
    /// R[A] = Upval[B]
    GetUpval = 5,
    /// Upval[B] = R[A]
    SetUpval = 6,
    /// Load constant from pool: R[A] = K[Bx]
    LoadConstant = 7,
    /// Call R[A] with its frame starting at R[B]; C = argument count
    Call = 8,
    /// Move register: R[A] = R[B]
    Copy = 9,
    Halt = 10,
}

impl OpCode {
    /// Get opcode from byte value
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(OpCode::MakeFunction),
            2 => Some(OpCode::Bind),
            3 => Some(OpCode::Add),
            4 => Some(OpCode::Return),
            5 => Some(OpCode::GetUpval),
            6 => Some(OpCode::SetUpval),
            7 => Some(OpCode::LoadConstant),
            8 => Some(OpCode::Call),
            9 => Some(OpCode::Copy),
            10 => Some(OpCode::Halt),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            OpCode::MakeFunction => "MAKE_FUNCTION",
            OpCode::Bind => "BIND",
            OpCode::Add => "ADD",
            OpCode::Return => "RETURN",
            OpCode::GetUpval => "GET_UPVAL",
            OpCode::SetUpval => "SET_UPVAL",
            OpCode::LoadConstant => "LOAD_CONSTANT",
            OpCode::Call => "CALL",
            OpCode::Copy => "COPY",
            OpCode::Halt => "HALT",
        }
    }

    pub fn of(instruction: &Instruction) -> Self {
        match instruction {
            Instruction::MakeFunction { .. } => OpCode::MakeFunction,
            Instruction::Bind { .. } => OpCode::Bind,
            Instruction::Add { .. } => OpCode::Add,
            Instruction::Return { .. } => OpCode::Return,
            Instruction::GetUpval { .. } => OpCode::GetUpval,
            Instruction::SetUpval { .. } => OpCode::SetUpval,
            Instruction::LoadConstant { .. } => OpCode::LoadConstant,
            Instruction::Call { .. } => OpCode::Call,
            Instruction::Copy { .. } => OpCode::Copy,
            Instruction::Halt => OpCode::Halt,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("constant K[{index}] out of range (pool has {len})")]
    ConstantOutOfRange { index: u16, len: usize },
    #[error("constant pool is full")]
    ConstantPoolFull,
}

/// Encode one instruction, interning LOAD_CONSTANT literals into `constants`.
pub fn encode(instr: &Instruction, constants: &mut Vec<f64>) -> Result<u32, CodecError> {
    let op = OpCode::of(instr).as_u8();
    let word = match *instr {
        Instruction::MakeFunction { target, code } => encode_abx(op, target, code),
        Instruction::Bind {
            upval_index,
            stack_offset,
        } => encode_abc(op, upval_index, stack_offset, 0),
        Instruction::Add { target, a, b } => encode_abc(op, target, a, b),
        Instruction::Return { result } => encode_abc(op, result, 0, 0),
        Instruction::GetUpval {
            target,
            upval_index,
        } => encode_abc(op, target, upval_index, 0),
        Instruction::SetUpval {
            source,
            upval_index,
        } => encode_abc(op, source, upval_index, 0),
        Instruction::LoadConstant { target, value } => {
            let k = intern_constant(constants, value)?;
            encode_abx(op, target, k)
        }
        Instruction::Call {
            function,
            arg_base,
            n_args,
        } => encode_abc(op, function, arg_base, n_args),
        Instruction::Copy { target, source } => encode_abc(op, target, source, 0),
        Instruction::Halt => encode_abc(op, 0, 0, 0),
    };
    Ok(word)
}

/// Decode one instruction word against its code object's constant pool.
pub fn decode(word: u32, constants: &[f64]) -> Result<Instruction, CodecError> {
    let op_byte = decode_opcode(word);
    let op = OpCode::from_u8(op_byte).ok_or(CodecError::UnknownOpcode(op_byte))?;
    let a = decode_a(word);
    let b = decode_b(word);
    let c = decode_c(word);

    let instr = match op {
        OpCode::MakeFunction => Instruction::MakeFunction {
            target: a,
            code: decode_bx(word),
        },
        OpCode::Bind => Instruction::Bind {
            upval_index: a,
            stack_offset: b,
        },
        OpCode::Add => Instruction::Add { target: a, a: b, b: c },
        OpCode::Return => Instruction::Return { result: a },
        OpCode::GetUpval => Instruction::GetUpval {
            target: a,
            upval_index: b,
        },
        OpCode::SetUpval => Instruction::SetUpval {
            source: a,
            upval_index: b,
        },
        OpCode::LoadConstant => {
            let index = decode_bx(word);
            let value = *constants
                .get(index as usize)
                .ok_or(CodecError::ConstantOutOfRange {
                    index,
                    len: constants.len(),
                })?;
            Instruction::LoadConstant { target: a, value }
        }
        OpCode::Call => Instruction::Call {
            function: a,
            arg_base: b,
            n_args: c,
        },
        OpCode::Copy => Instruction::Copy {
            target: a,
            source: b,
        },
        OpCode::Halt => Instruction::Halt,
    };
    Ok(instr)
}

// Bitwise identity so that -0.0 and NaN payloads survive a round trip.
fn intern_constant(constants: &mut Vec<f64>, value: f64) -> Result<u16, CodecError> {
    if let Some(i) = constants
        .iter()
        .position(|k| k.to_bits() == value.to_bits())
    {
        return Ok(i as u16);
    }
    if constants.len() > u16::MAX as usize {
        return Err(CodecError::ConstantPoolFull);
    }
    constants.push(value);
    Ok((constants.len() - 1) as u16)
}

/// Instruction encoding/decoding utilities
pub mod instruction {
    /// Encode instruction in ABC format
    #[inline]
    pub fn encode_abc(opcode: u8, a: u8, b: u8, c: u8) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | ((b as u32) << 8) | (c as u32)
    }

    /// Encode instruction in ABx format
    #[inline]
    pub fn encode_abx(opcode: u8, a: u8, bx: u16) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | (bx as u32)
    }

    #[inline]
    pub fn decode_opcode(instruction: u32) -> u8 {
        (instruction >> 24) as u8
    }

    #[inline]
    pub fn decode_a(instruction: u32) -> u8 {
        ((instruction >> 16) & 0xFF) as u8
    }

    #[inline]
    pub fn decode_b(instruction: u32) -> u8 {
        ((instruction >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn decode_c(instruction: u32) -> u8 {
        (instruction & 0xFF) as u8
    }

    /// Decode Bx operand (16-bit)
    #[inline]
    pub fn decode_bx(instruction: u32) -> u16 {
        (instruction & 0xFFFF) as u16
    }
}
