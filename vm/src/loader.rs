use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memory::CodeObject;
use std::io::{Read, Write};
use thiserror::Error;
use tracing::debug;

use crate::opcode::{self, CodecError};
use crate::verify::{verify_program, VerifyError};

/// Magic header of a `.upvb` executable (format version 1).
pub const MAGIC: &[u8; 4] = b"UPV\x01";

const MAX_PROTOTYPES: u32 = 65_536;
const MAX_NAME_LEN: u32 = 1024;
const MAX_CONSTANTS: u32 = 65_536;
const MAX_CODE_LEN: u32 = 1_000_000;

/// A loadable unit: every code object plus the one to start in.
///
/// MAKE_FUNCTION operands index `prototypes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub prototypes: Vec<CodeObject>,
    pub entry: u16,
}

impl Program {
    pub fn new(prototypes: Vec<CodeObject>, entry: u16) -> Self {
        Self { prototypes, entry }
    }

    pub fn entry_code(&self) -> Option<&CodeObject> {
        self.prototypes.get(self.entry as usize)
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable: {0}")]
    Format(String),
    #[error("executable rejected: {0}")]
    Security(String),
    #[error("in '{code}' at instruction {index}: {source}")]
    Codec {
        code: String,
        index: usize,
        source: CodecError,
    },
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Read an executable and verify it before handing it to the VM.
pub fn load_program<R: Read>(reader: &mut R) -> Result<Program, LoaderError> {
    let program = read_program(reader)?;
    verify_program(&program)?;
    Ok(program)
}

/// Parse an executable without verifying it.
///
/// # Security
/// Every count read from the file is bounded before anything is allocated.
pub fn read_program<R: Read>(reader: &mut R) -> Result<Program, LoaderError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(LoaderError::Format(
            "Invalid binary magic or version".to_string(),
        ));
    }

    let proto_count = reader.read_u32::<LittleEndian>()?;
    if proto_count > MAX_PROTOTYPES {
        return Err(LoaderError::Security(format!(
            "Prototype count too large: {}",
            proto_count
        )));
    }

    let mut prototypes = Vec::with_capacity(proto_count as usize);
    for _ in 0..proto_count {
        prototypes.push(read_code_object(reader)?);
    }

    let entry = reader.read_u16::<LittleEndian>()?;
    debug!(prototypes = prototypes.len(), entry, "read executable");

    Ok(Program { prototypes, entry })
}

fn read_code_object<R: Read>(reader: &mut R) -> Result<CodeObject, LoaderError> {
    let name_len = reader.read_u32::<LittleEndian>()?;
    if name_len > MAX_NAME_LEN {
        return Err(LoaderError::Security(format!(
            "Code object name length exceeds limit of {}: {}",
            MAX_NAME_LEN, name_len
        )));
    }
    let mut name_bytes = vec![0u8; name_len as usize];
    reader.read_exact(&mut name_bytes)?;
    let name = String::from_utf8(name_bytes)
        .map_err(|_| LoaderError::Format("Invalid UTF-8 in code object name".to_string()))?;

    let stack_size = reader.read_u16::<LittleEndian>()?;

    let const_count = reader.read_u32::<LittleEndian>()?;
    if const_count > MAX_CONSTANTS {
        return Err(LoaderError::Security(format!(
            "Constant count too large: {}",
            const_count
        )));
    }
    let mut constants = Vec::with_capacity(const_count as usize);
    for _ in 0..const_count {
        constants.push(reader.read_f64::<LittleEndian>()?);
    }

    let code_len = reader.read_u32::<LittleEndian>()?;
    if code_len > MAX_CODE_LEN {
        return Err(LoaderError::Security(format!(
            "Bytecode length too large: {}",
            code_len
        )));
    }
    let mut instructions = Vec::with_capacity(code_len as usize);
    for index in 0..code_len as usize {
        let word = reader.read_u32::<LittleEndian>()?;
        let instr = opcode::decode(word, &constants).map_err(|source| LoaderError::Codec {
            code: name.clone(),
            index,
            source,
        })?;
        instructions.push(instr);
    }

    Ok(CodeObject {
        name,
        stack_size,
        instructions,
    })
}

/// Serialize `program` in the format `read_program` accepts.
pub fn write_program<W: Write>(program: &Program, writer: &mut W) -> Result<(), LoaderError> {
    if program.prototypes.len() > MAX_PROTOTYPES as usize {
        return Err(LoaderError::Security(format!(
            "Prototype count too large: {}",
            program.prototypes.len()
        )));
    }

    writer.write_all(MAGIC)?;
    writer.write_u32::<LittleEndian>(program.prototypes.len() as u32)?;

    for code in &program.prototypes {
        if code.name.len() > MAX_NAME_LEN as usize {
            return Err(LoaderError::Security(format!(
                "Code object name length exceeds limit of {}: {}",
                MAX_NAME_LEN,
                code.name.len()
            )));
        }

        // Encode first: the constant pool is a by-product of encoding.
        let mut constants = Vec::new();
        let mut words = Vec::with_capacity(code.instructions.len());
        for (index, instr) in code.instructions.iter().enumerate() {
            let word =
                opcode::encode(instr, &mut constants).map_err(|source| LoaderError::Codec {
                    code: code.name.clone(),
                    index,
                    source,
                })?;
            words.push(word);
        }

        writer.write_u32::<LittleEndian>(code.name.len() as u32)?;
        writer.write_all(code.name.as_bytes())?;
        writer.write_u16::<LittleEndian>(code.stack_size)?;
        writer.write_u32::<LittleEndian>(constants.len() as u32)?;
        for k in &constants {
            writer.write_f64::<LittleEndian>(*k)?;
        }
        writer.write_u32::<LittleEndian>(words.len() as u32)?;
        for w in &words {
            writer.write_u32::<LittleEndian>(*w)?;
        }
    }

    writer.write_u16::<LittleEndian>(program.entry)?;
    Ok(())
}
