pub mod config;
pub mod error;
pub mod loader;
pub mod machine;
pub mod opcode;
pub mod verify;

pub use config::VmConfig;
pub use error::RuntimeError;
pub use loader::{load_program, read_program, write_program, LoaderError, Program};
pub use machine::{CallFrame, HaltReason, HaltReport, OpenUpvalues, Window, VM};
pub use opcode::OpCode;
pub use verify::{verify_program, VerifyError};
