//! Machine module - VM implementation
//!
//! The interpreter is split by concern: `vm` owns state and the dispatch
//! loop, the handler traits live in their own files.

mod arithmetic;
mod closure;
mod control;
mod frame;
mod report;
mod stack;
mod upvalues;
mod vm;

// Public API
pub use arithmetic::{numeric_add, ArithmeticOps};
pub use closure::ClosureOps;
pub use control::ControlFlowOps;
pub use frame::{CallFrame, Window};
pub use report::{HaltReason, HaltReport};
pub use stack::StackOps;
pub use upvalues::OpenUpvalues;
pub use vm::VM;
