pub mod code;
pub mod heap;
pub mod value;

#[cfg(test)]
mod value_tests;

pub use code::{CodeObject, Instruction};
pub use heap::{AlreadyClosed, Arena, Function, Heap, Upvalue, UpvalueLocation};
pub use value::Value;
