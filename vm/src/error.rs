use thiserror::Error;

/// Fatal faults. Every one of them aborts the whole run; there is no
/// recovery channel at the bytecode level.
#[derive(Debug, Error, PartialEq)]
pub enum RuntimeError {
    #[error("upvalue #{upvalue} closed twice")]
    DoubleClose { upvalue: u32 },

    #[error("{op}: expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("register stack exhausted: window needs {needed} slots, capacity is {capacity}")]
    StackOverflow { needed: usize, capacity: usize },

    #[error("call depth limit of {depth} frames exceeded")]
    FrameOverflow { depth: usize },

    #[error("register R{reg} outside frame window of {size}")]
    RegisterOutOfBounds { reg: u8, size: usize },

    #[error("upvalue slot {index} is not bound (closure has {len} slots)")]
    UpvalueOutOfBounds { index: u8, len: usize },

    #[error("function #{0} not found in heap")]
    FunctionNotFound(u32),

    #[error("upvalue #{0} not found in heap")]
    UpvalueNotFound(u32),

    #[error("malformed code: {0}")]
    MalformedCode(String),
}
