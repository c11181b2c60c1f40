use serde::Serialize;
use std::fmt;

/// A register value.
///
/// The variant set is closed: every instruction that touches a value
/// matches on it exhaustively and reports a type fault for anything it
/// cannot handle.
#[derive(Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// IEEE-754 double.
    Number(f64),
    /// Handle of a closure in the heap.
    Function(u32),
    /// A register that has never been written (or was scrubbed on return).
    #[default]
    Uninitialized,
}

impl Value {
    // --- Constructors ---

    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    #[inline]
    pub fn function(handle: u32) -> Self {
        Value::Function(handle)
    }

    #[inline]
    pub fn uninit() -> Self {
        Value::Uninitialized
    }

    // --- Checks ---

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    #[inline]
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Value::Uninitialized)
    }

    // --- Accessors ---

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_function(&self) -> Option<u32> {
        match self {
            Value::Function(h) => Some(*h),
            _ => None,
        }
    }

    /// Short name used in type-fault messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Function(_) => "Function",
            Value::Uninitialized => "Uninitialized",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Function(h) => write!(f, "Function(#{})", h),
            Value::Uninitialized => write!(f, "Uninitialized"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Function(h) => write!(f, "<function #{}>", h),
            Value::Uninitialized => write!(f, "<uninitialized>"),
        }
    }
}
