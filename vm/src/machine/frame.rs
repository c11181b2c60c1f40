use crate::error::RuntimeError;

/// Represents a single call frame in the execution stack.
///
/// Each frame tracks:
/// - `closure`: Handle to the Function object in the heap
/// - `ip`: Instruction Pointer (index of the next instruction)
/// - `base`: Base offset in the register stack for this frame's registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    pub closure: u32,
    pub ip: usize,
    pub base: usize,
}

impl CallFrame {
    pub fn new(closure: u32, base: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base,
        }
    }
}

/// The register window `[base, base + size)` of the executing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub base: usize,
    pub size: usize,
}

impl Window {
    pub fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    /// Absolute stack index of register `reg`.
    #[inline]
    pub fn slot(&self, reg: u8) -> Result<usize, RuntimeError> {
        if (reg as usize) < self.size {
            Ok(self.base + reg as usize)
        } else {
            Err(RuntimeError::RegisterOutOfBounds {
                reg,
                size: self.size,
            })
        }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.base + self.size
    }
}
