use memory::Value;

use super::frame::Window;
use crate::error::RuntimeError;

/// Trait for stack operations (registers)
pub trait StackOps {
    fn get_reg(&self, window: Window, reg: u8) -> Result<Value, RuntimeError>;
    fn set_reg(&mut self, window: Window, reg: u8, val: Value) -> Result<(), RuntimeError>;
}

impl StackOps for super::vm::VM {
    #[inline(always)]
    fn get_reg(&self, window: Window, reg: u8) -> Result<Value, RuntimeError> {
        let idx = window.slot(reg)?;
        self.stack
            .get(idx)
            .copied()
            .ok_or(RuntimeError::StackOverflow {
                needed: idx + 1,
                capacity: self.stack.len(),
            })
    }

    #[inline(always)]
    fn set_reg(&mut self, window: Window, reg: u8, val: Value) -> Result<(), RuntimeError> {
        let idx = window.slot(reg)?;
        let capacity = self.stack.len();
        let slot = self.stack.get_mut(idx).ok_or(RuntimeError::StackOverflow {
            needed: idx + 1,
            capacity,
        })?;
        *slot = val;
        self.high_water = self.high_water.max(idx + 1);
        Ok(())
    }
}
