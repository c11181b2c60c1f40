use crate::error::RuntimeError;
use memory::{Function, Upvalue, UpvalueLocation, Value};
use tracing::trace;

use super::frame::Window;
use super::stack::StackOps;

/// Closure construction and the upvalue lifecycle.
pub trait ClosureOps {
    /// MAKE_FUNCTION: R[target] = new closure over prototype `proto`.
    fn make_function(&mut self, window: Window, target: u8, proto: u16) -> Result<(), RuntimeError>;

    /// BIND: point slot `upval_index` of the pending closure at
    /// `window.base + stack_offset`, sharing any upvalue already open there.
    fn bind(&mut self, window: Window, upval_index: u8, stack_offset: u8) -> Result<(), RuntimeError>;

    fn read_upval(&self, closure: u32, upval_index: u8) -> Result<Value, RuntimeError>;

    fn write_upval(&mut self, closure: u32, upval_index: u8, val: Value) -> Result<(), RuntimeError>;

    /// Open upvalue for absolute `stack_idx`, created if none is open there.
    fn capture_upvalue(&mut self, stack_idx: usize) -> u32;

    /// Close every open upvalue observing a stack index `>= from`.
    /// Returns how many were closed.
    fn close_upvalues(&mut self, from: usize) -> Result<usize, RuntimeError>;
}

impl ClosureOps for super::vm::VM {
    fn make_function(&mut self, window: Window, target: u8, proto: u16) -> Result<(), RuntimeError> {
        let code = *self.prototypes.get(proto as usize).ok_or_else(|| {
            RuntimeError::MalformedCode(format!(
                "MAKE_FUNCTION references P[{}] ({} code objects)",
                proto,
                self.prototypes.len()
            ))
        })?;

        let closure = self.heap.alloc_function(Function::new(code));
        self.set_reg(window, target, Value::function(closure))?;
        self.pending_closure = Some(closure);
        Ok(())
    }

    fn bind(&mut self, window: Window, upval_index: u8, stack_offset: u8) -> Result<(), RuntimeError> {
        let closure = self.pending_closure.ok_or_else(|| {
            RuntimeError::MalformedCode("BIND without a preceding MAKE_FUNCTION".into())
        })?;
        let stack_idx = window.slot(stack_offset)?;
        let upvalue = self.capture_upvalue(stack_idx);

        self.heap
            .get_function_mut(closure)
            .ok_or(RuntimeError::FunctionNotFound(closure))?
            .bind(upval_index as usize, upvalue);
        Ok(())
    }

    fn read_upval(&self, closure: u32, upval_index: u8) -> Result<Value, RuntimeError> {
        let handle = upvalue_slot(self, closure, upval_index)?;
        let upval = self
            .heap
            .get_upvalue(handle)
            .ok_or(RuntimeError::UpvalueNotFound(handle))?;
        trace!(upvalue = handle, open = upval.is_open(), "reading upvalue");

        match upval.location {
            UpvalueLocation::Open(stack_idx) => {
                self.stack
                    .get(stack_idx)
                    .copied()
                    .ok_or(RuntimeError::StackOverflow {
                        needed: stack_idx + 1,
                        capacity: self.stack.len(),
                    })
            }
            UpvalueLocation::Closed(v) => Ok(v),
        }
    }

    fn write_upval(&mut self, closure: u32, upval_index: u8, val: Value) -> Result<(), RuntimeError> {
        let handle = upvalue_slot(self, closure, upval_index)?;
        let capacity = self.stack.len();
        let upval = self
            .heap
            .get_upvalue_mut(handle)
            .ok_or(RuntimeError::UpvalueNotFound(handle))?;
        trace!(upvalue = handle, open = upval.is_open(), value = %val, "writing upvalue");

        match upval.location {
            UpvalueLocation::Open(stack_idx) => {
                let slot = self
                    .stack
                    .get_mut(stack_idx)
                    .ok_or(RuntimeError::StackOverflow {
                        needed: stack_idx + 1,
                        capacity,
                    })?;
                *slot = val;
                self.high_water = self.high_water.max(stack_idx + 1);
            }
            UpvalueLocation::Closed(_) => {
                upval.location = UpvalueLocation::Closed(val);
            }
        }
        Ok(())
    }

    fn capture_upvalue(&mut self, stack_idx: usize) -> u32 {
        if let Some(existing) = self.open_upvalues.find(stack_idx) {
            trace!(stack_idx, upvalue = existing, "reusing open upvalue");
            return existing;
        }

        let handle = self.heap.alloc_upvalue(Upvalue::open(stack_idx));
        self.open_upvalues.insert(stack_idx, handle);
        trace!(stack_idx, upvalue = handle, "opened upvalue");
        handle
    }

    fn close_upvalues(&mut self, from: usize) -> Result<usize, RuntimeError> {
        let tail = self.open_upvalues.split_from(from);
        let count = tail.len();

        for (stack_idx, handle) in tail {
            let captured = self.stack.get(stack_idx).copied().unwrap_or_default();
            self.heap
                .get_upvalue_mut(handle)
                .ok_or(RuntimeError::UpvalueNotFound(handle))?
                .close(captured)
                .map_err(|_| RuntimeError::DoubleClose { upvalue: handle })?;
            trace!(stack_idx, upvalue = handle, value = %captured, "closed upvalue");
        }

        Ok(count)
    }
}

fn upvalue_slot(vm: &super::vm::VM, closure: u32, upval_index: u8) -> Result<u32, RuntimeError> {
    let function = vm
        .heap
        .get_function(closure)
        .ok_or(RuntimeError::FunctionNotFound(closure))?;
    function
        .upvalue(upval_index as usize)
        .ok_or(RuntimeError::UpvalueOutOfBounds {
            index: upval_index,
            len: function.upvalues.len(),
        })
}
