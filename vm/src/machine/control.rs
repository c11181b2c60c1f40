use crate::error::RuntimeError;
use memory::Value;
use tracing::debug;

use super::closure::ClosureOps;
use super::frame::Window;
use super::report::{HaltReason, HaltReport};
use super::stack::StackOps;

/// Trait for control flow instruction handlers
pub trait ControlFlowOps {
    /// CALL: push a frame for R[function] whose register 0 is R[arg_base].
    fn handle_call(
        &mut self,
        window: Window,
        function: u8,
        arg_base: u8,
        n_args: u8,
    ) -> Result<(), RuntimeError>;

    /// RETURN: hand R[result] to the caller through R[0], close the frame's
    /// upvalues and pop it. Returns a report when the entry frame returns.
    fn handle_return(
        &mut self,
        window: Window,
        result: u8,
    ) -> Result<Option<HaltReport>, RuntimeError>;
}

impl ControlFlowOps for super::vm::VM {
    fn handle_call(
        &mut self,
        window: Window,
        function: u8,
        arg_base: u8,
        n_args: u8,
    ) -> Result<(), RuntimeError> {
        let closure = match self.get_reg(window, function)? {
            Value::Function(handle) => handle,
            other => {
                return Err(RuntimeError::TypeMismatch {
                    op: "CALL",
                    expected: "Function",
                    found: other.type_name(),
                })
            }
        };

        // The caller's staging registers become the callee's low registers.
        let callee_base = window.slot(arg_base)?;
        self.push_frame(closure, callee_base)?;

        debug!(
            closure,
            base = callee_base,
            n_args,
            depth = self.frames.len(),
            "call"
        );
        Ok(())
    }

    fn handle_return(
        &mut self,
        window: Window,
        result: u8,
    ) -> Result<Option<HaltReport>, RuntimeError> {
        let val = self.get_reg(window, result)?;
        self.set_reg(window, 0, val)?;

        let closed = self.close_upvalues(window.base)?;

        let report = if self.frames.len() == 1 {
            Some(self.snapshot(HaltReason::EntryReturn, window))
        } else {
            None
        };

        if self.config.scrub_on_return {
            let from = window.base + 1;
            if from < self.high_water {
                self.stack[from..self.high_water].fill(Value::uninit());
            }
            self.high_water = from;
        }

        self.frames.pop();
        debug!(
            base = window.base,
            closed,
            depth = self.frames.len(),
            value = %val,
            "return"
        );
        Ok(report)
    }
}
