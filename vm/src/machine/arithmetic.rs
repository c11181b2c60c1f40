use crate::error::RuntimeError;
use memory::Value;

use super::frame::Window;
use super::stack::StackOps;

/// Trait for arithmetic instruction handlers
pub trait ArithmeticOps {
    fn handle_add(&mut self, window: Window, target: u8, a: u8, b: u8) -> Result<(), RuntimeError>;
}

impl ArithmeticOps for super::vm::VM {
    fn handle_add(&mut self, window: Window, target: u8, a: u8, b: u8) -> Result<(), RuntimeError> {
        let va = self.get_reg(window, a)?;
        let vb = self.get_reg(window, b)?;
        let sum = numeric_add(va, vb)?;
        self.set_reg(window, target, sum)
    }
}

/// Both operands must be numbers; there is no coercion.
pub fn numeric_add(left: Value, right: Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::number(x + y)),
        (Value::Number(_), other) | (other, _) => Err(RuntimeError::TypeMismatch {
            op: "ADD",
            expected: "Number",
            found: other.type_name(),
        }),
    }
}
