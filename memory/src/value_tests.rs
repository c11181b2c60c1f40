#[cfg(test)]
mod tests {
    use crate::{Instruction, Value};

    #[test]
    fn test_value_number_basics() {
        let v = Value::number(1.5);
        assert!(v.is_number());
        assert!(!v.is_function());
        assert_eq!(v.as_number(), Some(1.5));
        assert_eq!(v.as_function(), None);
        assert_eq!(v.type_name(), "Number");
    }

    #[test]
    fn test_value_function_basics() {
        let v = Value::function(7);
        assert!(v.is_function());
        assert_eq!(v.as_function(), Some(7));
        assert_eq!(v.as_number(), None);
        assert_eq!(v.type_name(), "Function");
    }

    #[test]
    fn test_value_default_is_uninitialized() {
        let v = Value::default();
        assert!(v.is_uninitialized());
        assert_eq!(v, Value::uninit());
        assert_eq!(v.type_name(), "Uninitialized");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::number(15.0).to_string(), "15");
        assert_eq!(Value::number(0.5).to_string(), "0.5");
        assert_eq!(Value::function(3).to_string(), "<function #3>");
        assert_eq!(Value::uninit().to_string(), "<uninitialized>");
    }

    #[test]
    fn test_value_serializes_tagged() {
        let json = serde_json::to_string(&Value::number(9.0)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":9.0}"#);
        let json = serde_json::to_string(&Value::uninit()).unwrap();
        assert_eq!(json, r#"{"type":"uninitialized"}"#);
    }

    #[test]
    fn test_instruction_registers() {
        let add = Instruction::Add { target: 3, a: 1, b: 2 };
        assert_eq!(add.registers(), vec![3, 1, 2]);
        assert!(Instruction::Halt.registers().is_empty());
        let bind = Instruction::Bind {
            upval_index: 4,
            stack_offset: 1,
        };
        assert_eq!(bind.registers(), vec![1]);
    }

    #[test]
    fn test_instruction_display() {
        let call = Instruction::Call {
            function: 1,
            arg_base: 3,
            n_args: 1,
        };
        assert_eq!(call.to_string(), "CALL           R1, R3, 1");
        assert_eq!(Instruction::Halt.to_string(), "HALT");
    }
}
