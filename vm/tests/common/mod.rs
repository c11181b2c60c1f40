#![allow(dead_code)]

use memory::{CodeObject, Instruction};
use vm::{HaltReport, Program, RuntimeError, VmConfig, VM};

pub use memory::Instruction::*;

// ======================================================================
// Helpers
// ======================================================================

pub fn code(name: &str, stack_size: u16, instructions: Vec<Instruction>) -> CodeObject {
    CodeObject::new(name, stack_size, instructions)
}

/// Load `prototypes` (entry = P[0]) into a fresh VM and run it.
pub fn run_with(
    config: VmConfig,
    prototypes: Vec<CodeObject>,
) -> (VM, Result<HaltReport, RuntimeError>) {
    let mut vm = VM::with_config(config);
    vm.load_program(Program::new(prototypes, 0))
        .expect("load_program failed");
    let result = vm.interpret();
    (vm, result)
}

pub fn run(prototypes: Vec<CodeObject>) -> (VM, Result<HaltReport, RuntimeError>) {
    run_with(VmConfig::default(), prototypes)
}

pub fn run_ok(prototypes: Vec<CodeObject>) -> (VM, HaltReport) {
    let (vm, result) = run(prototypes);
    let report = result.expect("runtime error");
    (vm, report)
}

pub fn run_err(prototypes: Vec<CodeObject>) -> RuntimeError {
    let (_, result) = run(prototypes);
    result.expect_err("expected a runtime fault")
}

// ======================================================================
// Programs
// ======================================================================

/// `adder(10, 5)`; the sum lands in R3 of the entry frame.
pub fn adder_program() -> Vec<CodeObject> {
    // r0 - unused, r1 - adder, r3 - call result, r4/r5 - args
    let body = code(
        "body",
        6,
        vec![
            MakeFunction { target: 1, code: 1 },
            LoadConstant { target: 4, value: 10.0 },
            LoadConstant { target: 5, value: 5.0 },
            Call { function: 1, arg_base: 3, n_args: 2 },
            Halt,
        ],
    );
    // r0 - return value, r1/r2 - params
    let adder = code(
        "adder",
        4,
        vec![Add { target: 3, a: 1, b: 2 }, Return { result: 3 }],
    );
    vec![body, adder]
}

/// `add2(7)(2)`: add2 returns add1 closed over its parameter.
pub fn curried_add_program() -> Vec<CodeObject> {
    // r0 - unused, r1 - add2, r2 - result of add2, r3 - call result, r4 - arg
    let body = code(
        "body",
        5,
        vec![
            MakeFunction { target: 1, code: 1 },
            LoadConstant { target: 4, value: 7.0 },
            Call { function: 1, arg_base: 3, n_args: 1 },
            Copy { target: 2, source: 3 },
            LoadConstant { target: 4, value: 2.0 },
            Call { function: 2, arg_base: 3, n_args: 1 },
            Halt,
        ],
    );
    // r0 - return value, r1 - parameter, r2 - add1
    let add2 = code(
        "add2",
        3,
        vec![
            MakeFunction { target: 2, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            Return { result: 2 },
        ],
    );
    // r0 - return value, r1 - parameter, r2 - upval tmp, r3 - result tmp
    let add1 = code(
        "add1",
        4,
        vec![
            GetUpval { target: 2, upval_index: 0 },
            Add { target: 3, a: 1, b: 2 },
            Return { result: 3 },
        ],
    );
    vec![body, add2, add1]
}

/// Increments its single upvalue and returns the new value.
pub fn incr_code() -> CodeObject {
    code(
        "incr",
        3,
        vec![
            GetUpval { target: 1, upval_index: 0 },
            LoadConstant { target: 2, value: 1.0 },
            Add { target: 1, a: 1, b: 2 },
            SetUpval { source: 1, upval_index: 0 },
            Return { result: 1 },
        ],
    )
}

/// Returns its single upvalue.
pub fn get_code() -> CodeObject {
    code(
        "get",
        2,
        vec![GetUpval { target: 1, upval_index: 0 }, Return { result: 1 }],
    )
}
