//! Upvalue lifecycle: sharing while open, closing on return, and the
//! identity of closures created by repeated MAKE_FUNCTION.

mod common;

use common::*;
use memory::{UpvalueLocation, Value};
use vm::machine::ClosureOps;

#[test]
fn test_sibling_closures_share_one_open_upvalue() {
    let setter = code(
        "setter",
        2,
        vec![
            LoadConstant { target: 1, value: 42.0 },
            SetUpval { source: 1, upval_index: 0 },
            Return { result: 1 },
        ],
    );
    let body = code(
        "body",
        6,
        vec![
            LoadConstant { target: 1, value: 1.0 },
            MakeFunction { target: 2, code: 1 },
            Bind { upval_index: 0, stack_offset: 1 },
            MakeFunction { target: 3, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            Call { function: 2, arg_base: 4, n_args: 0 },
            Call { function: 3, arg_base: 4, n_args: 0 },
            Halt,
        ],
    );
    let (vm, report) = run_ok(vec![body, setter, get_code()]);

    let set_fn = report.register(2).unwrap().as_function().unwrap();
    let get_fn = report.register(3).unwrap().as_function().unwrap();
    let set_up = vm.function_upvalues(set_fn).unwrap()[0];
    let get_up = vm.function_upvalues(get_fn).unwrap()[0];
    assert!(set_up.is_some());
    assert_eq!(set_up, get_up, "both closures must hold the same cell");

    // The write went through to the body's register and the getter saw it.
    assert_eq!(report.number(1), Some(42.0));
    assert_eq!(report.number(4), Some(42.0));
    assert_eq!(vm.open_upvalue_count(), 1);
    assert_eq!(
        vm.upvalue_location(set_up.unwrap()),
        Some(UpvalueLocation::Open(1))
    );
}

#[test]
fn test_sharing_survives_close() {
    // make_pair: local = 100; incr and get both capture it; get is
    // smuggled out through make_pair's own upvalue, incr is returned.
    let make_pair = code(
        "make_pair",
        4,
        vec![
            LoadConstant { target: 1, value: 100.0 },
            MakeFunction { target: 2, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            MakeFunction { target: 3, code: 3 },
            Bind { upval_index: 0, stack_offset: 1 },
            SetUpval { source: 3, upval_index: 0 },
            Return { result: 2 },
        ],
    );
    let body = code(
        "body",
        8,
        vec![
            MakeFunction { target: 2, code: 1 },
            Bind { upval_index: 0, stack_offset: 1 },
            Call { function: 2, arg_base: 4, n_args: 0 },
            Copy { target: 3, source: 4 },
            Call { function: 3, arg_base: 4, n_args: 0 },
            Call { function: 1, arg_base: 4, n_args: 0 },
            Halt,
        ],
    );
    let (vm, report) = run_ok(vec![body, make_pair, incr_code(), get_code()]);

    assert_eq!(report.number(4), Some(101.0));

    let incr = report.register(3).unwrap().as_function().unwrap();
    let get = report.register(1).unwrap().as_function().unwrap();
    let cell = vm.function_upvalues(incr).unwrap()[0].unwrap();
    assert_eq!(vm.function_upvalues(get).unwrap()[0], Some(cell));
    assert_eq!(
        vm.upvalue_location(cell),
        Some(UpvalueLocation::Closed(Value::number(101.0)))
    );
}

#[test]
fn test_close_on_return_captures_last_value() {
    // make(): x = 1; capture x; x = 5 (plain register write); return closure
    let make = code(
        "make",
        4,
        vec![
            LoadConstant { target: 1, value: 1.0 },
            MakeFunction { target: 2, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            LoadConstant { target: 3, value: 5.0 },
            Copy { target: 1, source: 3 },
            Return { result: 2 },
        ],
    );
    let body = code(
        "body",
        5,
        vec![
            MakeFunction { target: 1, code: 1 },
            Call { function: 1, arg_base: 3, n_args: 0 },
            Copy { target: 2, source: 3 },
            Call { function: 2, arg_base: 3, n_args: 0 },
            Halt,
        ],
    );
    let (vm, report) = run_ok(vec![body, make, get_code()]);

    assert_eq!(report.number(3), Some(5.0));
    let closure = report.register(2).unwrap().as_function().unwrap();
    let cell = vm.function_upvalues(closure).unwrap()[0].unwrap();
    assert_eq!(
        vm.upvalue_location(cell),
        Some(UpvalueLocation::Closed(Value::number(5.0)))
    );
}

#[test]
fn test_return_closes_only_the_returning_frames_upvalues() {
    // The body captures its R1, inner captures its own R1 and returns.
    // Only inner's capture may close.
    let inner = code(
        "inner",
        3,
        vec![
            LoadConstant { target: 1, value: 9.0 },
            MakeFunction { target: 2, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            Return { result: 1 },
        ],
    );
    let body = code(
        "body",
        6,
        vec![
            LoadConstant { target: 1, value: 3.0 },
            MakeFunction { target: 2, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            MakeFunction { target: 3, code: 1 },
            Call { function: 3, arg_base: 4, n_args: 0 },
            Halt,
        ],
    );
    let mut vm = vm::VM::new();
    vm.load_program(vm::Program::new(vec![body, inner, get_code()], 0))
        .unwrap();

    // Run up to (not including) inner's RETURN.
    for _ in 0..8 {
        assert_eq!(vm.step(), Ok(None));
    }
    assert_eq!(vm.frames.len(), 2);
    assert_eq!(vm.open_upvalue_count(), 2);

    assert_eq!(vm.step(), Ok(None)); // RETURN
    assert_eq!(vm.frames.len(), 1);
    assert_eq!(vm.open_upvalue_count(), 1);
    let open: Vec<_> = vm.open_upvalues.iter().collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].0, 1, "the body's capture stays open");

    // Every cell that observed the inner window is closed now.
    for up in &vm.heap.upvalues.data {
        if let UpvalueLocation::Open(idx) = up.location {
            assert!(idx < 4, "open upvalue still points into a dead window");
        }
    }

    let report = vm.interpret().unwrap();
    assert_eq!(report.number(4), Some(9.0));
}

#[test]
fn test_repeated_make_function_yields_distinct_closures() {
    // make_counter(): n = 0; return incr over n
    let make_counter = code(
        "make_counter",
        3,
        vec![
            LoadConstant { target: 1, value: 0.0 },
            MakeFunction { target: 2, code: 2 },
            Bind { upval_index: 0, stack_offset: 1 },
            Return { result: 2 },
        ],
    );
    let body = code(
        "body",
        9,
        vec![
            MakeFunction { target: 1, code: 1 },
            Call { function: 1, arg_base: 6, n_args: 0 },
            Copy { target: 2, source: 6 },
            Call { function: 1, arg_base: 6, n_args: 0 },
            Copy { target: 3, source: 6 },
            // first counter twice, second once
            Call { function: 2, arg_base: 6, n_args: 0 },
            Call { function: 2, arg_base: 6, n_args: 0 },
            Copy { target: 4, source: 6 },
            Call { function: 3, arg_base: 6, n_args: 0 },
            Copy { target: 5, source: 6 },
            Halt,
        ],
    );
    let (vm, report) = run_ok(vec![body, make_counter, incr_code()]);

    let first = report.register(2).unwrap().as_function().unwrap();
    let second = report.register(3).unwrap().as_function().unwrap();
    assert_ne!(first, second);
    assert_ne!(
        vm.function_upvalues(first).unwrap()[0],
        vm.function_upvalues(second).unwrap()[0]
    );
    // Both share one code object.
    assert_eq!(
        vm.heap.get_function(first).unwrap().code,
        vm.heap.get_function(second).unwrap().code
    );

    assert_eq!(report.number(4), Some(2.0));
    assert_eq!(report.number(5), Some(1.0));
}

#[test]
fn test_double_close_is_a_fault() {
    let (mut vm, _) = run_ok(adder_program());

    let handle = vm.heap.alloc_upvalue(memory::Upvalue::open(2));
    vm.heap
        .get_upvalue_mut(handle)
        .unwrap()
        .close(Value::number(1.0))
        .unwrap();
    // Corrupt the tracking list on purpose.
    assert!(vm.open_upvalues.insert(2, handle));

    assert_eq!(
        vm.close_upvalues(0),
        Err(vm::RuntimeError::DoubleClose { upvalue: handle })
    );
}

#[test]
fn test_capture_reuses_open_cell() {
    let mut vm = vm::VM::new();
    let a = vm.capture_upvalue(10);
    let b = vm.capture_upvalue(10);
    let c = vm.capture_upvalue(11);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(vm.open_upvalue_count(), 2);

    assert_eq!(vm.close_upvalues(11), Ok(1));
    assert_eq!(vm.open_upvalue_count(), 1);
    // A fresh capture after closing opens a new cell.
    let d = vm.capture_upvalue(11);
    assert_ne!(c, d);
}
