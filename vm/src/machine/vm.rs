use crate::config::VmConfig;
use crate::error::RuntimeError;
use crate::loader::Program;
use memory::{CodeObject, Function, Heap, Instruction, UpvalueLocation, Value};
use tracing::{debug, trace};

use super::arithmetic::ArithmeticOps;
use super::closure::ClosureOps;
use super::control::ControlFlowOps;
use super::frame::{CallFrame, Window};
use super::report::{HaltReason, HaltReport};
use super::stack::StackOps;
use super::upvalues::OpenUpvalues;

/// The Virtual Machine struct
pub struct VM {
    pub heap: Heap,
    /// Fixed-capacity register stack shared by every frame.
    pub stack: Box<[Value]>,
    pub frames: Vec<CallFrame>,

    /// Heap handles of the loaded code objects; MAKE_FUNCTION indexes this.
    pub prototypes: Vec<u32>,

    pub open_upvalues: OpenUpvalues,

    /// Closure created by the last MAKE_FUNCTION, receiving the BIND
    /// instructions that immediately follow it. Cleared by any other
    /// instruction.
    pub pending_closure: Option<u32>,

    pub config: VmConfig,

    /// One past the highest stack slot written or covered by a frame
    /// window since the last scrub. Every slot at or above it is
    /// `Uninitialized` while `scrub_on_return` is on.
    pub high_water: usize,
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl VM {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let stack = vec![Value::uninit(); config.stack_size].into_boxed_slice();
        Self {
            heap: Heap::new(),
            stack,
            frames: Vec::with_capacity(config.max_frames.min(64)),
            prototypes: Vec::new(),
            open_upvalues: OpenUpvalues::new(),
            pending_closure: None,
            config,
            high_water: 0,
        }
    }

    /// Close every open upvalue and clear runtime state so another program
    /// can be loaded. Closures already created stay valid in the heap.
    pub fn reset(&mut self) -> Result<(), RuntimeError> {
        self.close_upvalues(0)?;
        self.frames.clear();
        self.pending_closure = None;
        self.stack.fill(Value::uninit());
        self.high_water = 0;
        Ok(())
    }

    /// Install `program` and push the entry frame at base 0.
    ///
    /// Returns the handle of the entry closure.
    pub fn load_program(&mut self, program: Program) -> Result<u32, RuntimeError> {
        let entry = program.entry as usize;
        if entry >= program.prototypes.len() {
            return Err(RuntimeError::MalformedCode(format!(
                "entry P[{}] out of range ({} code objects)",
                entry,
                program.prototypes.len()
            )));
        }

        self.reset()?;
        self.prototypes.clear();
        for code in program.prototypes {
            let handle = self.heap.alloc_code(code);
            self.prototypes.push(handle);
        }

        let closure = self
            .heap
            .alloc_function(Function::new(self.prototypes[entry]));
        self.push_frame(closure, 0)?;

        debug!(
            prototypes = self.prototypes.len(),
            entry,
            closure,
            "program loaded"
        );
        Ok(closure)
    }

    /// Main interpretation loop
    ///
    /// Runs until HALT or until the entry frame returns.
    pub fn interpret(&mut self) -> Result<HaltReport, RuntimeError> {
        loop {
            if let Some(report) = self.step()? {
                return Ok(report);
            }
        }
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// Returns a report once the machine stops.
    pub fn step(&mut self) -> Result<Option<HaltReport>, RuntimeError> {
        let frame_idx = self
            .frames
            .len()
            .checked_sub(1)
            .ok_or_else(|| RuntimeError::MalformedCode("no active frame".into()))?;
        let CallFrame { closure, ip, base } = self.frames[frame_idx];

        let (instruction, size) = {
            let code = self.code_of(closure)?;
            let instruction = *code.instructions.get(ip).ok_or_else(|| {
                RuntimeError::MalformedCode(format!(
                    "'{}' ran past its last instruction",
                    code.name
                ))
            })?;
            (instruction, code.stack_size as usize)
        };
        self.frames[frame_idx].ip += 1;
        let window = Window::new(base, size);

        trace!(depth = frame_idx, ip, base, %instruction, "dispatch");

        if !matches!(instruction, Instruction::Bind { .. }) {
            self.pending_closure = None;
        }

        match instruction {
            Instruction::MakeFunction { target, code } => {
                self.make_function(window, target, code)?;
            }

            Instruction::Bind {
                upval_index,
                stack_offset,
            } => {
                self.bind(window, upval_index, stack_offset)?;
            }

            Instruction::Add { target, a, b } => {
                self.handle_add(window, target, a, b)?;
            }

            Instruction::LoadConstant { target, value } => {
                self.set_reg(window, target, Value::number(value))?;
            }

            Instruction::Copy { target, source } => {
                let val = self.get_reg(window, source)?;
                self.set_reg(window, target, val)?;
            }

            Instruction::GetUpval {
                target,
                upval_index,
            } => {
                let val = self.read_upval(closure, upval_index)?;
                self.set_reg(window, target, val)?;
            }

            Instruction::SetUpval {
                source,
                upval_index,
            } => {
                let val = self.get_reg(window, source)?;
                self.write_upval(closure, upval_index, val)?;
            }

            Instruction::Call {
                function,
                arg_base,
                n_args,
            } => {
                self.handle_call(window, function, arg_base, n_args)?;
            }

            Instruction::Return { result } => {
                return self.handle_return(window, result);
            }

            Instruction::Halt => {
                let report = self.snapshot(HaltReason::Halt, window);
                debug!(base, depth = self.frames.len(), "machine halted");
                return Ok(Some(report));
            }
        }
        Ok(None)
    }

    /// Push a frame for `closure` whose window starts at absolute `base`.
    pub(crate) fn push_frame(&mut self, closure: u32, base: usize) -> Result<Window, RuntimeError> {
        if self.frames.len() >= self.config.max_frames {
            return Err(RuntimeError::FrameOverflow {
                depth: self.config.max_frames,
            });
        }

        let size = self.code_of(closure)?.stack_size as usize;
        let window = Window::new(base, size);
        if window.end() > self.stack.len() {
            return Err(RuntimeError::StackOverflow {
                needed: window.end(),
                capacity: self.stack.len(),
            });
        }

        self.high_water = self.high_water.max(window.end());
        self.frames.push(CallFrame::new(closure, base));
        Ok(window)
    }

    pub(crate) fn code_of(&self, closure: u32) -> Result<&CodeObject, RuntimeError> {
        let function = self
            .heap
            .get_function(closure)
            .ok_or(RuntimeError::FunctionNotFound(closure))?;
        self.heap.get_code(function.code).ok_or_else(|| {
            RuntimeError::MalformedCode(format!("code object #{} not loaded", function.code))
        })
    }

    pub(crate) fn snapshot(&self, reason: HaltReason, window: Window) -> HaltReport {
        let end = window.end().min(self.stack.len());
        let start = window.base.min(end);
        HaltReport {
            reason,
            base: window.base,
            registers: self.stack[start..end].to_vec(),
        }
    }

    // --- Inspection ---

    /// Current state of upvalue `handle`.
    pub fn upvalue_location(&self, handle: u32) -> Option<UpvalueLocation> {
        self.heap.get_upvalue(handle).map(|u| u.location)
    }

    /// Value seen through upvalue `handle`, open or closed.
    pub fn read_upvalue(&self, handle: u32) -> Option<Value> {
        match self.heap.get_upvalue(handle)?.location {
            UpvalueLocation::Open(idx) => self.stack.get(idx).copied(),
            UpvalueLocation::Closed(v) => Some(v),
        }
    }

    /// Upvalue slots of closure `handle`.
    pub fn function_upvalues(&self, handle: u32) -> Option<&[Option<u32>]> {
        self.heap
            .get_function(handle)
            .map(|f| f.upvalues.as_slice())
    }

    pub fn open_upvalue_count(&self) -> usize {
        self.open_upvalues.len()
    }

    /// Register window of the executing frame.
    pub fn current_window(&self) -> Option<Window> {
        let frame = self.frames.last()?;
        let size = self.code_of(frame.closure).ok()?.stack_size as usize;
        Some(Window::new(frame.base, size))
    }
}
