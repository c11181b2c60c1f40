use crate::code::CodeObject;
use crate::Value;

/// A closure: shared code plus the upvalue cells it has captured.
///
/// `upvalues[i]` is `None` until a BIND targets slot `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub code: u32,
    pub upvalues: Vec<Option<u32>>,
}

impl Function {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            upvalues: Vec::new(),
        }
    }

    /// Store `upvalue` in slot `index`, growing the slot list as needed.
    pub fn bind(&mut self, index: usize, upvalue: u32) {
        if index >= self.upvalues.len() {
            self.upvalues.resize(index + 1, None);
        }
        self.upvalues[index] = Some(upvalue);
    }

    pub fn upvalue(&self, index: usize) -> Option<u32> {
        self.upvalues.get(index).copied().flatten()
    }
}

/// Where an upvalue's value currently lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpvalueLocation {
    /// Proxies the register stack at this absolute index.
    Open(usize),
    /// Owns its value.
    Closed(Value),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("upvalue already closed")]
pub struct AlreadyClosed;

/// A capture cell. Shared by handle among every closure that captured the
/// same stack slot while it was open.
#[derive(Debug, Clone, PartialEq)]
pub struct Upvalue {
    pub location: UpvalueLocation,
}

impl Upvalue {
    pub fn open(stack_idx: usize) -> Self {
        Self {
            location: UpvalueLocation::Open(stack_idx),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.location, UpvalueLocation::Open(_))
    }

    /// Stack index observed while open.
    pub fn stack_index(&self) -> Option<usize> {
        match self.location {
            UpvalueLocation::Open(idx) => Some(idx),
            UpvalueLocation::Closed(_) => None,
        }
    }

    /// One-way Open -> Closed transition, taking ownership of `value`.
    pub fn close(&mut self, value: Value) -> Result<(), AlreadyClosed> {
        match self.location {
            UpvalueLocation::Open(_) => {
                self.location = UpvalueLocation::Closed(value);
                Ok(())
            }
            UpvalueLocation::Closed(_) => Err(AlreadyClosed),
        }
    }
}

/// Append-only typed storage. Handles stay valid for the heap's lifetime.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    pub data: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn alloc(&mut self, item: T) -> u32 {
        let index = self.data.len() as u32;
        self.data.push(item);
        index
    }

    pub fn get(&self, handle: u32) -> Option<&T> {
        self.data.get(handle as usize)
    }

    pub fn get_mut(&mut self, handle: u32) -> Option<&mut T> {
        self.data.get_mut(handle as usize)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Owner of every code object, closure and upvalue cell created during a
/// run. Nothing is reclaimed: lifetimes are the host's concern.
#[derive(Debug, Default)]
pub struct Heap {
    pub code_objects: Arena<CodeObject>,
    pub functions: Arena<Function>,
    pub upvalues: Arena<Upvalue>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_code(&mut self, code: CodeObject) -> u32 {
        self.code_objects.alloc(code)
    }

    pub fn get_code(&self, handle: u32) -> Option<&CodeObject> {
        self.code_objects.get(handle)
    }

    pub fn alloc_function(&mut self, function: Function) -> u32 {
        self.functions.alloc(function)
    }

    pub fn get_function(&self, handle: u32) -> Option<&Function> {
        self.functions.get(handle)
    }

    pub fn get_function_mut(&mut self, handle: u32) -> Option<&mut Function> {
        self.functions.get_mut(handle)
    }

    pub fn alloc_upvalue(&mut self, upvalue: Upvalue) -> u32 {
        self.upvalues.alloc(upvalue)
    }

    pub fn get_upvalue(&self, handle: u32) -> Option<&Upvalue> {
        self.upvalues.get(handle)
    }

    pub fn get_upvalue_mut(&mut self, handle: u32) -> Option<&mut Upvalue> {
        self.upvalues.get_mut(handle)
    }
}
