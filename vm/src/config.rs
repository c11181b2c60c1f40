use serde::Deserialize;

pub const DEFAULT_STACK_SIZE: usize = 1024;
pub const DEFAULT_MAX_FRAMES: usize = 256;

/// Largest accepted capacities; the register stack is allocated up front.
pub const MAX_STACK_SIZE: usize = 1 << 20;
pub const MAX_FRAMES: usize = 65_536;

/// Fixed capacities and debugging switches for one VM instance.
///
/// Capacities never grow at run time; exceeding them is a fatal fault.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Register stack capacity in slots.
    pub stack_size: usize,
    /// Maximum call depth, entry frame included.
    pub max_frames: usize,
    /// Reset every slot above a returning frame's base to `Uninitialized`,
    /// so stale reads through a leaked open upvalue show up immediately.
    pub scrub_on_return: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            max_frames: DEFAULT_MAX_FRAMES,
            scrub_on_return: true,
        }
    }
}
