//! TOML configuration for the `run` command.
//!
//! ```toml
//! [vm]
//! stack_size = 4096
//! max_frames = 512
//! scrub_on_return = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use vm::config::{MAX_FRAMES, MAX_STACK_SIZE};
use vm::VmConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    vm: VmConfig,
}

pub fn parse_config(source: &str) -> Result<VmConfig> {
    let file: ConfigFile = toml::from_str(source).context("Invalid configuration")?;
    if file.vm.stack_size == 0 || file.vm.stack_size > MAX_STACK_SIZE {
        anyhow::bail!(
            "Invalid configuration: stack_size must be in 1..={}, got {}",
            MAX_STACK_SIZE,
            file.vm.stack_size
        );
    }
    if file.vm.max_frames == 0 || file.vm.max_frames > MAX_FRAMES {
        anyhow::bail!(
            "Invalid configuration: max_frames must be in 1..={}, got {}",
            MAX_FRAMES,
            file.vm.max_frames
        );
    }
    Ok(file.vm)
}

pub fn load_config(path: &Path) -> Result<VmConfig> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&source).with_context(|| format!("In config {}", path.display()))
}
