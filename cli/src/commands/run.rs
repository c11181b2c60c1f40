use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use vm::{HaltReport, VmConfig, VM};

use super::open_program;
use crate::config::load_config;

pub fn run_file(path: &str, config_path: Option<&str>, json: bool) -> Result<()> {
    let config = match config_path {
        Some(p) => load_config(Path::new(p))?,
        None => VmConfig::default(),
    };

    let report = execute_file(path, config)?;
    println!("{}", render_report(&report, json)?);
    Ok(())
}

/// Load, verify and run `path` to completion.
pub fn execute_file(path: &str, config: VmConfig) -> Result<HaltReport> {
    let program = open_program(path, true)?;

    let mut vm = VM::with_config(config);
    vm.load_program(program)
        .map_err(|e| anyhow::anyhow!("Runtime Error: {}", e))
        .with_context(|| format!("While loading {}", path))?;

    let report = vm
        .interpret()
        .map_err(|e| anyhow::anyhow!("Runtime Error: {}", e))?;
    info!(reason = ?report.reason, registers = report.registers.len(), "run finished");
    Ok(report)
}

pub fn render_report(report: &HaltReport, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(report).context("Failed to serialize halt report");
    }
    Ok(report.to_string().trim_end().to_string())
}
