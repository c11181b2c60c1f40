use memory::Value;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// A HALT instruction executed.
    Halt,
    /// The entry frame returned.
    EntryReturn,
}

/// Read-only snapshot of the halting frame's register window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HaltReport {
    pub reason: HaltReason,
    pub base: usize,
    pub registers: Vec<Value>,
}

impl HaltReport {
    /// Register `reg` of the halting frame.
    pub fn register(&self, reg: usize) -> Option<Value> {
        self.registers.get(reg).copied()
    }

    /// Register `reg` as a number, if it holds one.
    pub fn number(&self, reg: usize) -> Option<f64> {
        self.register(reg).and_then(|v| v.as_number())
    }
}

impl fmt::Display for HaltReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            HaltReason::Halt => writeln!(f, "Machine halted!")?,
            HaltReason::EntryReturn => writeln!(f, "Entry function returned")?,
        }
        writeln!(f, "---------------")?;
        for (i, v) in self.registers.iter().enumerate() {
            writeln!(f, "{}: {}", self.base + i, v)?;
        }
        Ok(())
    }
}
