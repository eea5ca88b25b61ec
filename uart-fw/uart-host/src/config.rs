//! Host emulator configuration file

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uart_core::{SerialConfig, TerminalConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub serial: SerialConfig,
    pub terminal: TerminalConfig,
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}
