//! Runtime configuration for the serial tasks and the terminal.
//!
//! Both structs deserialize with defaults for every missing field, so a
//! partial JSON document (or none at all) is a valid configuration.

extern crate alloc;

use alloc::string::String;
use serde::{Deserialize, Serialize};

use crate::task::{DEFAULT_PRIORITY, DEFAULT_STACK_SIZE, TaskRecord};

/// Depth of every serial mailbox.
pub const QUEUE_DEPTH: usize = 8;

/// Default capacity of the terminal's line buffer.
pub const LINE_CAPACITY: usize = 128;

/// Serial subsystem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Clear the terminal once when the output task starts
    pub clear_on_start: bool,
    /// Scheduler priority of both serial tasks
    pub priority: u8,
    /// Stack size requested for both serial tasks
    pub stack_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            clear_on_start: true,
            priority: DEFAULT_PRIORITY,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Terminal dispatcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Name used as the task name and in diagnostics
    pub name: String,
    /// Prompt printed before each line read
    pub prompt: String,
    /// Maximum number of bytes read per line
    pub line_capacity: usize,
    /// Scheduler priority of the terminal task
    pub priority: u8,
    /// Stack size requested for the terminal task
    pub stack_size: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            name: String::from("terminal"),
            prompt: String::from("> "),
            line_capacity: LINE_CAPACITY,
            priority: DEFAULT_PRIORITY,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl TerminalConfig {
    /// Build the task record for the terminal task.
    ///
    /// Task names are `'static`, so the configured name is leaked once. The
    /// record is created a single time at boot, which bounds the leak.
    pub fn task_record(&self) -> TaskRecord {
        let name: &'static str = alloc::boxed::Box::leak(self.name.clone().into_boxed_str());
        TaskRecord::new(name, self.priority, self.stack_size)
    }
}
