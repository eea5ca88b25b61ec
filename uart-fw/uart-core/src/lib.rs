//! UART firmware core library.
//!
//! This crate provides the task-level plumbing of the serial console firmware:
//! the inter-task message queue with request/reply semantics, the supervision
//! protocol every consumer task follows, the serial output and input tasks
//! built on that queue, and the line-oriented terminal dispatcher.
//!
//! Nothing in here owns a process-wide singleton. Queues and task records are
//! constructed by the caller (usually leaked into `'static` storage at boot)
//! and handed to a [`task::TaskSpawner`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod io;
pub mod ipc;
pub mod logger;
pub mod serial;
pub mod task;
pub mod terminal;

pub use config::{SerialConfig, TerminalConfig};
pub use io::{FormattedIo, SerialConsole};
pub use ipc::{Message, MessageQueue, Outcome, PendingReply, Post, Request};
pub use serial::Serial;
pub use task::{TaskRecord, TaskSpawner, TaskState};
pub use terminal::Terminal;
