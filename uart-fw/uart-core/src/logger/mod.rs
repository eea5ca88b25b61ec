//! Logging infrastructure for uart-core.
//!
//! Firmware builds route `log` records through the serial output queue so
//! they interleave cleanly with terminal output. Hosted builds install their
//! own logger (e.g. `env_logger`) instead.

pub mod serial;

pub use serial::{SerialLogger, init as init_serial_logger};
