//! Logger writing to the serial output queue.

extern crate alloc;

use alloc::boxed::Box;
use alloc::format;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::ipc::MessageQueue;

/// Modules that log while moving output queue traffic. Routing their records
/// back into the queue would feed the output task its own log lines forever.
const QUEUE_PATH_TARGETS: [&str; 2] = ["uart_core::ipc", "uart_core::serial::output"];

/// Logger that posts each record as a line to a serial output queue
///
/// Never blocks: records are posted with `try_post`, and a record that does
/// not fit (queue full or torn down) is dropped. Records from the queue and
/// output task modules are never posted.
pub struct SerialLogger {
    queue: &'static MessageQueue,
    level: LevelFilter,
}

impl SerialLogger {
    pub const fn new(queue: &'static MessageQueue, level: LevelFilter) -> Self {
        Self { queue, level }
    }

    fn line(record: &Record) -> alloc::string::String {
        let module_path = record.module_path().unwrap_or("unknown");
        format!("[{} {}] {}\n\r", record.level(), module_path, record.args())
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && !QUEUE_PATH_TARGETS
                .iter()
                .any(|target| metadata.target().starts_with(target))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Dropped on purpose when the queue cannot take it
        let _ = self.queue.try_post(Self::line(record).into_bytes());
    }

    fn flush(&self) {}
}

/// Install a [`SerialLogger`] as the global logger
pub fn init(queue: &'static MessageQueue, level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = Box::leak(Box::new(SerialLogger::new(queue, level)));
    log::set_logger(logger).map(|()| log::set_max_level(level))
}
