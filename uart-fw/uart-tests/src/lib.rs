//! Test doubles shared by the integration tests
//!
//! The firmware crate only sees traits (`CharSink`, `CommandProcessor`,
//! `FormattedIo`, `embedded_io_async::Read`); the types here implement them
//! over in-memory buffers so tests can script input and inspect output.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use embedded_io_async::{ErrorType, Read};
use uart_core::serial::CharSink;
use uart_core::{FormattedIo, MessageQueue, Serial, SerialConfig};

/// Leak a fresh queue into `'static` storage
pub fn leak_queue() -> &'static MessageQueue {
    Box::leak(Box::new(MessageQueue::new()))
}

/// Leak a serial context that does not clear the screen on start
pub fn leak_serial() -> &'static Serial {
    Box::leak(Box::new(Serial::new(SerialConfig {
        clear_on_start: false,
        ..SerialConfig::default()
    })))
}

/// Character sink recording every character it is handed
///
/// Clones share the same buffer, so a test keeps one clone while the output
/// task owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    written: Rc<RefCell<Vec<u8>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.written.borrow()).into_owned()
    }
}

impl CharSink for RecordingSink {
    fn put_char(&mut self, c: u8) {
        self.written.borrow_mut().push(c);
    }
}

/// Byte source replaying a fixed script, then reporting end of input
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
}

impl ScriptedInput {
    pub fn new(script: &[u8]) -> Self {
        Self {
            bytes: script.iter().copied().collect(),
        }
    }
}

impl ErrorType for ScriptedInput {
    type Error = Infallible;
}

impl Read for ScriptedInput {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut n = 0;
        while n < buf.len() {
            let Some(byte) = self.bytes.pop_front() else {
                break;
            };
            buf[n] = byte;
            n += 1;
        }
        Ok(n)
    }
}

/// Failure injected by [`FakeIo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeIoError;

impl fmt::Display for FakeIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Injected I/O failure")
    }
}

/// Formatted I/O double: scripted lines in, recorded text out
///
/// Each entry of the script answers one line read; `None` entries fail the
/// read. Reading past the script fails as well.
#[derive(Debug, Default)]
pub struct FakeIo {
    lines: VecDeque<Option<Vec<u8>>>,
    printed: String,
}

impl FakeIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: &str) -> Self {
        self.lines.push_back(Some(line.as_bytes().to_vec()));
        self
    }

    pub fn raw_line(mut self, line: &[u8]) -> Self {
        self.lines.push_back(Some(line.to_vec()));
        self
    }

    pub fn read_failure(mut self) -> Self {
        self.lines.push_back(None);
        self
    }

    pub fn printed(&self) -> &str {
        &self.printed
    }
}

impl FormattedIo for FakeIo {
    type Error = FakeIoError;

    async fn print(&mut self, args: fmt::Arguments<'_>) -> Result<usize, FakeIoError> {
        let text = args.to_string();
        self.printed.push_str(&text);
        Ok(text.len())
    }

    fn print_from_isr(&self, _args: fmt::Arguments<'_>) -> Result<usize, FakeIoError> {
        Err(FakeIoError)
    }

    async fn getdelim(&mut self, line: &mut [u8], delim: u8) -> Result<usize, FakeIoError> {
        let bytes = self.lines.pop_front().flatten().ok_or(FakeIoError)?;
        let end = bytes
            .iter()
            .position(|&b| b == delim)
            .map_or(bytes.len(), |at| at + 1)
            .min(line.len());
        line[..end].copy_from_slice(&bytes[..end]);
        Ok(end)
    }
}
