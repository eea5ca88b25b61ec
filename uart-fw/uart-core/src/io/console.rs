//! Console on top of the serial output queue

extern crate alloc;

use core::fmt;
use embedded_io_async::{Error as _, ErrorKind, Read};

use super::FormattedIo;
use crate::ipc::{MessageQueue, QueueError};

/// Error of a console operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// The output queue refused the text
    Queue(QueueError),
    /// The input stream failed
    Read(ErrorKind),
    /// The input stream is exhausted
    EndOfInput,
}

impl From<QueueError> for ConsoleError {
    fn from(err: QueueError) -> Self {
        ConsoleError::Queue(err)
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Queue(err) => write!(f, "Output error: {err}"),
            ConsoleError::Read(kind) => write!(f, "Input error: {kind:?}"),
            ConsoleError::EndOfInput => write!(f, "End of input"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConsoleError {}

/// Formatted I/O for firmware tasks
///
/// Printing formats into a heap buffer and posts it to the serial output
/// queue, so output from every task is serialized through `serial-out`.
/// Line reads pull bytes from `input`, typically the UART receiver.
pub struct SerialConsole<R> {
    out: &'static MessageQueue,
    input: R,
}

impl<R: Read> SerialConsole<R> {
    pub fn new(out: &'static MessageQueue, input: R) -> Self {
        Self { out, input }
    }

    pub fn out_queue(&self) -> &'static MessageQueue {
        self.out
    }
}

impl<R: Read> FormattedIo for SerialConsole<R> {
    type Error = ConsoleError;

    async fn print(&mut self, args: fmt::Arguments<'_>) -> Result<usize, ConsoleError> {
        let text = alloc::fmt::format(args);
        let len = text.len();
        if len == 0 {
            return Ok(0);
        }

        self.out.post(text.into_bytes()).await?;
        Ok(len)
    }

    fn print_from_isr(&self, args: fmt::Arguments<'_>) -> Result<usize, ConsoleError> {
        let text = alloc::fmt::format(args);
        let len = text.len();
        if len == 0 {
            return Ok(0);
        }

        self.out.try_post(text.into_bytes())?;
        Ok(len)
    }

    async fn getdelim(&mut self, line: &mut [u8], delim: u8) -> Result<usize, ConsoleError> {
        let mut filled = 0;

        while filled < line.len() {
            let mut byte = [0u8; 1];
            match self.input.read(&mut byte).await {
                Ok(0) => {
                    if filled == 0 {
                        return Err(ConsoleError::EndOfInput);
                    }
                    break;
                }
                Ok(_) => {
                    line[filled] = byte[0];
                    filled += 1;
                    if byte[0] == delim {
                        break;
                    }
                }
                Err(err) => return Err(ConsoleError::Read(err.kind())),
            }
        }

        Ok(filled)
    }
}
