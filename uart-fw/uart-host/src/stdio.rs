//! Standard streams as firmware peripherals

use std::io::{self, Write};
use std::rc::Rc;

use embedded_io_async::{ErrorType, Read};
use tokio::io::{AsyncReadExt, BufReader, Stdin};
use tokio::sync::Notify;
use uart_core::serial::CharSink;

/// Character sink writing to the process's stdout
pub struct StdoutSink {
    out: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CharSink for StdoutSink {
    fn put_char(&mut self, c: u8) {
        self.put_str(&[c]);
    }

    fn put_str(&mut self, bytes: &[u8]) {
        let mut out = self.out.lock();
        // The sink has no error path; a closed stdout just loses output
        let _ = out.write_all(bytes).and_then(|()| out.flush());
    }
}

/// Byte source reading the process's stdin
///
/// At end of input it notifies `eof` and then never completes again, so the
/// terminal stays parked instead of spinning on read failures.
pub struct StdinSource {
    input: BufReader<Stdin>,
    eof: Rc<Notify>,
}

impl StdinSource {
    pub fn new(eof: Rc<Notify>) -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()),
            eof,
        }
    }
}

impl ErrorType for StdinSource {
    type Error = io::Error;
}

impl Read for StdinSource {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.input.read(buf).await?;
        if n == 0 {
            log::debug!("stdin closed");
            self.eof.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(n)
    }
}
