//! Formatted I/O
//!
//! The print / line-read interface the terminal is written against, and
//! [`SerialConsole`], its implementation on top of the serial output queue.

use core::fmt;

pub mod console;

pub use console::{ConsoleError, SerialConsole};

/// Formatted print and blocking line read
#[allow(
    async_fn_in_trait,
    reason = "firmware tasks share one executor, callers never need Send futures"
)]
pub trait FormattedIo {
    type Error: fmt::Debug + fmt::Display;

    /// Print formatted text, blocking while the output path is congested.
    /// Returns the number of bytes printed.
    async fn print(&mut self, args: fmt::Arguments<'_>) -> Result<usize, Self::Error>;

    /// Print formatted text without blocking; safe from interrupt context.
    fn print_from_isr(&self, args: fmt::Arguments<'_>) -> Result<usize, Self::Error>;

    /// Read into `line` until `delim` (kept) or until `line` is full.
    /// Returns the number of bytes read.
    async fn getdelim(&mut self, line: &mut [u8], delim: u8) -> Result<usize, Self::Error>;

    /// Read one newline-terminated line into `line`
    async fn getline(&mut self, line: &mut [u8]) -> Result<usize, Self::Error> {
        self.getdelim(line, b'\n').await
    }
}
