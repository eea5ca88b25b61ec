//! Serial output task
//!
//! Drains raw byte buffers from its queue and writes them to the character
//! sink in enqueue order. A one-way pipe: posts are consumed, never answered.

extern crate alloc;

use alloc::boxed::Box;

use crate::ipc::{Message, MessageQueue};
use crate::task::{TaskFuture, TaskRecord};

/// Escape sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";

/// Hardware character output
///
/// Synchronous and infallible at this layer; the driver underneath may block.
pub trait CharSink {
    /// Write a single character
    fn put_char(&mut self, c: u8);

    /// Write a byte string, one character at a time
    fn put_str(&mut self, bytes: &[u8]) {
        for &c in bytes {
            self.put_char(c);
        }
    }

    /// Clear the terminal
    fn clear(&mut self) {
        self.put_str(CLEAR_SCREEN);
    }
}

impl<S: CharSink + ?Sized> CharSink for &mut S {
    fn put_char(&mut self, c: u8) {
        (**self).put_char(c);
    }

    fn put_str(&mut self, bytes: &[u8]) {
        (**self).put_str(bytes);
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}

/// Consumer task of the serial output queue
pub struct SerialOutTask<S> {
    queue: &'static MessageQueue,
    sink: S,
    clear_on_start: bool,
}

impl<S: CharSink> SerialOutTask<S> {
    pub fn new(queue: &'static MessageQueue, sink: S, clear_on_start: bool) -> Self {
        Self {
            queue,
            sink,
            clear_on_start,
        }
    }

    /// Run loop: returns once the queue is torn down
    pub async fn run(&mut self) {
        if self.clear_on_start {
            self.sink.clear();
        }

        loop {
            let Ok(msg) = self.queue.wait().await else {
                return;
            };

            self.sink.put_str(msg.buffer());

            match msg {
                Message::Post(post) => post.consume(),
                Message::Request(request) => {
                    // Originator chose to wait; acknowledge the write with an empty reply
                    log::warn!("serial-out received a request; acknowledging without payload");
                    if let Err(err) = request.reply(0, 0, 0, 0) {
                        log::warn!("serial-out: {err}");
                        err.into_request().reply_error(0, 0);
                    }
                }
            }
        }
    }

    /// Wrap the run loop in the supervision protocol of `record`
    pub fn into_task(mut self, record: &'static TaskRecord) -> TaskFuture
    where
        S: 'static,
    {
        Box::pin(async move { record.supervise(self.run()).await })
    }
}
