//! Serial input task
//!
//! Bridges command requests arriving on its queue to a [`CommandProcessor`]
//! and resolves every request: a success reply carrying the processed buffer,
//! or a generic error reply.

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;

use crate::ipc::{Message, MessageQueue};
use crate::task::{TaskFuture, TaskRecord};

/// Failure of the command processor. Carries no detail on purpose: the
/// originator only learns that the command failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessError;

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command processing failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProcessError {}

/// External command processor
///
/// Works in place: reads the first `len` bytes of `buffer`, writes its result
/// into the same buffer and returns the result length. The buffer is exactly
/// as long as the request, so the processor cannot write past it; returning a
/// longer length is rejected by the reply path.
pub trait CommandProcessor {
    fn execute(&mut self, buffer: &mut [u8], len: usize) -> Result<usize, ProcessError>;
}

impl<F> CommandProcessor for F
where
    F: FnMut(&mut [u8], usize) -> Result<usize, ProcessError>,
{
    fn execute(&mut self, buffer: &mut [u8], len: usize) -> Result<usize, ProcessError> {
        self(buffer, len)
    }
}

/// Processor that leaves the buffer untouched and reports it unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProcessor;

impl CommandProcessor for EchoProcessor {
    fn execute(&mut self, _buffer: &mut [u8], len: usize) -> Result<usize, ProcessError> {
        Ok(len)
    }
}

/// Consumer task of the serial input queue
pub struct SerialInTask<P> {
    queue: &'static MessageQueue,
    processor: P,
}

impl<P: CommandProcessor> SerialInTask<P> {
    pub fn new(queue: &'static MessageQueue, processor: P) -> Self {
        Self { queue, processor }
    }

    /// Run loop: returns once the queue is torn down
    pub async fn run(&mut self) {
        loop {
            let Ok(msg) = self.queue.wait().await else {
                return;
            };

            match msg {
                Message::Request(mut request) => {
                    let len = request.len();
                    match self.processor.execute(request.buffer_mut(), len) {
                        Err(err) => {
                            log::debug!("serial-in: {err}");
                            request.reply_error(0, 0);
                        }
                        Ok(new_len) => {
                            if let Err(err) = request.reply(0, 0, 0, new_len) {
                                log::warn!("serial-in: {err}");
                                err.into_request().reply_error(0, 0);
                            }
                        }
                    }
                }
                Message::Post(mut post) => {
                    // Nobody waits for the result of a posted command
                    let len = post.len();
                    if self.processor.execute(post.buffer_mut(), len).is_err() {
                        log::debug!("serial-in: posted command failed");
                    }
                    post.consume();
                }
            }
        }
    }

    /// Wrap the run loop in the supervision protocol of `record`
    pub fn into_task(mut self, record: &'static TaskRecord) -> TaskFuture
    where
        P: 'static,
    {
        Box::pin(async move { record.supervise(self.run()).await })
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use crate::ipc::{ErrorReply, Outcome};
    use alloc::vec::Vec;
    use embassy_futures::block_on;
    use embassy_futures::join::join;

    fn leak_queue() -> &'static MessageQueue {
        Box::leak(Box::new(MessageQueue::new()))
    }

    fn call_once<P: CommandProcessor>(processor: P, buffer: Vec<u8>) -> Outcome {
        let queue = leak_queue();
        let mut task = SerialInTask::new(queue, processor);
        let ((), outcome) = block_on(join(task.run(), async {
            let outcome = queue.call(buffer).await.unwrap();
            queue.teardown();
            outcome
        }));
        outcome
    }

    #[test]
    fn test_echo_round_trip() {
        let outcome = call_once(EchoProcessor, b"status".to_vec());
        match outcome {
            Outcome::Reply(reply) => {
                assert_eq!(reply.status, 0);
                assert_eq!(reply.aux, [0, 0]);
                assert_eq!(reply.payload, b"status");
            }
            other => panic!("Expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_processor_writes_result_in_place() {
        let upper = |buffer: &mut [u8], len: usize| -> Result<usize, ProcessError> {
            buffer[..len].make_ascii_uppercase();
            Ok(len - 1)
        };
        match call_once(upper, b"abc".to_vec()) {
            Outcome::Reply(reply) => assert_eq!(reply.payload, b"AB"),
            other => panic!("Expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_is_generic_error_reply() {
        let failing = |_: &mut [u8], _: usize| -> Result<usize, ProcessError> { Err(ProcessError) };
        assert_eq!(
            call_once(failing, alloc::vec![0u8; 10]),
            Outcome::Error(ErrorReply { code: 0, aux: 0 })
        );
    }

    #[test]
    fn test_overlong_result_becomes_error_reply() {
        let overlong = |_: &mut [u8], len: usize| -> Result<usize, ProcessError> { Ok(len + 1) };
        assert_eq!(
            call_once(overlong, b"abc".to_vec()),
            Outcome::Error(ErrorReply { code: 0, aux: 0 })
        );
    }
}
