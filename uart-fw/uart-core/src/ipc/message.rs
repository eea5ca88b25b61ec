//! Messages and their resolution protocol

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// One-shot slot the consumer resolves and the originator waits on
type ReplySlot = Signal<CriticalSectionRawMutex, Outcome>;

/// Kind of a dequeued message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Fire-and-forget, released with [`Post::consume`]
    Post,
    /// Awaits exactly one reply or error reply
    Request,
}

/// A message as seen by the consuming task
#[derive(Debug)]
pub enum Message {
    Post(Post),
    Request(Request),
}

impl Message {
    /// Kind of this message
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Post(_) => MessageKind::Post,
            Message::Request(_) => MessageKind::Request,
        }
    }

    /// Length of the carried buffer, without consuming the message
    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    /// True if the carried buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The carried buffer
    pub fn buffer(&self) -> &[u8] {
        match self {
            Message::Post(post) => post.buffer(),
            Message::Request(request) => request.buffer(),
        }
    }
}

/// Fire-and-forget message
#[derive(Debug)]
pub struct Post {
    buffer: Vec<u8>,
}

impl Post {
    pub(crate) fn new(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Release the message without a reply. The buffer is freed.
    pub fn consume(self) {
        log::trace!("post consumed ({} bytes)", self.buffer.len());
    }
}

/// Successful reply delivered to a request's originator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u32,
    pub aux: [u32; 2],
    /// Response payload; this is the request buffer, truncated to the reply length
    pub payload: Vec<u8>,
}

/// Failure reply delivered to a request's originator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReply {
    pub code: u32,
    pub aux: u32,
}

/// How a request was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(Reply),
    Error(ErrorReply),
    /// The request was dropped without a reply (consumer bug or queue teardown)
    Abandoned,
}

impl Outcome {
    pub fn is_reply(&self) -> bool {
        matches!(self, Outcome::Reply(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

/// Request message awaiting exactly one resolution
///
/// Every resolution method takes `self`, so a request can be resolved at most
/// once. Dropping an unresolved request resolves it with
/// [`Outcome::Abandoned`], so the originator is never left waiting.
pub struct Request {
    buffer: Vec<u8>,
    slot: Option<Arc<ReplySlot>>,
}

impl Request {
    pub(crate) fn new(buffer: Vec<u8>) -> (Self, PendingReply) {
        let slot = Arc::new(ReplySlot::new());
        let request = Self {
            buffer,
            slot: Some(slot.clone()),
        };
        (request, PendingReply { slot })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The request buffer, writable in place by the consumer
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Largest payload a reply may carry: the original buffer length
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Release the request and reply with the first `length` bytes of its own buffer.
    ///
    /// `length` may not exceed [`Request::capacity`]; an oversized reply is
    /// rejected and the still-unresolved request is handed back.
    pub fn reply(
        mut self,
        status: u32,
        aux1: u32,
        aux2: u32,
        length: usize,
    ) -> Result<(), OversizedReply> {
        if length > self.capacity() {
            return Err(OversizedReply {
                requested: length,
                request: self,
            });
        }

        let mut payload = core::mem::take(&mut self.buffer);
        payload.truncate(length);
        self.resolve(Outcome::Reply(Reply {
            status,
            aux: [aux1, aux2],
            payload,
        }));
        Ok(())
    }

    /// Release the request and reply with a copy of `payload`.
    ///
    /// The payload is copied into the request buffer, so the same capacity
    /// rule as [`Request::reply`] applies.
    pub fn reply_with(
        mut self,
        status: u32,
        aux1: u32,
        aux2: u32,
        payload: &[u8],
    ) -> Result<(), OversizedReply> {
        if payload.len() > self.capacity() {
            return Err(OversizedReply {
                requested: payload.len(),
                request: self,
            });
        }

        self.buffer[..payload.len()].copy_from_slice(payload);
        self.reply(status, aux1, aux2, payload.len())
    }

    /// Release the request and deliver a failure with no payload.
    pub fn reply_error(mut self, code: u32, aux: u32) {
        self.resolve(Outcome::Error(ErrorReply { code, aux }));
    }

    fn resolve(&mut self, outcome: Outcome) {
        if let Some(slot) = self.slot.take() {
            slot.signal(outcome);
        }
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        if self.slot.is_some() {
            log::warn!("request dropped without a reply ({} bytes)", self.buffer.len());
            self.resolve(Outcome::Abandoned);
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("len", &self.buffer.len())
            .field("resolved", &self.slot.is_none())
            .finish()
    }
}

/// Originator's handle on an outstanding request
pub struct PendingReply {
    slot: Arc<ReplySlot>,
}

impl PendingReply {
    /// Block until the request is resolved
    pub async fn wait(self) -> Outcome {
        self.slot.wait().await
    }

    /// Take the outcome if the request has already been resolved
    pub fn try_outcome(&self) -> Option<Outcome> {
        self.slot.try_take()
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.signaled()
    }
}

impl fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingReply")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A reply longer than the request's original buffer
#[derive(Debug)]
pub struct OversizedReply {
    requested: usize,
    request: Request,
}

impl OversizedReply {
    /// Length the consumer tried to reply with
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Recover the unresolved request so it can still be resolved
    pub fn into_request(self) -> Request {
        self.request
    }
}

impl fmt::Display for OversizedReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reply of {} bytes exceeds request capacity of {} bytes",
            self.requested,
            self.request.capacity()
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OversizedReply {}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::vec;

    #[test]
    fn test_reply_reuses_request_buffer() {
        let (mut request, pending) = Request::new(b"hello".to_vec());
        request.buffer_mut()[0] = b'j';
        request.reply(7, 1, 2, 3).unwrap();

        match pending.try_outcome() {
            Some(Outcome::Reply(reply)) => {
                assert_eq!(reply.status, 7);
                assert_eq!(reply.aux, [1, 2]);
                assert_eq!(reply.payload, b"jel");
            }
            other => panic!("Expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_reply_hands_request_back() {
        let (request, pending) = Request::new(vec![0u8; 4]);
        let err = request.reply(0, 0, 0, 5).unwrap_err();
        assert_eq!(err.requested(), 5);
        assert!(!pending.is_resolved());

        err.into_request().reply_error(3, 4);
        assert_eq!(
            pending.try_outcome(),
            Some(Outcome::Error(ErrorReply { code: 3, aux: 4 }))
        );
    }

    #[test]
    fn test_reply_with_copies_payload() {
        let (request, pending) = Request::new(vec![0u8; 8]);
        request.reply_with(0, 0, 0, b"ok").unwrap();
        match pending.try_outcome() {
            Some(Outcome::Reply(reply)) => assert_eq!(reply.payload, b"ok"),
            other => panic!("Expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_reply_with_rejects_long_payload() {
        let (request, pending) = Request::new(vec![0u8; 1]);
        assert!(request.reply_with(0, 0, 0, b"too long").is_err());
        // The handed-back request is dropped here, which abandons it
        assert_eq!(pending.try_outcome(), Some(Outcome::Abandoned));
    }

    #[test]
    fn test_dropped_request_is_abandoned() {
        let (request, pending) = Request::new(vec![1, 2, 3]);
        drop(request);
        assert_eq!(pending.try_outcome(), Some(Outcome::Abandoned));
    }

    #[test]
    fn test_message_len_does_not_consume() {
        let msg = Message::Post(Post::new(b"abc".to_vec()));
        assert_eq!(msg.len(), 3);
        assert_eq!(msg.kind(), MessageKind::Post);
        assert_eq!(msg.buffer(), b"abc");
    }
}
