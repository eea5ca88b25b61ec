//! Bounded single-consumer mailbox

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;
use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use embassy_futures::select::{Either, Either3, select, select3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TryReceiveError, TrySendError};
use embassy_sync::signal::Signal;

use super::message::{Message, Outcome, PendingReply, Post, Request};
use crate::config::QUEUE_DEPTH;

/// Error returned to an originator when a message cannot be enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The mailbox is full (non-blocking sends only)
    Full,
    /// The queue was torn down and accepts no more messages
    TornDown,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full => write!(f, "Message queue is full"),
            QueueError::TornDown => write!(f, "Message queue was torn down"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QueueError {}

/// Teardown signal returned by [`MessageQueue::wait`]
///
/// Not an error: it tells the consuming task to leave its run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shutdown;

impl fmt::Display for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message queue shut down")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Shutdown {}

/// Result of a bounded wait that produced no message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The queue was torn down
    Shutdown,
    /// The deadline future completed first; the queue is still live
    DeadlineExpired,
}

impl From<Shutdown> for WaitError {
    fn from(_: Shutdown) -> Self {
        WaitError::Shutdown
    }
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitError::Shutdown => write!(f, "Message queue shut down"),
            WaitError::DeadlineExpired => write!(f, "Deadline expired before a message arrived"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WaitError {}

/// Mailbox of a single consuming task
///
/// Messages are delivered in enqueue order. Once [`MessageQueue::teardown`]
/// has been called, every wait returns [`Shutdown`] and every send fails with
/// [`QueueError::TornDown`]. Pending requests discarded by the teardown are
/// resolved as [`Outcome::Abandoned`].
///
/// # Example
///
/// ```no_run
/// use uart_core::ipc::{Message, MessageQueue};
///
/// static QUEUE: MessageQueue = MessageQueue::new();
///
/// async fn consumer() {
///     while let Ok(msg) = QUEUE.wait().await {
///         match msg {
///             Message::Post(post) => post.consume(),
///             Message::Request(request) => request.reply_error(0, 0),
///         }
///     }
/// }
/// ```
pub struct MessageQueue<const N: usize = QUEUE_DEPTH> {
    inbox: Channel<CriticalSectionRawMutex, Message, N>,
    torn_down: AtomicBool,
    teardown: Signal<CriticalSectionRawMutex, ()>,
}

impl<const N: usize> MessageQueue<N> {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            inbox: Channel::new(),
            torn_down: AtomicBool::new(false),
            teardown: Signal::new(),
        }
    }

    /// Enqueue a fire-and-forget message, waiting while the mailbox is full
    pub async fn post(&self, buffer: Vec<u8>) -> Result<(), QueueError> {
        self.send(Message::Post(Post::new(buffer))).await
    }

    /// Enqueue a fire-and-forget message without blocking
    ///
    /// Safe to call from interrupt context.
    pub fn try_post(&self, buffer: Vec<u8>) -> Result<(), QueueError> {
        if self.is_torn_down() {
            return Err(QueueError::TornDown);
        }

        match self.inbox.try_send(Message::Post(Post::new(buffer))) {
            Ok(()) => {
                self.discard_if_torn_down();
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(QueueError::Full),
        }
    }

    /// Enqueue a request and return the handle its outcome arrives on
    pub async fn request(&self, buffer: Vec<u8>) -> Result<PendingReply, QueueError> {
        let (request, pending) = Request::new(buffer);
        self.send(Message::Request(request)).await?;
        Ok(pending)
    }

    /// Enqueue a request and wait for its outcome
    pub async fn call(&self, buffer: Vec<u8>) -> Result<Outcome, QueueError> {
        let pending = self.request(buffer).await?;
        Ok(pending.wait().await)
    }

    async fn send(&self, msg: Message) -> Result<(), QueueError> {
        if self.is_torn_down() {
            // Dropping an unsent request abandons it, but the caller gets the error first
            return Err(QueueError::TornDown);
        }

        self.inbox.send(msg).await;

        // A teardown may have drained the inbox between the check above and
        // the send; make sure nothing is left stranded behind it.
        self.discard_if_torn_down();
        Ok(())
    }

    /// Block until a message arrives or the queue is torn down
    pub async fn wait(&self) -> Result<Message, Shutdown> {
        if self.is_torn_down() {
            self.discard_pending();
            return Err(Shutdown);
        }

        match select(self.inbox.receive(), self.teardown.wait()).await {
            Either::First(msg) => {
                log::trace!("dequeued {:?} ({} bytes)", msg.kind(), msg.len());
                Ok(msg)
            }
            Either::Second(()) => {
                self.discard_pending();
                Err(Shutdown)
            }
        }
    }

    /// Like [`MessageQueue::wait`], but give up when `deadline` completes
    ///
    /// The deadline can be any future, typically a timer. Expiry leaves the
    /// queue untouched and is reported separately from teardown.
    pub async fn wait_until<D: Future>(&self, deadline: D) -> Result<Message, WaitError> {
        if self.is_torn_down() {
            self.discard_pending();
            return Err(WaitError::Shutdown);
        }

        match select3(self.inbox.receive(), self.teardown.wait(), deadline).await {
            Either3::First(msg) => {
                log::trace!("dequeued {:?} ({} bytes)", msg.kind(), msg.len());
                Ok(msg)
            }
            Either3::Second(()) => {
                self.discard_pending();
                Err(WaitError::Shutdown)
            }
            Either3::Third(_) => Err(WaitError::DeadlineExpired),
        }
    }

    /// Dequeue a message if one is pending, without blocking
    pub fn try_wait(&self) -> Result<Option<Message>, Shutdown> {
        if self.is_torn_down() {
            self.discard_pending();
            return Err(Shutdown);
        }

        match self.inbox.try_receive() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryReceiveError::Empty) => Ok(None),
        }
    }

    /// Tear the queue down
    ///
    /// Wakes a consumer blocked in [`MessageQueue::wait`], discards pending
    /// messages and rejects all further sends. Calling it again is a no-op.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        log::debug!("message queue torn down with {} pending", self.inbox.len());
        self.discard_pending();
        self.teardown.signal(());
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Number of messages waiting to be dequeued
    pub fn len(&self) -> usize {
        self.inbox.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbox.is_empty()
    }

    fn discard_if_torn_down(&self) {
        if self.is_torn_down() {
            self.discard_pending();
        }
    }

    /// Drop every pending message outside the channel lock. Requests among
    /// them resolve as abandoned.
    fn discard_pending(&self) {
        while let Ok(msg) = self.inbox.try_receive() {
            log::trace!("discarding {:?} after teardown", msg.kind());
            drop(msg);
        }
    }
}

impl<const N: usize> Default for MessageQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use crate::ipc::MessageKind;
    use alloc::vec;
    use embassy_futures::block_on;
    use embassy_futures::join::join;

    #[test]
    fn test_messages_arrive_in_enqueue_order() {
        let queue = MessageQueue::<4>::new();
        for i in 0..4u8 {
            queue.try_post(vec![i]).unwrap();
        }

        for i in 0..4u8 {
            let msg = block_on(queue.wait()).unwrap();
            assert_eq!(msg.buffer(), &[i]);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_post_full() {
        let queue = MessageQueue::<2>::new();
        queue.try_post(vec![1]).unwrap();
        queue.try_post(vec![2]).unwrap();
        assert_eq!(queue.try_post(vec![3]), Err(QueueError::Full));
    }

    #[test]
    fn test_wait_after_teardown_always_shuts_down() {
        let queue = MessageQueue::<4>::new();
        queue.try_post(b"pending".to_vec()).unwrap();
        queue.teardown();

        for _ in 0..3 {
            assert!(matches!(block_on(queue.wait()), Err(Shutdown)));
        }
        assert!(matches!(queue.try_wait(), Err(Shutdown)));
        assert_eq!(queue.try_post(vec![0]), Err(QueueError::TornDown));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_teardown_wakes_blocked_consumer() {
        let queue = MessageQueue::<4>::new();
        let (result, ()) = block_on(join(queue.wait(), async {
            queue.teardown();
        }));
        assert!(matches!(result, Err(Shutdown)));
    }

    #[test]
    fn test_teardown_abandons_pending_requests() {
        let queue = MessageQueue::<4>::new();
        let pending = block_on(queue.request(b"cmd".to_vec())).unwrap();
        queue.teardown();
        assert_eq!(pending.try_outcome(), Some(Outcome::Abandoned));
    }

    #[test]
    fn test_call_round_trip() {
        let queue = MessageQueue::<4>::new();
        let (outcome, ()) = block_on(join(queue.call(b"ping".to_vec()), async {
            match queue.wait().await.unwrap() {
                Message::Request(request) => request.reply_with(0, 0, 0, b"pong").unwrap(),
                Message::Post(_) => panic!("Expected request"),
            }
        }));

        match outcome.unwrap() {
            Outcome::Reply(reply) => assert_eq!(reply.payload, b"pong"),
            other => panic!("Expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_wait_until_deadline_is_not_shutdown() {
        let queue = MessageQueue::<4>::new();
        let result = block_on(queue.wait_until(core::future::ready(())));
        assert!(matches!(result, Err(WaitError::DeadlineExpired)));
        assert!(!queue.is_torn_down());

        queue.try_post(vec![9]).unwrap();
        let msg = block_on(queue.wait_until(core::future::pending::<()>())).unwrap();
        assert_eq!(msg.kind(), MessageKind::Post);
    }

    #[test]
    fn test_wait_until_dequeues_like_wait() {
        let queue = MessageQueue::<4>::new();
        queue.try_post(vec![1]).unwrap();
        queue.try_post(vec![2]).unwrap();

        let first = block_on(queue.wait_until(core::future::pending::<()>())).unwrap();
        let second = block_on(queue.wait()).unwrap();
        assert_eq!(first.buffer(), &[1]);
        assert_eq!(second.buffer(), &[2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let queue = MessageQueue::<4>::new();
        queue.teardown();
        queue.teardown();
        assert!(queue.is_torn_down());
        assert!(matches!(block_on(queue.wait()), Err(Shutdown)));
    }
}
