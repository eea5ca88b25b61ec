//! Inter-task message queue
//!
//! A [`MessageQueue`] is the mailbox of exactly one consuming task. Any number
//! of originators (interrupt handlers, a peer processor transport, other tasks)
//! enqueue messages; the owning task dequeues them one at a time with
//! [`MessageQueue::wait`] and resolves each one before waiting again.
//!
//! Two kinds of message share the same primitive:
//!
//! - [`Post`]: fire-and-forget. The originator gives up the buffer; the
//!   consumer releases it with [`Post::consume`]. There is no reply path.
//! - [`Request`]: the originator holds a [`PendingReply`] and receives exactly
//!   one [`Outcome`]. The consumer resolves it with [`Request::reply`],
//!   [`Request::reply_with`] or [`Request::reply_error`], each of which takes
//!   the request by value. A request dropped without being resolved resolves
//!   its originator with [`Outcome::Abandoned`].
//!
//! The buffer of a message is owned by exactly one side at a time: the
//! originator before enqueue, the consumer between dequeue and resolution,
//! and the originator again once the reply payload arrives.

pub mod message;
pub mod queue;

pub use message::{
    ErrorReply, Message, MessageKind, Outcome, OversizedReply, PendingReply, Post, Reply, Request,
};
pub use queue::{MessageQueue, QueueError, Shutdown, WaitError};
