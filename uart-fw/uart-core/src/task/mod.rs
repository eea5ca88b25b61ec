//! Task records and the supervision protocol
//!
//! Every consumer task runs the same lifecycle:
//!
//! ```text
//! Created ──spawn──▶ Running ──run loop returns──▶ Exiting ──▶ Deleted
//! ```
//!
//! The run loop returns when its queue signals teardown. The task then marks
//! itself `Deleted` and notifies whoever supervises it; releasing the task's
//! resources is the supervisor's job (it [`TaskRecord::join`]s and drops the
//! future), never the task's own.

extern crate alloc;

use alloc::boxed::Box;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicU8, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

pub mod local;

pub use local::LocalSpawner;

/// Scheduler priority every firmware task runs at
pub const DEFAULT_PRIORITY: u8 = 1;

/// Stack size requested for every firmware task, in bytes
pub const DEFAULT_STACK_SIZE: usize = 2048;

/// A spawned task body
///
/// Tasks of this firmware share a single-core executor, so the futures are
/// not required to be `Send`.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Record exists, task not started
    Created = 0,
    /// Executing its run loop
    Running = 1,
    /// Run loop returned, terminal sequence in progress
    Exiting = 2,
    /// Finished; does no further work and is never resumed
    Deleted = 3,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Created,
            1 => TaskState::Running,
            2 => TaskState::Exiting,
            _ => TaskState::Deleted,
        }
    }
}

/// Per-task bookkeeping, created once at initialization
pub struct TaskRecord {
    name: &'static str,
    priority: u8,
    stack_size: usize,
    state: AtomicU8,
    finished: Signal<CriticalSectionRawMutex, ()>,
}

impl TaskRecord {
    pub const fn new(name: &'static str, priority: u8, stack_size: usize) -> Self {
        Self {
            name,
            priority,
            stack_size,
            state: AtomicU8::new(TaskState::Created as u8),
            finished: Signal::new(),
        }
    }

    /// Record with the default priority and stack size
    pub const fn with_defaults(name: &'static str) -> Self {
        Self::new(name, DEFAULT_PRIORITY, DEFAULT_STACK_SIZE)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once the task reached its terminal state
    pub fn is_finished(&self) -> bool {
        self.state() == TaskState::Deleted
    }

    /// Run `body` as this task's run loop, then perform the terminal sequence.
    ///
    /// A record only ever runs once; supervising a record that already left
    /// `Created` is refused.
    pub async fn supervise<F: Future<Output = ()>>(&self, body: F) {
        if self
            .state
            .compare_exchange(
                TaskState::Created as u8,
                TaskState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            log::error!("task {} started twice (state {:?})", self.name, self.state());
            return;
        }
        log::debug!("task {} running", self.name);

        body.await;

        self.set_state(TaskState::Exiting);
        log::debug!("task {} exiting", self.name);

        // Stop, then release: mark ourselves finished and let the supervisor reclaim us
        self.set_state(TaskState::Deleted);
        self.finished.signal(());
    }

    /// Wait until the task reached [`TaskState::Deleted`]
    pub async fn join(&self) {
        if self.is_finished() {
            return;
        }
        self.finished.wait().await;
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("stack_size", &self.stack_size)
            .field("state", &self.state())
            .finish()
    }
}

/// Error returned when a task cannot be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// No room for another task (task pool, stack memory, ...)
    Exhausted,
    /// The record was already handed to a spawner
    AlreadySpawned,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::Exhausted => write!(f, "Out of task resources"),
            SpawnError::AlreadySpawned => write!(f, "Task was already spawned"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SpawnError {}

/// Something that can start a task
///
/// Implemented by the firmware's executor glue, by the host emulator and by
/// [`LocalSpawner`].
pub trait TaskSpawner {
    fn spawn(&mut self, record: &'static TaskRecord, task: TaskFuture) -> Result<(), SpawnError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_futures::join::join;

    #[test]
    fn test_supervise_walks_lifecycle() {
        let record = TaskRecord::with_defaults("worker");
        assert_eq!(record.state(), TaskState::Created);

        block_on(record.supervise(async {
            assert_eq!(record.state(), TaskState::Running);
        }));

        assert_eq!(record.state(), TaskState::Deleted);
        assert!(record.is_finished());
    }

    #[test]
    fn test_record_runs_only_once() {
        let record = TaskRecord::with_defaults("once");
        let mut runs = 0;
        block_on(record.supervise(async { runs += 1 }));
        block_on(record.supervise(async { runs += 1 }));
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_join_waits_for_deletion() {
        let record = TaskRecord::with_defaults("joined");
        block_on(join(record.join(), record.supervise(async {})));
        assert!(record.is_finished());

        // Joining a finished task returns immediately
        block_on(record.join());
    }
}
