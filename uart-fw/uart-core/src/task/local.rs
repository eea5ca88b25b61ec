//! Cooperative in-process spawner
//!
//! Collects spawned tasks and polls them together from a single future. Used
//! to run the firmware tasks without an RTOS: in tests, and on the host when
//! no real executor is available. Can be given a task limit to simulate
//! running out of task resources.

extern crate alloc;

use alloc::vec::Vec;
use core::future::{Future, poll_fn};
use core::task::Poll;

use super::{SpawnError, TaskFuture, TaskRecord, TaskSpawner};

/// Spawner that runs every task on the caller's executor
pub struct LocalSpawner {
    tasks: Vec<(&'static TaskRecord, TaskFuture)>,
    limit: Option<usize>,
}

impl LocalSpawner {
    /// Create a spawner without a task limit
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            limit: None,
        }
    }

    /// Create a spawner that refuses tasks beyond `limit`
    pub fn with_limit(limit: usize) -> Self {
        Self {
            tasks: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Number of tasks spawned so far
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names of the spawned tasks, in spawn order
    pub fn task_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tasks.iter().map(|(record, _)| record.name())
    }

    /// Poll all spawned tasks until every one of them has finished
    pub async fn run(self) {
        let mut tasks: Vec<Option<(&'static TaskRecord, TaskFuture)>> =
            self.tasks.into_iter().map(Some).collect();

        poll_fn(|cx| {
            let mut pending = false;

            for slot in tasks.iter_mut() {
                let Some((record, task)) = slot else {
                    continue;
                };

                if task.as_mut().poll(cx).is_ready() {
                    let name = record.name();
                    *slot = None;
                    log::trace!("local task {name} completed");
                } else {
                    pending = true;
                }
            }

            if pending { Poll::Pending } else { Poll::Ready(()) }
        })
        .await
    }
}

impl Default for LocalSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSpawner for LocalSpawner {
    fn spawn(&mut self, record: &'static TaskRecord, task: TaskFuture) -> Result<(), SpawnError> {
        if self.limit.is_some_and(|limit| self.tasks.len() >= limit) {
            return Err(SpawnError::Exhausted);
        }
        if self.tasks.iter().any(|(spawned, _)| core::ptr::eq(*spawned, record)) {
            return Err(SpawnError::AlreadySpawned);
        }

        log::trace!("spawning local task {}", record.name());
        self.tasks.push((record, task));
        Ok(())
    }
}
