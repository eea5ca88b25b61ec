//! Task spawner backed by a tokio `LocalSet`

use tokio::task::JoinHandle;
use uart_core::task::{SpawnError, TaskFuture, TaskRecord, TaskSpawner};

/// Spawns firmware tasks with `spawn_local`
///
/// Firmware task futures are not `Send`, so every task lives on the current
/// thread's `LocalSet`. Must be used from inside `LocalSet::run_until`.
#[derive(Default)]
pub struct LocalSetSpawner {
    handles: Vec<(&'static TaskRecord, JoinHandle<()>)>,
}

impl LocalSetSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort every task that is still running
    pub fn abort_all(&self) {
        for (record, handle) in &self.handles {
            if !handle.is_finished() {
                log::debug!("aborting task {}", record.name());
                handle.abort();
            }
        }
    }
}

impl TaskSpawner for LocalSetSpawner {
    fn spawn(&mut self, record: &'static TaskRecord, task: TaskFuture) -> Result<(), SpawnError> {
        if self.handles.iter().any(|(spawned, _)| core::ptr::eq(*spawned, record)) {
            return Err(SpawnError::AlreadySpawned);
        }

        log::debug!("spawning task {} (priority {})", record.name(), record.priority());
        self.handles.push((record, tokio::task::spawn_local(task)));
        Ok(())
    }
}
