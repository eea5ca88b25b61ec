//! Serial subsystem
//!
//! Two consumer tasks built on [`MessageQueue`]:
//!
//! - `serial-out` writes posted byte buffers to the character sink.
//! - `serial-in` runs command requests through a [`CommandProcessor`] and
//!   replies in place.
//!
//! [`Serial`] is the initialization context holding both queues and task
//! records. Create it once (typically leaked to `'static`), call
//! [`Serial::init`], then hand [`Serial::out_queue`] / [`Serial::in_queue`]
//! to whoever needs to talk to the tasks.

use core::fmt;

pub mod input;
pub mod output;

pub use input::{CommandProcessor, EchoProcessor, ProcessError, SerialInTask};
pub use output::{CLEAR_SCREEN, CharSink, SerialOutTask};

use crate::config::SerialConfig;
use crate::ipc::MessageQueue;
use crate::task::{SpawnError, TaskRecord, TaskSpawner};

/// Error returned by subsystem initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// A task could not be created
    Spawn {
        task: &'static str,
        source: SpawnError,
    },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Spawn { task, source } => {
                write!(f, "Failed to spawn task {task}: {source}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::Spawn { source, .. } => Some(source),
        }
    }
}

/// Serial subsystem context: both queues and both task records
pub struct Serial {
    out_queue: MessageQueue,
    in_queue: MessageQueue,
    out_task: TaskRecord,
    in_task: TaskRecord,
    config: SerialConfig,
}

impl Serial {
    pub fn new(config: SerialConfig) -> Self {
        Self {
            out_queue: MessageQueue::new(),
            in_queue: MessageQueue::new(),
            out_task: TaskRecord::new("serial-out", config.priority, config.stack_size),
            in_task: TaskRecord::new("serial-in", config.priority, config.stack_size),
            config,
        }
    }

    /// Spawn the output task, then the input task.
    ///
    /// Stops at the first failure and reports it. Nothing is rolled back: a
    /// half-initialized serial subsystem is fatal for the caller.
    pub fn init<T, S, P>(
        &'static self,
        spawner: &mut T,
        sink: S,
        processor: P,
    ) -> Result<(), InitError>
    where
        T: TaskSpawner + ?Sized,
        S: CharSink + 'static,
        P: CommandProcessor + 'static,
    {
        let out = SerialOutTask::new(&self.out_queue, sink, self.config.clear_on_start);
        spawner
            .spawn(&self.out_task, out.into_task(&self.out_task))
            .map_err(|source| InitError::Spawn {
                task: self.out_task.name(),
                source,
            })?;

        let input = SerialInTask::new(&self.in_queue, processor);
        spawner
            .spawn(&self.in_task, input.into_task(&self.in_task))
            .map_err(|source| InitError::Spawn {
                task: self.in_task.name(),
                source,
            })?;

        log::info!("serial subsystem initialized");
        Ok(())
    }

    /// Queue of the output task: post bytes here to print them
    pub fn out_queue(&self) -> &MessageQueue {
        &self.out_queue
    }

    /// Queue of the input task: send command requests here
    pub fn in_queue(&self) -> &MessageQueue {
        &self.in_queue
    }

    pub fn out_task(&self) -> &TaskRecord {
        &self.out_task
    }

    pub fn in_task(&self) -> &TaskRecord {
        &self.in_task
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Tear down both queues; the tasks exit at the top of their next loop
    pub fn shutdown(&self) {
        self.out_queue.teardown();
        self.in_queue.teardown();
    }

    /// Wait until both tasks reached their terminal state
    pub async fn join(&self) {
        self.out_task.join().await;
        self.in_task.join().await;
    }
}
