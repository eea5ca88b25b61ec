//! Terminal dispatcher
//!
//! An interactive command loop: print a prompt, read one line, split off the
//! command name and run the matching handler from a static command table.
//! Unlike the serial tasks it does not own a message queue; it talks to the
//! user through a [`FormattedIo`] implementation and runs until the executor
//! stops polling it.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

pub mod commands;
pub mod parser;

pub use commands::{COMMANDS, Command, CommandError, CommandLookup, Handler, MAX_NAME_LEN, echo};
pub use parser::split_command;

use crate::config::TerminalConfig;
use crate::io::FormattedIo;
use crate::task::{TaskFuture, TaskRecord};

/// What one terminal iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A command ran to completion
    Executed,
    /// A command ran and reported an error
    CommandFailed(CommandError),
    /// No command matched; a diagnostic was printed
    UnknownCommand,
    /// Blank line, or a line that is not valid UTF-8
    Empty,
    /// The line read failed; nothing was printed
    ReadFailed,
}

pub struct Terminal<IO> {
    io: IO,
    commands: &'static [Command],
    config: TerminalConfig,
    line: Vec<u8>,
}

impl<IO: FormattedIo> Terminal<IO> {
    /// Terminal serving the built-in [`COMMANDS`] table
    pub fn new(io: IO, config: TerminalConfig) -> Self {
        Self::with_commands(io, &COMMANDS, config)
    }

    pub fn with_commands(io: IO, commands: &'static [Command], config: TerminalConfig) -> Self {
        let line = Vec::with_capacity(config.line_capacity);
        Self {
            io,
            commands,
            config,
            line,
        }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Run one prompt / read / dispatch iteration.
    ///
    /// Lines longer than the configured capacity are cut; the remainder is
    /// read as the next line. A character split by the cut is left out.
    pub async fn step(&mut self) -> Dispatch {
        if let Err(err) = self.io.print(format_args!("{}", self.config.prompt)).await {
            log::debug!("{}: prompt not printed: {err}", self.config.name);
        }

        self.line.clear();
        self.line.resize(self.config.line_capacity, 0);
        let len = match self.io.getline(&mut self.line).await {
            Ok(len) => len,
            Err(err) => {
                log::debug!("{}: read failed: {err}", self.config.name);
                return Dispatch::ReadFailed;
            }
        };

        let len = match core::str::from_utf8(&self.line[..len]) {
            Ok(_) => len,
            // Cut at the capacity limit in the middle of a character
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => {
                log::debug!("{}: dropped non UTF-8 line", self.config.name);
                return Dispatch::Empty;
            }
        };
        let Ok(line) = core::str::from_utf8_mut(&mut self.line[..len]) else {
            return Dispatch::Empty;
        };
        let Some((name, args)) = split_command(line) else {
            return Dispatch::Empty;
        };

        let Some(command) = self.commands.find(name) else {
            let printed = self
                .io
                .print(format_args!("{}: {}: unknown command\n\r", self.config.name, name))
                .await;
            if let Err(err) = printed {
                log::debug!("{}: diagnostic not printed: {err}", self.config.name);
            }
            return Dispatch::UnknownCommand;
        };

        log::trace!("{}: running {}", self.config.name, command.name());
        let mut output = String::new();
        let result = command.run(args, &mut output);
        if !output.is_empty() {
            if let Err(err) = self.io.print(format_args!("{output}")).await {
                log::debug!("{}: output of {} lost: {err}", self.config.name, command.name());
            }
        }

        match result {
            Ok(()) => Dispatch::Executed,
            Err(err) => {
                log::debug!("{}: {} failed: {err}", self.config.name, command.name());
                Dispatch::CommandFailed(err)
            }
        }
    }

    /// Run iterations forever; read failures are retried
    pub async fn run(&mut self) {
        loop {
            self.step().await;
        }
    }

    /// Wrap the run loop in the supervision protocol of `record`
    pub fn into_task(mut self, record: &'static TaskRecord) -> TaskFuture
    where
        IO: 'static,
    {
        Box::pin(async move { record.supervise(self.run()).await })
    }
}
