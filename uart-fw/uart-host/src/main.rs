//! Host emulator for the UART console firmware
//!
//! Runs the serial output task, the serial input task and the terminal on a
//! single-threaded tokio `LocalSet`. Stdout stands in for the UART
//! transmitter, stdin for the receiver, and the input queue is served by the
//! echo processor.

mod args;
mod config;
mod spawner;
mod stdio;

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Notify;
use tokio::task::LocalSet;
use uart_core::ipc::Outcome;
use uart_core::serial::EchoProcessor;
use uart_core::task::TaskSpawner;
use uart_core::{MessageQueue, Serial, SerialConsole, TaskRecord, Terminal};

use args::HostArgs;
use config::HostConfig;
use spawner::LocalSetSpawner;
use stdio::{StdinSource, StdoutSink};

fn main() -> Result<()> {
    let args = HostArgs::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    let mut config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    if args.no_clear {
        config.serial.clear_on_start = false;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    // Firmware tasks are not Send; everything runs on one LocalSet
    let local_set = LocalSet::new();
    let result = runtime.block_on(local_set.run_until(run(config, args.send)));

    // The stdin reader may still sit in a blocking read
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run(config: HostConfig, commands: Vec<String>) -> Result<()> {
    let HostConfig { serial, terminal } = config;

    let serial: &'static Serial = Box::leak(Box::new(Serial::new(serial)));
    let mut spawner = LocalSetSpawner::new();
    serial
        .init(&mut spawner, StdoutSink::new(), EchoProcessor)
        .context("Failed to initialize serial subsystem")?;

    let eof = Rc::new(Notify::new());
    let console = SerialConsole::new(serial.out_queue(), StdinSource::new(Rc::clone(&eof)));
    let record: &'static TaskRecord = Box::leak(Box::new(terminal.task_record()));
    let terminal = Terminal::new(console, terminal);
    spawner
        .spawn(record, terminal.into_task(record))
        .with_context(|| format!("Failed to spawn task {}", record.name()))?;

    for command in commands {
        send_command(serial.in_queue(), command).await?;
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            log::info!("interrupted");
        }
        () = eof.notified() => log::info!("end of input"),
    }

    drain(serial.out_queue()).await;
    serial.shutdown();
    serial.join().await;
    spawner.abort_all();
    log::info!("serial tasks stopped");
    Ok(())
}

/// Send one command request to the input queue and log its outcome
async fn send_command(queue: &'static MessageQueue, text: String) -> Result<()> {
    let outcome = queue
        .call(text.clone().into_bytes())
        .await
        .with_context(|| format!("Failed to send command {text:?}"))?;

    match outcome {
        Outcome::Reply(reply) => log::info!(
            "command {text:?}: status {} reply {:?}",
            reply.status,
            String::from_utf8_lossy(&reply.payload)
        ),
        Outcome::Error(err) => log::warn!("command {text:?}: error {} ({})", err.code, err.aux),
        Outcome::Abandoned => log::warn!("command {text:?}: abandoned"),
    }
    Ok(())
}

/// Let the output task write everything that is still queued
async fn drain(queue: &MessageQueue) {
    while !queue.is_empty() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
