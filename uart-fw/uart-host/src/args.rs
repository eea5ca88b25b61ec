use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Run the UART console firmware on the host, wired to stdin/stdout
#[derive(Debug, Parser)]
#[command(name = "uart-host", version)]
pub struct HostArgs {
    /// JSON configuration file; missing fields use defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level for messages on stderr (RUST_LOG overrides per module)
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Do not clear the terminal when the output task starts
    #[arg(long)]
    pub no_clear: bool,

    /// Send this text as a command request to the serial input queue at
    /// startup and log the reply (repeatable)
    #[arg(long)]
    pub send: Vec<String>,
}
