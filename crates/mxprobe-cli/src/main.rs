use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mxprobe_core::CONFIG_FILE;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mxprobe")]
#[command(version, about = "MX Bikes in-process memory probe")]
struct Cli {
    /// Config file with engine settings and offsets
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List memory regions of this process
    Regions {
        /// Include regions a pattern scan would skip
        #[arg(short, long)]
        all: bool,
        /// Minimum region size in bytes
        #[arg(long, default_value_t = 1)]
        min_size: u64,
    },
    /// Search memory for a byte pattern and read the string next to it
    Scan {
        /// Pattern as hex bytes, e.g. "FF FF C0 A8 01 0A"
        pattern: String,
        /// Distance from the match start to the string
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
        /// Bytes to read at the string
        #[arg(short, long, default_value_t = 64)]
        size: usize,
        /// Output the scan report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump raw bytes
    Hexdump {
        /// Address in hex
        address: String,
        /// Bytes to dump
        #[arg(short, long, default_value_t = 256)]
        size: usize,
        /// Treat the address as an offset from the module base
        #[arg(short, long)]
        relative: bool,
        /// Show the ASCII column
        #[arg(long)]
        ascii: bool,
    },
    /// Run the candidate validity check on hex bytes
    Check {
        /// Bytes as hex, e.g. "53 45 52 56 45 52 00 00"
        bytes: String,
    },
    /// Decode a socket record given as hex
    Sockaddr {
        /// 28 bytes as hex
        bytes: String,
    },
    /// Show the current connection role and server details
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Poll ping and client count until interrupted
    Watch {
        /// Refresh interval in milliseconds
        #[arg(short, long, default_value_t = 1000)]
        interval: u64,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the default config
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mxprobe=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Regions { all, min_size } => commands::regions::run(&cli.config, all, min_size),
        Command::Scan {
            pattern,
            offset,
            size,
            json,
        } => commands::scan::run(&cli.config, &pattern, offset, size, json),
        Command::Hexdump {
            address,
            size,
            relative,
            ascii,
        } => commands::hexdump::run(&cli.config, &address, size, relative, ascii),
        Command::Check { bytes } => commands::check::run(&bytes),
        Command::Sockaddr { bytes } => commands::sockaddr::run(&bytes),
        Command::Status { json } => commands::status::run(&cli.config, json),
        Command::Watch { interval } => commands::watch::run(&cli.config, interval),
        Command::Config { action } => match action {
            ConfigAction::Show { json } => commands::config::show(&cli.config, json),
            ConfigAction::Init { force } => commands::config::init(&cli.config, force),
        },
    }
}
