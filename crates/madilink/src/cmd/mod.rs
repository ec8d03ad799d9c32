use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use madilink_device::ConnectionConfig;
use madilink_frame::ProtocolRevision;
use madilink_transport::DEFAULT_PORT;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod names;
pub mod reset;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read or write channel names.
    #[command(subcommand)]
    Names(NamesCommand),
    /// Reset the unit.
    Reset(ResetArgs),
    /// Show version information.
    Version(VersionArgs),
}

#[derive(Subcommand, Debug)]
pub enum NamesCommand {
    /// Print the channel name table.
    Get(NamesGetArgs),
    /// Rename one channel, keeping the others.
    Set(NamesSetArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Names(NamesCommand::Get(args)) => names::get(args, format),
        Command::Names(NamesCommand::Set(args)) => names::set(args, format),
        Command::Reset(args) => reset::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Revision {
    /// Older firmware (DISCONNECT is 0x0004).
    V1,
    /// Current firmware (DISCONNECT is 0x0017).
    V2,
}

impl From<Revision> for ProtocolRevision {
    fn from(revision: Revision) -> Self {
        match revision {
            Revision::V1 => ProtocolRevision::V1,
            Revision::V2 => ProtocolRevision::V2,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Device host name or IP address.
    #[arg(env = "MADILINK_HOST")]
    pub host: String,
    /// Control port.
    #[arg(long, env = "MADILINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Dial and per-response timeout (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
    /// Protocol revision of the device firmware.
    #[arg(long, value_name = "REV", default_value = "v2")]
    pub revision: Revision,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<ConnectionConfig> {
        let timeout = parse_duration(&self.timeout)?;
        Ok(ConnectionConfig {
            port: self.port,
            connect_timeout: Some(timeout),
            read_timeout: timeout,
            write_timeout: Some(timeout),
            revision: self.revision.into(),
        })
    }
}

#[derive(Args, Debug)]
pub struct NamesGetArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Print only this channel (0-63).
    #[arg(long, short = 'c', value_parser = clap::value_parser!(u8).range(0..64))]
    pub channel: Option<u8>,
}

#[derive(Args, Debug)]
pub struct NamesSetArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Channel to rename (0-63).
    #[arg(long, short = 'c', value_parser = clap::value_parser!(u8).range(0..64))]
    pub channel: u8,
    /// First name line (at most 8 bytes are stored).
    #[arg(long)]
    pub line1: String,
    /// Second name line (at most 8 bytes are stored).
    #[arg(long, default_value = "")]
    pub line2: String,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
