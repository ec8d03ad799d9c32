mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "madilink", version, about = "MADI interface control CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{NamesCommand, Revision};

    #[test]
    fn parses_names_get() {
        let cli = Cli::try_parse_from([
            "madilink",
            "--format",
            "json",
            "names",
            "get",
            "10.0.0.20",
            "--channel",
            "6",
        ])
        .expect("names get should parse");

        let Command::Names(NamesCommand::Get(args)) = cli.command else {
            panic!("expected names get");
        };
        assert_eq!(args.connect.host, "10.0.0.20");
        assert_eq!(args.channel, Some(6));
        assert_eq!(args.connect.revision, Revision::V2);
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn names_set_requires_channel_and_line1() {
        let err = Cli::try_parse_from(["madilink", "names", "set", "10.0.0.20", "--line1", "VOX"])
            .expect_err("missing channel should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from([
            "madilink",
            "names",
            "set",
            "10.0.0.20",
            "--channel",
            "3",
            "--line1",
            "VOX",
            "--revision",
            "v1",
        ])
        .expect("names set should parse");
        let Command::Names(NamesCommand::Set(args)) = cli.command else {
            panic!("expected names set");
        };
        assert_eq!(args.line2, "");
        assert_eq!(args.connect.revision, Revision::V1);
    }

    #[test]
    fn rejects_channel_out_of_range() {
        let err = Cli::try_parse_from(["madilink", "names", "get", "10.0.0.20", "--channel", "64"])
            .expect_err("channel 64 does not exist");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_reset_with_port() {
        let cli = Cli::try_parse_from(["madilink", "reset", "10.0.0.20", "--port", "9000"])
            .expect("reset should parse");
        let Command::Reset(args) = cli.command else {
            panic!("expected reset");
        };
        assert_eq!(args.connect.port, 9000);
    }
}
