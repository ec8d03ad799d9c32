use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use madilink_device::{ChannelNameTable, RawChannelNameTable, LINES_PER_CHANNEL, NUM_CHANNELS};
use serde::Serialize;

use crate::exit::{io_error, CliError, CliResult, INTERNAL, USAGE};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChannelRow<'a> {
    pub channel: usize,
    pub line1: &'a str,
    pub line2: &'a str,
}

/// Rows for every channel, or only `channel` when given.
pub fn channel_rows(table: &ChannelNameTable, channel: Option<usize>) -> Vec<ChannelRow<'_>> {
    table
        .iter()
        .filter(|(index, _)| channel.is_none_or(|wanted| wanted == *index))
        .map(|(index, name)| ChannelRow {
            channel: index,
            line1: &name.line1,
            line2: &name.line2,
        })
        .collect()
}

pub fn print_names(
    table: &ChannelNameTable,
    channel: Option<usize>,
    format: OutputFormat,
) -> CliResult<()> {
    let rows = channel_rows(table, channel);
    match format {
        OutputFormat::Json => match (channel, rows.first()) {
            (Some(_), Some(row)) => print_json(row),
            _ => print_json(&rows),
        },
        OutputFormat::Table => {
            let mut out = Table::new();
            out.load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "LINE 1", "LINE 2"]);
            for row in &rows {
                out.add_row(vec![
                    row.channel.to_string(),
                    row.line1.to_string(),
                    row.line2.to_string(),
                ]);
            }
            println!("{out}");
            Ok(())
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{:>2}  {:<8}  {}", row.channel, row.line1, row.line2);
            }
            Ok(())
        }
        OutputFormat::Raw => {
            let raw = RawChannelNameTable::from(table);
            match channel {
                Some(index) => {
                    let mut records = Vec::new();
                    for line in 0..LINES_PER_CHANNEL {
                        let record = raw.record(index, line).ok_or_else(|| {
                            CliError::new(USAGE, format!("channel {index} out of range (0..{NUM_CHANNELS})"))
                        })?;
                        records.extend_from_slice(record);
                    }
                    print_raw(&records)
                }
                None => print_raw(raw.as_bytes()),
            }
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    host: &'a str,
    operation: &'a str,
    status: &'static str,
}

/// Report a completed operation that produces no data.
pub fn print_status(host: &str, operation: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&StatusOutput {
            host,
            operation,
            status: "ok",
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{operation}: ok ({host})");
            Ok(())
        }
        OutputFormat::Raw => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string(value)
        .map_err(|err| CliError::new(INTERNAL, format!("failed to encode output: {err}")))?;
    println!("{text}");
    Ok(())
}

pub fn print_raw(data: &[u8]) -> CliResult<()> {
    let mut out = std::io::stdout();
    out.write_all(data)
        .and_then(|()| out.flush())
        .map_err(|err| io_error("failed writing output", err))
}
