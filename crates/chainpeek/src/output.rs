use std::io::{IsTerminal, Write};

use chainpeek_schema::RegistryEntry;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::Value;

use crate::exit::{io_error, CliResult};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON document per line.
    Json,
    /// Indented JSON; a table for listings.
    Table,
    /// Indented JSON; aligned text for listings.
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Write one rendered document followed by a newline.
pub fn write_document<W: Write>(
    out: &mut W,
    document: &Value,
    format: OutputFormat,
) -> CliResult<()> {
    let written = match format {
        OutputFormat::Json => serde_json::to_writer(&mut *out, document),
        OutputFormat::Table | OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut *out, document)
        }
    };
    written
        .map_err(std::io::Error::from)
        .and_then(|()| out.write_all(b"\n"))
        .map_err(|err| io_error("writing output", err))
}

pub fn write_entries<W: Write>(
    out: &mut W,
    entries: &[RegistryEntry],
    format: OutputFormat,
) -> CliResult<()> {
    let written = match format {
        OutputFormat::Json => entries.iter().try_for_each(|entry| {
            serde_json::to_writer(&mut *out, entry)
                .map_err(std::io::Error::from)
                .and_then(|()| out.write_all(b"\n"))
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PROTOCOL", "SELECTOR", "NAME", "MESSAGE"]);
            for entry in entries {
                table.add_row(vec![
                    entry.protocol,
                    entry.selector_kind,
                    entry.selector.as_str(),
                    entry.message.as_str(),
                ]);
            }
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => entries.iter().try_for_each(|entry| {
            writeln!(
                out,
                "{:<4} {:<12} {:<24} {}",
                entry.protocol, entry.selector_kind, entry.selector, entry.message
            )
        }),
    };
    written.map_err(|err| io_error("writing output", err))
}
