use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use chainpeek_decode::RecursionBudget;
use chainpeek_schema::{Protocol, RegistryBuilder, SchemaRegistry};
use chrono::DateTime;
use clap::{Args, Subcommand};

use crate::exit::{decode_error, io_error, schema_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod dbin;
pub mod get;
pub mod pb;
pub mod rows;
pub mod schemas;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode every frame of a dbin block container.
    Dbin(DbinArgs),
    /// Decode one standalone protobuf record.
    Pb(PbArgs),
    /// Project a range of rows from a row dump.
    Rows(RowsArgs),
    /// Project a single row from a row dump.
    Get(GetArgs),
    /// List payload-kind and column mappings.
    Schemas(SchemasArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every subcommand.
#[derive(Debug)]
pub struct Context {
    pub format: OutputFormat,
    pub descriptor_set: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
}

impl Context {
    /// The built-in registry extended with `--descriptor-set` and `--mapping`.
    pub fn registry(&self) -> CliResult<SchemaRegistry> {
        let mut builder = RegistryBuilder::builtin()
            .map_err(|err| schema_error("loading built-in schemas", err))?;
        if let Some(path) = &self.descriptor_set {
            builder
                .load_descriptor_set(path)
                .map_err(|err| schema_error(&format!("loading {}", path.display()), err))?;
        }
        if let Some(path) = &self.mapping {
            builder
                .load_mapping_file(path)
                .map_err(|err| schema_error(&format!("loading {}", path.display()), err))?;
        }
        Ok(builder.build())
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Dbin(args) => dbin::run(args, ctx),
        Command::Pb(args) => pb::run(args, ctx),
        Command::Rows(args) => rows::run(args, ctx),
        Command::Get(args) => get::run(args, ctx),
        Command::Schemas(args) => schemas::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DbinArgs {
    /// Container file. '-' or absent reads stdin.
    pub input: Option<PathBuf>,
    /// Envelope layers to expand. 0 renders only the frame records.
    #[arg(long, short = 'd', default_value_t = 1, allow_negative_numbers = true)]
    pub depth: i64,
}

#[derive(Args, Debug)]
pub struct PbArgs {
    /// Record file. '-' or absent reads stdin.
    pub input: Option<PathBuf>,
    /// Message type: a full name, or a fragment matching exactly one type.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub type_name: String,
    /// Protocol used to resolve nested payload kinds.
    #[arg(long, short = 'p', value_parser = parse_protocol)]
    pub protocol: Protocol,
    /// Envelope layers to expand.
    #[arg(long, short = 'd', default_value_t = 1, allow_negative_numbers = true)]
    pub depth: i64,
}

#[derive(Args, Debug)]
pub struct RowsArgs {
    /// JSON-lines row dump.
    pub dump: PathBuf,
    /// Protocol used to resolve column schemas.
    #[arg(long, short = 'p', value_parser = parse_protocol)]
    pub protocol: Protocol,
    /// Only rows whose key starts with this prefix.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub prefix: Option<String>,
    /// First row key of the scan (inclusive).
    #[arg(long)]
    pub start: Option<String>,
    /// Row key ending the scan (exclusive).
    #[arg(long)]
    pub end: Option<String>,
    /// Maximum number of rows. 0 is unlimited.
    #[arg(long, short = 'l', default_value_t = 100)]
    pub limit: usize,
    /// Decoding depth. 0 leaves every cell raw.
    #[arg(long, short = 'd', default_value_t = 1, allow_negative_numbers = true)]
    pub depth: i64,
    /// Keep every cell version instead of only the newest per column.
    #[arg(long)]
    pub all_versions: bool,
    /// Oldest cell timestamp to keep (ms since epoch or RFC 3339).
    #[arg(long, value_name = "TIME")]
    pub start_time: Option<String>,
    /// Cell timestamp to stop before (ms since epoch or RFC 3339).
    #[arg(long, value_name = "TIME")]
    pub end_time: Option<String>,
    /// Add the newest cell timestamp to each record.
    #[arg(long)]
    pub with_timestamp: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// JSON-lines row dump.
    pub dump: PathBuf,
    /// Row key.
    pub key: String,
    /// Protocol used to resolve column schemas.
    #[arg(long, short = 'p', value_parser = parse_protocol)]
    pub protocol: Protocol,
    /// Decoding depth. 0 leaves every cell raw.
    #[arg(long, short = 'd', default_value_t = 1, allow_negative_numbers = true)]
    pub depth: i64,
    /// Keep every cell version instead of only the newest per column.
    #[arg(long)]
    pub all_versions: bool,
    /// Add the newest cell timestamp to the record.
    #[arg(long)]
    pub with_timestamp: bool,
}

#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Only list mappings of this protocol.
    #[arg(long, short = 'p', value_parser = parse_protocol)]
    pub protocol: Option<Protocol>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_protocol(input: &str) -> Result<Protocol, String> {
    input.parse().map_err(|err| format!("{err}"))
}

pub(crate) fn recursion_budget(depth: i64) -> CliResult<RecursionBudget> {
    RecursionBudget::try_from(depth).map_err(|err| decode_error("--depth", err))
}

/// Open `path` for reading; `None` or `-` is stdin.
pub(crate) fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(path) if path.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(path) => File::open(path)
            .map(|file| Box::new(BufReader::new(file)) as Box<dyn Read>)
            .map_err(|err| io_error(&format!("opening {}", path.display()), err)),
    }
}

/// Parse milliseconds since the epoch or an RFC 3339 time into microseconds.
pub(crate) fn parse_timestamp(input: &str) -> CliResult<i64> {
    let input = input.trim();
    if let Ok(millis) = input.parse::<i64>() {
        return millis
            .checked_mul(1_000)
            .ok_or_else(|| CliError::new(USAGE, format!("timestamp out of range: {input}")));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|time| time.timestamp_micros())
        .map_err(|err| CliError::new(USAGE, format!("invalid timestamp {input:?}: {err}")))
}
