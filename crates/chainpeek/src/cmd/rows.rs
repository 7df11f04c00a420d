use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use chainpeek_rows::{
    CellFilter, KeyRange, MemoryRowSource, ProjectionOptions, ReadRequest, RowProjector,
    RowSource, TimeRange,
};
use serde_json::Value;
use tracing::debug;

use crate::cmd::{parse_timestamp, recursion_budget, Context, RowsArgs};
use crate::exit::{io_error, project_error, store_error, CliResult, SUCCESS};
use crate::output::write_document;

pub fn run(args: RowsArgs, ctx: &Context) -> CliResult<i32> {
    let options = ProjectionOptions {
        depth: recursion_budget(args.depth)?.remaining(),
        include_timestamp: args.with_timestamp,
    };
    let request = ReadRequest {
        range: key_range(&args),
        limit: (args.limit != 0).then_some(args.limit),
        filter: cell_filter(
            args.all_versions,
            args.start_time.as_deref(),
            args.end_time.as_deref(),
        )?,
    };
    let registry = ctx.registry()?;
    let source = load_dump(&args.dump)?;
    let projector = RowProjector::new(&registry, args.protocol, options);

    let rows = source
        .read_rows(&request)
        .map_err(|err| store_error("reading rows", err))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    for record in projector.project_rows(rows) {
        let record = record.map_err(|err| project_error("projecting rows", err))?;
        write_document(&mut out, &Value::Object(record), ctx.format)?;
        count += 1;
    }
    out.flush().map_err(|err| io_error("writing output", err))?;

    debug!(rows = count, "scan complete");
    Ok(SUCCESS)
}

fn key_range(args: &RowsArgs) -> KeyRange {
    match (&args.prefix, &args.start, &args.end) {
        (Some(prefix), _, _) => KeyRange::Prefix(prefix.clone()),
        (None, None, None) => KeyRange::All,
        (None, start, end) => KeyRange::Range {
            start: start.clone().unwrap_or_default(),
            end: end.clone().unwrap_or_default(),
        },
    }
}

pub(crate) fn cell_filter(
    all_versions: bool,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> CliResult<CellFilter> {
    let mut filter = if all_versions {
        CellFilter::all_versions()
    } else {
        CellFilter::default()
    };
    if start_time.is_some() || end_time.is_some() {
        let range = TimeRange::new(
            start_time.map(parse_timestamp).transpose()?,
            end_time.map(parse_timestamp).transpose()?,
        );
        filter = filter.with_time_range(range);
    }
    Ok(filter)
}

pub(crate) fn load_dump(path: &Path) -> CliResult<MemoryRowSource> {
    let file = File::open(path)
        .map_err(|err| io_error(&format!("opening {}", path.display()), err))?;
    MemoryRowSource::from_dump(BufReader::new(file))
        .map_err(|err| store_error(&format!("loading {}", path.display()), err))
}
