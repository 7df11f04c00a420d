use std::io;

use chainpeek_rows::{ProjectionOptions, Row, RowProjector, RowSource};
use serde_json::Value;

use crate::cmd::rows::{cell_filter, load_dump};
use crate::cmd::{recursion_budget, Context, GetArgs};
use crate::exit::{project_error, store_error, CliResult, SUCCESS};
use crate::output::write_document;

pub fn run(args: GetArgs, ctx: &Context) -> CliResult<i32> {
    let options = ProjectionOptions {
        depth: recursion_budget(args.depth)?.remaining(),
        include_timestamp: args.with_timestamp,
    };
    let filter = cell_filter(args.all_versions, None, None)?;
    let registry = ctx.registry()?;
    let source = load_dump(&args.dump)?;

    let row = source
        .read_row(&args.key)
        .map_err(|err| store_error("reading row", err))?;
    let row = Row::new(row.key, filter.apply(&row.cells));

    let record = RowProjector::new(&registry, args.protocol, options)
        .project(&row)
        .map_err(|err| project_error("projecting row", err))?;
    write_document(&mut io::stdout().lock(), &Value::Object(record), ctx.format)?;
    Ok(SUCCESS)
}
