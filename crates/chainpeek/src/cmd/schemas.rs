use std::io;

use crate::cmd::{Context, SchemasArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::write_entries;

pub fn run(args: SchemasArgs, ctx: &Context) -> CliResult<i32> {
    let registry = ctx.registry()?;
    let entries: Vec<_> = registry
        .entries()
        .into_iter()
        .filter(|entry| {
            args.protocol
                .is_none_or(|protocol| entry.protocol == protocol.as_str())
        })
        .collect();

    write_entries(&mut io::stdout().lock(), &entries, ctx.format)?;
    Ok(SUCCESS)
}
