use std::io::{self, Read};

use chainpeek_decode::EnvelopeDecoder;

use crate::cmd::{open_input, recursion_budget, Context, PbArgs};
use crate::exit::{decode_error, io_error, schema_error, CliResult, SUCCESS};
use crate::output::write_document;

pub fn run(args: PbArgs, ctx: &Context) -> CliResult<i32> {
    let budget = recursion_budget(args.depth)?;
    let registry = ctx.registry()?;
    let descriptor = registry
        .find_message(&args.type_name)
        .map_err(|err| schema_error("resolving --type", err))?;

    let mut bytes = Vec::new();
    open_input(args.input.as_deref())?
        .read_to_end(&mut bytes)
        .map_err(|err| io_error("reading input", err))?;

    let document = EnvelopeDecoder::new(&registry)
        .decode(args.protocol, &descriptor, &bytes, budget)
        .map_err(|err| decode_error(descriptor.full_name(), err))?;
    write_document(&mut io::stdout().lock(), &document, ctx.format)?;
    Ok(SUCCESS)
}
