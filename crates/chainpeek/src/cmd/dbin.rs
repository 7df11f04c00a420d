use std::io::{self, Write};

use chainpeek_decode::EnvelopeDecoder;
use chainpeek_frame::ContainerReader;
use chainpeek_schema::Protocol;
use tracing::debug;

use crate::cmd::{open_input, recursion_budget, Context, DbinArgs};
use crate::exit::{decode_error, format_error, io_error, CliResult, SUCCESS};
use crate::output::write_document;

pub fn run(args: DbinArgs, ctx: &Context) -> CliResult<i32> {
    let budget = recursion_budget(args.depth)?;
    let registry = ctx.registry()?;
    let input = open_input(args.input.as_deref())?;

    let mut reader =
        ContainerReader::open(input).map_err(|err| format_error("reading container", err))?;
    let protocol = Protocol::from(reader.header().content_kind);
    let decoder = EnvelopeDecoder::new(&registry);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut frames = 0u64;
    while let Some(frame) = reader
        .read_frame()
        .map_err(|err| format_error("reading container", err))?
    {
        let document = decoder
            .decode_frame(protocol, &frame.payload, budget)
            .map_err(|err| decode_error(&format!("frame at offset {}", frame.offset), err))?;
        write_document(&mut out, &document, ctx.format)?;
        frames += 1;
    }
    out.flush().map_err(|err| io_error("writing output", err))?;

    debug!(%protocol, frames, "container decoded");
    Ok(SUCCESS)
}
