use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("chainpeek {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: chainpeek");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("build_target: {}", env!("CHAINPEEK_BUILD_TARGET"));
    println!(
        "build_profile: {}",
        option_env!("CHAINPEEK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("container_format: dbin v{}", chainpeek_frame::FORMAT_VERSION);
    println!(
        "content_kinds: {}",
        chainpeek_frame::ContentKind::ALL
            .iter()
            .map(|kind| kind.code())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("features: rows={}, cli=true", cfg!(feature = "rows"));

    Ok(SUCCESS)
}
