use madilink_device::RAW_TABLE_SIZE;
use madilink_frame::ProtocolRevision;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("madilink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let revision = ProtocolRevision::default();
    println!("name: madilink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("MADILINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("MADILINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "protocol: {revision:?} (disconnect {:#06X})",
        revision.disconnect_opcode()
    );
    println!("name_table_bytes: {RAW_TABLE_SIZE}");

    Ok(SUCCESS)
}
