use madilink_device::connect_with_config;
use tracing::info;

use crate::cmd::ResetArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(args: ResetArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.config()?;
    connect_with_config(&args.connect.host, &config)
        .and_then(|mut conn| conn.reset())
        .map_err(|err| device_error("reset failed", err))?;
    info!(host = %args.connect.host, "unit reset");

    print_status(&args.connect.host, "reset", format)?;
    Ok(SUCCESS)
}
