use madilink_device::{connect_with_config, rename_channel, NAME_LEN};
use tracing::{info, warn};

use crate::cmd::{NamesGetArgs, NamesSetArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_names, OutputFormat};

pub fn get(args: NamesGetArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.config()?;
    let table = connect_with_config(&args.connect.host, &config)
        .and_then(|mut conn| conn.get_channel_names())
        .map_err(|err| device_error("get channel names failed", err))?;

    print_names(&table, args.channel.map(usize::from), format)?;
    Ok(SUCCESS)
}

pub fn set(args: NamesSetArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.connect.config()?;
    let channel = usize::from(args.channel);
    for (flag, line) in [("line1", &args.line1), ("line2", &args.line2)] {
        if !line.is_ascii() {
            warn!(
                channel = channel,
                line = flag,
                "non-ASCII name may not display on the unit"
            );
        }
        if line.len() > NAME_LEN {
            warn!(
                channel = channel,
                line = flag,
                len = line.len(),
                "name longer than {NAME_LEN} bytes will be truncated"
            );
        }
    }

    let written = rename_channel(
        &args.connect.host,
        &config,
        channel,
        &args.line1,
        &args.line2,
    )
    .map_err(|err| device_error("set channel names failed", err))?;
    info!(host = %args.connect.host, channel = channel, "channel renamed");

    print_names(&written, Some(channel), format)?;
    Ok(SUCCESS)
}
