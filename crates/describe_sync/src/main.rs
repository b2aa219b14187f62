use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use describe_sync::config::CliArgs;
use describe_sync::logging::init_logging;

fn main() -> ExitCode {
    let cli = CliArgs::parse();
    if let Err(err) = init_logging(cli.log_format) {
        eprintln!("describe-sync: logging disabled: {err}");
    }

    let result = describe_sync::run(cli);
    if let Err(err) = &result {
        error!(error = %err, "Run aborted");
        eprintln!("describe-sync failed: {err}");
    }
    ExitCode::from(describe_sync::exit_status(&result))
}
