use itemload_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; falls back to stderr.
    let target = logging::init();
    tracing::debug!(?target, "logging ready");

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        tracing::error!("{:#}", err);
        eprintln!("itemload error: {:#}", err);
        std::process::exit(1);
    }
}
