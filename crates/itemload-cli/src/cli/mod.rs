//! CLI for the itemload content loader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use itemload_core::config::{self, LoaderConfig};
use itemload_core::ContentLoader;

use commands::{run_completions, run_config, run_get};

/// Top-level CLI for itemload.
#[derive(Debug, Parser)]
#[command(name = "itemload")]
#[command(about = "itemload: fetch a CSV or spreadsheet by URL and print its items", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a file and print its items, one per line.
    Get {
        /// HTTP/HTTPS URL of a CSV or spreadsheet file.
        url: String,
        /// Maximum number of items accepted (overrides config item_limit).
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        /// Whole-request timeout in seconds (overrides config timeout_secs).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Show the config file location and effective settings.
    Config,

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                url,
                limit,
                timeout,
            } => {
                let cfg = apply_overrides(config::load_or_init()?, limit, timeout);
                tracing::debug!("effective config: {:?}", cfg);
                let loader = ContentLoader::from_config(&cfg);
                let mut stdout = std::io::stdout().lock();
                run_get(loader, &url, &mut stdout).await?;
            }
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

/// Command-line flags win over the config file.
fn apply_overrides(
    mut cfg: LoaderConfig,
    limit: Option<usize>,
    timeout: Option<u64>,
) -> LoaderConfig {
    if let Some(limit) = limit {
        cfg.item_limit = limit;
    }
    if timeout.is_some() {
        cfg.timeout_secs = timeout;
    }
    cfg
}

#[cfg(test)]
mod tests;
