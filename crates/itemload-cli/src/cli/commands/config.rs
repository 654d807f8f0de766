//! `itemload config` – show where settings live and what they resolve to.

use anyhow::Result;
use itemload_core::{config, logging};

pub fn run_config() -> Result<()> {
    let path = config::config_path()?;
    let cfg = config::load_or_init()?;
    println!("config file: {}", path.display());
    if let Ok(log) = logging::log_file_path() {
        println!("log file:    {}", log.display());
    }
    println!();
    print!("{}", cfg.to_toml_string()?);
    Ok(())
}
