//! Validate configuration command.

use anyhow::Result;
use fundwatch_config::load_config;
use std::path::Path;

pub fn run(config_path: &Path, required: bool) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path, required) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Data directory: {}", config.data.data_dir.display());
    println!("Workers: {}", config.scheduler.pool_size);
    println!(
        "Publication cutoff: {} (UTC{:+})",
        config.sync.cutoff, config.sync.utc_offset_hours
    );
    println!();
    println!("Effective configuration:");
    println!("{}", config.to_toml()?);

    Ok(())
}
