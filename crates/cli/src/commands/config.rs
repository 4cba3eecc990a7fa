//! `repochat config`: print the effective configuration.

use repochat_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(None, None)?;

    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    if config.api_key.is_some() {
        println!("# api_key is set (hidden)");
    }
    print!("{}", config.to_toml());
    Ok(())
}
