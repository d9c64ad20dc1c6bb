//! Config command implementation

use quantarax_store::config::{config_path, load_config, save_config};

use crate::cli::{ConfigArgs, ConfigCommands};

/// Execute config command
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        Some(ConfigCommands::Show) | None => show(),
        Some(ConfigCommands::Get { key }) => get(&key),
        Some(ConfigCommands::Set { key, value }) => set(&key, &value),
        Some(ConfigCommands::Reset { yes }) => reset(yes),
    }
}

fn show() -> anyhow::Result<()> {
    let config = load_config()?;
    println!("{}", toml::to_string_pretty(&config)?);
    println!("(path: {})", config_path()?.display());
    Ok(())
}

fn get(key: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let value = match key {
        "transfer.chunk_size" => config.transfer.chunk_size.to_string(),
        "transfer.download_dir" => config.transfer.download_dir.display().to_string(),
        "transfer.default_domain_profile" => {
            config.transfer.default_domain_profile.unwrap_or_else(|| "(none)".to_string())
        }
        "storage.cas_max_age_secs" => config.storage.cas_max_age_secs.to_string(),
        "storage.session_max_age_secs" => config.storage.session_max_age_secs.to_string(),
        "rate_limit.connections_per_second" => config.rate_limit.connections_per_second.to_string(),
        "rate_limit.burst" => config.rate_limit.burst.to_string(),
        other => anyhow::bail!("unknown config key '{other}'"),
    };
    println!("{value}");
    Ok(())
}

fn set(key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = load_config()?;
    match key {
        "transfer.chunk_size" => config.transfer.chunk_size = value.parse()?,
        "transfer.download_dir" => config.transfer.download_dir = value.into(),
        "transfer.default_domain_profile" => config.transfer.default_domain_profile = Some(value.to_string()),
        "storage.cas_max_age_secs" => config.storage.cas_max_age_secs = value.parse()?,
        "storage.session_max_age_secs" => config.storage.session_max_age_secs = value.parse()?,
        "rate_limit.connections_per_second" => config.rate_limit.connections_per_second = value.parse()?,
        "rate_limit.burst" => config.rate_limit.burst = value.parse()?,
        other => anyhow::bail!("unknown config key '{other}'"),
    }
    save_config(&config)?;
    crate::output::color::success(&format!("{key} set to {value}"));
    Ok(())
}

fn reset(yes: bool) -> anyhow::Result<()> {
    if !yes && !crate::output::prompts::confirm("Reset configuration to defaults?")? {
        return Ok(());
    }
    save_config(&quantarax_store::config::QuantaraXConfig::default())?;
    crate::output::color::success("Configuration reset to defaults.");
    Ok(())
}
