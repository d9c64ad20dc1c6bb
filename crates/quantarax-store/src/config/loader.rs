//! Configuration file loading and saving

use std::path::PathBuf;

use super::QuantaraXConfig;
use crate::{persistence, Result};

/// Default configuration file path, `<config>/quantarax/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    persistence::config_file()
}

/// Load configuration from `config_path()`, falling back to defaults if no
/// file exists yet.
pub fn load_config() -> Result<QuantaraXConfig> {
    let path = config_path()?;
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(QuantaraXConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Persist `config` to `config_path()`, creating parent directories as
/// needed.
pub fn save_config(config: &QuantaraXConfig) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = QuantaraXConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let restored: QuantaraXConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(restored.rate_limit.connections_per_second, config.rate_limit.connections_per_second);
    }
}
