//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;
use toml::{Table, Value};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load the configuration, writing the defaults first when the file does not
/// exist yet.
///
/// An existing file that lacks some default keys gets them filled in and is
/// saved back; values already present are kept as written. A file that
/// already carries every key is never rewritten.
pub fn load_or_create(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        save_config(path, &config)?;
        tracing::info!(path = %path.display(), "Wrote default configuration");
        return Ok(config);
    }

    let mut table: Table = fs::read_to_string(path)?.parse()?;
    let defaults: Table = toml::to_string(&AppConfig::default())?.parse()?;

    let config: AppConfig = if fill_defaults(&mut table, &defaults) {
        let content = toml::to_string_pretty(&table)?;
        let config = parse_config(&content)?;
        fs::write(path, content)?;
        tracing::info!(path = %path.display(), "Added missing default keys to configuration");
        config
    } else {
        let config: AppConfig = Value::Table(table).try_into()?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        config
    };
    Ok(config)
}

/// Copy every key of `defaults` missing from `table`, descending into nested
/// tables. Returns whether anything was added.
fn fill_defaults(table: &mut Table, defaults: &Table) -> bool {
    let mut changed = false;
    for (key, default) in defaults {
        match (table.get_mut(key), default) {
            (None, _) => {
                table.insert(key.clone(), default.clone());
                changed = true;
            }
            (Some(Value::Table(inner)), Value::Table(default)) => {
                changed |= fill_defaults(inner, default);
            }
            _ => {}
        }
    }
    changed
}

/// Write the configuration as TOML, creating parent directories.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
