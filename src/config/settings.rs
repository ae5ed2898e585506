use anyhow::Result;
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::EngineConfig;

const APP_NAME: &str = "CaseArchive";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "casearchive", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

fn resolve_config_directory(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the engine configuration from `dir` (or the platform default).
///
/// A missing file produces and saves the default configuration. A file that
/// cannot be parsed is migrated field by field, and if that fails too the
/// defaults are used so that a corrupt file never prevents startup.
pub fn load_config(dir: Option<&Path>) -> Result<EngineConfig> {
    let config_path = resolve_config_directory(dir)?.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = EngineConfig::default();
        save_config(&default_config, dir)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<EngineConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|_| Ok(EngineConfig::default()))
        }
    }
}

/// Fills fields missing from an older config file with their defaults.
fn migrate_legacy_config(config_content: &str) -> Result<EngineConfig> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Config is not a JSON object"))?;

    let defaults = serde_json::to_value(EngineConfig::default())?;
    if let Value::Object(default_fields) = defaults {
        for (key, default_val) in default_fields {
            if !obj.contains_key(&key) || obj.get(&key) == Some(&Value::Null) {
                obj.insert(key, default_val);
            }
        }
    }

    let migrated_config: EngineConfig = serde_json::from_value(Value::Object(obj.clone()))?;
    tracing::info!("Successfully migrated legacy config");
    Ok(migrated_config)
}

/// Saves the provided configuration to `dir` (or the platform default).
pub fn save_config(config: &EngineConfig, dir: Option<&Path>) -> Result<()> {
    let config_dir = resolve_config_directory(dir)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}
