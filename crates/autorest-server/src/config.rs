use anyhow::Context;
use autorest_core::AppConfig;
use std::{env, path::Path, path::PathBuf};

pub const CONFIG_ENV: &str = "AUTOREST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "autorest.toml";

/// Load configuration.
///
/// An explicit path (flag or `AUTOREST_CONFIG`) must exist. When neither is
/// given, `autorest.toml` in the working directory is used if present and
/// built-in defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match env::var(CONFIG_ENV) {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    tracing::info!("No {} found; using built-in defaults", DEFAULT_CONFIG_PATH);
                    return Ok(AppConfig::default());
                }
                default
            }
        },
    };

    let cfg = AppConfig::from_file(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(cfg)
}
