//! Layered configuration loading.
//!
//! Priority: CLI flags > `FOB_PREVIEW_*` environment variables >
//! `fob-preview.config.json` (or `--config`) > defaults.

use crate::cli::PayloadArgs;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use fob_preview::PreviewConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "fob-preview.config.json";
pub const ENV_PREFIX: &str = "FOB_PREVIEW_";

/// Values given on the command line. Unset flags are left out so they do
/// not shadow lower layers.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_file_size: Option<usize>,
}

/// Load the preview configuration for a command.
///
/// The entry path is not merged here: it is chosen per payload, see
/// [`resolve_entry`].
pub fn load(args: &PayloadArgs) -> Result<PreviewConfig> {
    load_from(args, Path::new(CONFIG_FILE_NAME))
}

fn load_from(args: &PayloadArgs, default_path: &Path) -> Result<PreviewConfig> {
    let mut figment = Figment::new().merge(Serialized::defaults(PreviewConfig::default()));

    if let Some(path) = config_file(args.config.as_deref(), default_path)? {
        tracing::debug!(path = %path.display(), "Loading config file");
        figment = figment.merge(Json::file(path));
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).map(|key| camel_case(key.as_str()).into()));

    figment = figment.merge(Serialized::defaults(CliOverrides {
        max_file_size: args.max_file_size,
    }));

    let config: PreviewConfig = figment.extract().map_err(|e| ConfigError::InvalidValue {
        field: "configuration".to_string(),
        value: e.to_string(),
        hint: format!("Check {} syntax and {}* variables", CONFIG_FILE_NAME, ENV_PREFIX),
    })?;

    config.validate().map_err(|e| ConfigError::InvalidValue {
        field: "configuration".to_string(),
        value: e.to_string(),
        hint: "Slot and mount id must be identifiers; size limit must be positive".to_string(),
    })?;

    Ok(config)
}

fn config_file(explicit: Option<&Path>, default_path: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ConfigError::NotFound(path.to_path_buf()).into()),
        None => Ok(default_path.exists().then(|| default_path.to_path_buf())),
    }
}

/// Pick the entry for a build: `--entry`, then the payload's `entryPath`,
/// then the configured default.
pub fn resolve_entry<'a>(
    flag: Option<&'a str>,
    payload: Option<&'a str>,
    config: &'a PreviewConfig,
) -> &'a str {
    flag.or(payload).unwrap_or(&config.entry)
}

/// `max_file_size` -> `maxFileSize`. `PreviewConfig` only knows camelCase
/// keys, so this is the one place environment names are translated.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
