//! Preview build configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Conventional location of the generated entry component.
pub const DEFAULT_ENTRY: &str = "app/generated/page.tsx";

/// Global slot the entry's default export is stored on.
pub const DEFAULT_GLOBAL_SLOT: &str = "__FOB_PREVIEW_COMPONENT__";

pub const DEFAULT_MOUNT_ID: &str = "root";

pub const DEFAULT_REACT_URL: &str = "https://unpkg.com/react@18.3.1/umd/react.development.js";

pub const DEFAULT_REACT_DOM_URL: &str =
    "https://unpkg.com/react-dom@18.3.1/umd/react-dom.development.js";

/// 1 MiB per generated file.
pub const DEFAULT_MAX_FILE_SIZE: usize = 1024 * 1024;

/// Tunables for a preview build.
///
/// Keys are camelCase only (`maxFileSize`). Front ends that read snake_case
/// sources such as environment variables map the key names themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewConfig {
    /// Entry path used when the caller does not name one.
    pub entry: String,

    pub global_slot: String,

    /// `id` of the element the component is mounted under.
    pub mount_id: String,

    pub react_url: String,

    pub react_dom_url: String,

    /// Per-file content limit in bytes.
    pub max_file_size: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            entry: DEFAULT_ENTRY.to_string(),
            global_slot: DEFAULT_GLOBAL_SLOT.to_string(),
            mount_id: DEFAULT_MOUNT_ID.to_string(),
            react_url: DEFAULT_REACT_URL.to_string(),
            react_dom_url: DEFAULT_REACT_DOM_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl PreviewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Validate configuration for logical consistency.
    ///
    /// The slot and mount id are spliced into generated script, so both must
    /// be plain identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.entry.trim().is_empty() {
            return Err(Error::InvalidConfig("entry cannot be empty".to_string()));
        }

        validate_identifier("globalSlot", &self.global_slot)?;
        validate_identifier("mountId", &self.mount_id)?;

        for (field, url) in [("reactUrl", &self.react_url), ("reactDomUrl", &self.react_dom_url)] {
            if url.is_empty() || url.contains(['"', '<', '>']) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-empty URL without quotes or angle brackets (got '{}')",
                    field, url
                )));
            }
        }

        if self.max_file_size == 0 {
            return Err(Error::InvalidConfig(
                "maxFileSize must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// JavaScript identifier check: letter, `_` or `$`, then alphanumerics.
fn validate_identifier(field: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(Error::InvalidConfig(format!("{} cannot be empty", field)));
    };

    if !first.is_ascii_alphabetic() && first != '_' && first != '$' {
        return Err(Error::InvalidConfig(format!(
            "{} must start with a letter, underscore, or dollar sign (got '{}')",
            field, value
        )));
    }

    if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '$') {
        return Err(Error::InvalidConfig(format!(
            "Invalid character '{}' in {} '{}'",
            c, field, value
        )));
    }

    Ok(())
}
