//! Workspace configuration commands.
//!
//! Config is a small string map inside the store. Keys in use today:
//! `audit_retention_days` (purge window) and `export_dir` (where CSV
//! exports land by default). Unknown keys are stored as-is.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::commands::{Output, require_edit, require_session};
use crate::storage::Store;
use crate::{Error, Result};

/// Result of `rb config get`.
#[derive(Debug, Serialize)]
pub struct ConfigGetResult {
    pub key: String,

    /// Missing keys are not an error; the value is just absent
    pub value: Option<String>,
}

impl Output for ConfigGetResult {
    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => format!("{} = {}", self.key, value),
            None => format!("{} is not set", self.key),
        }
    }
}

/// Read one config value.
pub fn config_get(workspace: &Path, key: &str) -> Result<ConfigGetResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    Ok(ConfigGetResult {
        key: key.to_string(),
        value: store.get_config(key)?,
    })
}

/// Result of `rb config set`.
#[derive(Debug, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
}

impl Output for ConfigSetResult {
    fn to_human(&self) -> String {
        format!("Set {} = {}", self.key, self.value)
    }
}

/// Write one config value.
pub fn config_set(workspace: &Path, key: &str, value: &str) -> Result<ConfigSetResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    if key.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Config key must not be blank".to_string(),
        ));
    }

    store.set_config(key, value)?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Result of `rb config list`.
#[derive(Debug, Serialize)]
pub struct ConfigListResult {
    pub count: usize,
    pub config: BTreeMap<String, String>,
}

impl Output for ConfigListResult {
    fn to_human(&self) -> String {
        if self.config.is_empty() {
            return "No config values set.".to_string();
        }

        let mut out = String::new();
        for (key, value) in &self.config {
            out.push_str(&format!("{} = {}\n", key, value));
        }
        out.trim_end().to_string()
    }
}

/// List all config values.
pub fn config_list(workspace: &Path) -> Result<ConfigListResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let config = store.list_config()?;
    Ok(ConfigListResult {
        count: config.len(),
        config,
    })
}
