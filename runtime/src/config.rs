//! Context configuration loaded from TOML.
//!
//! ```toml
//! frozen = true
//!
//! [bindings]
//! service = "billing"
//! retries = 3
//!
//! [bindings.database]
//! url = "postgres://localhost/billing"
//! ```
//!
//! Every entry under `[bindings]` is bound by name as a
//! `serde_json::Value`, so `ctx.get_named::<serde_json::Value>("retries")`
//! reads it back.

use crate::context::{Bindings, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read context config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid context config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Declarative description of a root context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Freeze the resulting context so nothing can extend it.
    pub frozen: bool,
    pub bindings: serde_json::Map<String, serde_json::Value>,
}

impl ContextConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Build the root context described by this config.
    pub fn into_context(self) -> Context {
        let bindings = self
            .bindings
            .into_iter()
            .fold(Bindings::new(), |acc, (name, value)| acc.bind(name, value));
        tracing::debug!(
            bindings = bindings.len(),
            frozen = self.frozen,
            "Building context from config"
        );
        let ctx = Context::from_bindings(bindings);
        if self.frozen {
            ctx.freeze();
        }
        ctx
    }
}
