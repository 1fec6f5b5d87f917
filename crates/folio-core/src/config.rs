//! Store configuration.
//!
//! Configuration comes from environment variables (optionally loaded from a
//! `.env` file by the binary):
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `FOLIO_BACKEND` | `relational` | `document` or `relational` |
//! | `FOLIO_DATA_DIR` | `data/metadata` | blob directory for the document backend |
//! | `FOLIO_DATABASE_URL` | `sqlite://data/metadata.db?mode=rwc` | relational backend URL |
//! | `FOLIO_MAX_CONNECTIONS` | `5` | relational pool size |
//!
//! ```
//! use folio_core::{BackendKind, StoreConfig};
//!
//! let config = StoreConfig::default();
//! assert_eq!(config.backend, BackendKind::Relational);
//! ```

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::traits::BackendKind;

pub const ENV_BACKEND: &str = "FOLIO_BACKEND";
pub const ENV_DATA_DIR: &str = "FOLIO_DATA_DIR";
pub const ENV_DATABASE_URL: &str = "FOLIO_DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "FOLIO_MAX_CONNECTIONS";

/// Where and how documents are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Relational,
            data_dir: PathBuf::from(defaults::DATA_DIR),
            database_url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::MAX_CONNECTIONS,
        }
    }
}

impl StoreConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source. Unset variables take defaults;
    /// set but malformed ones are a [`Error::Config`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.backend = lookup(ENV_BACKEND)
            .as_deref()
            .unwrap_or(defaults::BACKEND)
            .parse()?;
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            config.database_url = url;
        }
        if let Some(max) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = max.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a positive integer, got '{}'", ENV_MAX_CONNECTIONS, max))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Same config pointed at another backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::Config(format!(
                "{} must be at least 1",
                ENV_MAX_CONNECTIONS
            )));
        }
        match self.backend {
            BackendKind::Document if self.data_dir.as_os_str().is_empty() => Err(Error::Config(
                format!("{} cannot be empty", ENV_DATA_DIR),
            )),
            BackendKind::Relational if !self.database_url.starts_with("sqlite:") => {
                Err(Error::Config(format!(
                    "{} must be a sqlite: URL, got '{}'",
                    ENV_DATABASE_URL, self.database_url
                )))
            }
            _ => Ok(()),
        }
    }
}
