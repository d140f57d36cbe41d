use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use super::BackoffPolicy;
use crate::Result;

/// Connection parameters for the backing key-value store
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Store endpoints. A port may already be part of an endpoint, in which
    /// case `port` should be left at 0.
    ///
    /// Default: `["http://localhost"]`
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Port appended to every endpoint (0 disables appending)
    ///
    /// Default: 2379
    #[serde(default = "default_port")]
    pub port: u16,

    /// TOML file of `key = "value"` pairs loaded into the in-process store
    /// at boot
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Retry policy applied to every read issued against the store
    #[serde(default)]
    pub retry: BackoffPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            port: default_port(),
            seed_file: None,
            retry: BackoffPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Endpoints with the configured port appended
    pub fn resolved_endpoints(&self) -> Vec<String> {
        if self.port == 0 {
            return self.endpoints.clone();
        }
        self.endpoints
            .iter()
            .map(|host| format!("{}:{}", host, self.port))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() || self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(invalid("store.endpoints must contain at least one non-empty endpoint"));
        }
        self.retry.validate()
    }
}

fn default_endpoints() -> Vec<String> {
    vec!["http://localhost".to_string()]
}
fn default_port() -> u16 {
    2379
}
