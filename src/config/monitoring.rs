use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Prometheus scrape endpoint served at `/metrics`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    /// Default: false
    #[serde(default)]
    pub prometheus_enabled: bool,

    /// Default: 9100
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            prometheus_enabled: false,
            prometheus_port: default_prometheus_port(),
        }
    }
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.prometheus_enabled {
            return Ok(());
        }
        if self.prometheus_port == 0 {
            return Err(invalid("monitoring.prometheus_port cannot be 0 when metrics are served"));
        }
        Ok(())
    }
}

fn default_prometheus_port() -> u16 {
    9100
}
