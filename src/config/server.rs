use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            listen_port: default_listen_port(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.listen_port == 0 {
            return Err(invalid("server.listen_port cannot be 0 when enabled"));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
fn default_listen_port() -> u16 {
    8080
}
