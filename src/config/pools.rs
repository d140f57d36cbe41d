use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Sizing of the two execution pools
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// Worker threads for short, non-blocking store calls
    #[serde(default = "default_store_worker_threads")]
    pub store_worker_threads: usize,

    #[serde(default = "default_store_thread_name")]
    pub store_thread_name: String,

    /// Worker threads for bulk loads, reload orchestration and watch handling
    #[serde(default = "default_blocking_worker_threads")]
    pub blocking_worker_threads: usize,

    #[serde(default = "default_blocking_thread_name")]
    pub blocking_thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            store_worker_threads: default_store_worker_threads(),
            store_thread_name: default_store_thread_name(),
            blocking_worker_threads: default_blocking_worker_threads(),
            blocking_thread_name: default_blocking_thread_name(),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.store_worker_threads == 0 {
            return Err(invalid("pools.store_worker_threads cannot be 0"));
        }
        if self.blocking_worker_threads == 0 {
            return Err(invalid("pools.blocking_worker_threads cannot be 0"));
        }
        Ok(())
    }
}

fn default_store_worker_threads() -> usize {
    4
}
fn default_store_thread_name() -> String {
    "kv-conn".to_string()
}
fn default_blocking_worker_threads() -> usize {
    2
}
fn default_blocking_thread_name() -> String {
    "kv-blocking".to_string()
}
