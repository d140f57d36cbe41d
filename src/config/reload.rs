use serde::Deserialize;
use serde::Serialize;

/// How a reload advances through its stages
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReloadMode {
    /// The caller's task drives every stage and returns once the reload settled
    Sync,
    /// Stages run on the blocking pool; the caller returns immediately
    #[default]
    Async,
}

impl ReloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadMode::Sync => "sync",
            ReloadMode::Async => "async",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ReloadConfig {
    #[serde(default)]
    pub mode: ReloadMode,
}
