use serde::{Deserialize, Serialize};

/// Top-level settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RankingSettings {
    #[serde(default)]
    pub autosave: AutosaveSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub api: ApiSettings,
}

/// Periodic refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutosaveSettings {
    pub enabled: bool,
    pub interval_minutes: u32,
}

impl AutosaveSettings {
    pub const MIN_INTERVAL_MINUTES: u32 = 1;
    pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 30,
        }
    }
}

/// Ranking history settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySettings {
    pub capacity: usize,
}

impl HistorySettings {
    pub const DEFAULT_CAPACITY: usize = 50;
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

/// Detail read API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 10,
            user_agent: format!("charrank/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
