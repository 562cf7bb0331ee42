use overlay_core::DisplayMode;
use serde::{Deserialize, Serialize};

/// User-facing configuration. Persisted by the app crate; the pipeline holds
/// a copy and receives [`SettingChange`] notifications when it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub enabled: bool,
    pub display_mode: DisplayMode,
    pub deepl_endpoint: String,
    pub deepl_auth_key: String,
    pub source_lang: String,
    pub target_lang: String,
    pub cache_max_entries: usize,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            display_mode: DisplayMode::Under,
            deepl_endpoint: "https://api-free.deepl.com/v2/translate".to_string(),
            deepl_auth_key: String::new(),
            source_lang: "auto".to_string(),
            target_lang: "en".to_string(),
            cache_max_entries: 2000,
        }
    }
}

/// An asynchronous notification that one setting changed.
///
/// The pipeline reacts to `Enabled` by driving the watcher state machine and
/// to `DisplayMode` by re-rendering existing translations; language changes
/// apply from the next dispatch onward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Enabled(bool),
    DisplayMode(DisplayMode),
    Languages { source: String, target: String },
}
