//! RON-backed persistence for [`OverlaySettings`].

use std::fs;
use std::io;
use std::path::Path;

use overlay_engine::OverlaySettings;
use overlay_logging::{overlay_info, overlay_warn};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialize error: {0}")]
    Serialize(String),
}

/// Loads settings from `path`. A missing file yields the defaults; a corrupt
/// file is logged and also yields the defaults, so the overlay always starts.
pub fn load_settings(path: &Path) -> OverlaySettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return OverlaySettings::default();
        }
        Err(err) => {
            overlay_warn!("Failed to read settings from {:?}: {}", path, err);
            return OverlaySettings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            overlay_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            overlay_warn!("Failed to parse settings from {:?}: {}", path, err);
            OverlaySettings::default()
        }
    }
}

/// Saves settings with replace-on-rename so a crash mid-write cannot leave a
/// truncated file behind.
pub fn save_settings(path: &Path, settings: &OverlaySettings) -> Result<(), PersistError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(settings, pretty)
        .map_err(|err| PersistError::Serialize(err.to_string()))?;

    let tmp = path.with_extension("ron.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
