use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use iterview_core::{PlaneRect, Space};
use iterview_render::EngineConfig;

// ---------------------------------------------------------------------------
// Last-view snapshot
// ---------------------------------------------------------------------------

/// What the previous run looked at, so the next one can start there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastView {
    pub function: String,
    pub space: Space,
    pub rect: PlaneRect,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default)]
    pub space: Space,
    /// Columns of the rendered frame; rows follow the rectangle's aspect.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Formula name, `grayscale`, or a table file path.
    #[serde(default = "default_colormap")]
    pub colormap: String,
    #[serde(default = "default_preview_size")]
    pub preview_size: u32,
    #[serde(default = "default_true")]
    pub restore_last_view: bool,
    #[serde(default)]
    pub last_view: Option<LastView>,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_function() -> String {
    "mandi".to_string()
}

fn default_width() -> u32 {
    800
}

fn default_colormap() -> String {
    "grayscale".to_string()
}

fn default_preview_size() -> u32 {
    128
}

fn default_true() -> bool {
    true
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            function: default_function(),
            space: Space::default(),
            width: default_width(),
            colormap: default_colormap(),
            preview_size: default_preview_size(),
            restore_last_view: true,
            last_view: None,
            engine: EngineConfig::default(),
        }
    }
}

impl AppPreferences {
    /// Load preferences, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                    Ok(prefs) => {
                        info!("Loaded preferences from {}", path.display());
                        if let Err(e) = prefs.engine.validate() {
                            error!("Ignoring engine settings in preferences: {e}");
                            return Self {
                                engine: EngineConfig::default(),
                                ..prefs
                            };
                        }
                        return prefs;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    /// Persist preferences to disk.
    pub fn save(&self) {
        let path = config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences to {}", path.display());
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }
}

/// `preferences.json` next to the executable if present, otherwise in the
/// platform config directory.
fn config_path() -> PathBuf {
    let local = crate::app_dir::exe_directory().join("preferences.json");
    if local.exists() {
        return local;
    }
    crate::app_dir::config_directory().join("preferences.json")
}
