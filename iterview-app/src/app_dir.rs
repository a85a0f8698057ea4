//! Directories used by the driver. Preferences and images live next to the
//! executable when that is writable; the platform config directory is the
//! fallback for preferences.

use std::path::PathBuf;

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Platform config directory for iterview.
pub fn config_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "iterview")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory for exported frames.
pub fn images_directory() -> PathBuf {
    exe_directory().join("images")
}

/// Directory searched for colormap table files given by bare name.
pub fn colormaps_directory() -> PathBuf {
    exe_directory().join("colormaps")
}
