use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::tile::TILE_SIZE;

/// Tunables for a [`RenderEngine`](crate::RenderEngine).
///
/// Every field has a serde default so a partial preferences file still
/// loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Edge length of the square tiles, in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,

    /// Worker threads; `None` uses the available hardware parallelism.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Render each frame as one full-resolution pass on a single worker.
    #[serde(default)]
    pub single_threaded: bool,

    /// Cadence of progress events.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Run the function's sandbox hook after each completed render.
    #[serde(default)]
    pub sandbox: bool,

    /// Run the function's annotate hook after each completed render.
    #[serde(default)]
    pub annotate: bool,

    /// Sessions kept for back-navigation.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Upper bound on annotations kept per render.
    #[serde(default = "default_max_annotations")]
    pub max_annotations: usize,
}

fn default_tile_size() -> u32 {
    TILE_SIZE
}

fn default_progress_interval_ms() -> u64 {
    250
}

fn default_history_capacity() -> usize {
    32
}

fn default_max_annotations() -> usize {
    10_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: default_tile_size(),
            threads: None,
            single_threaded: false,
            progress_interval_ms: default_progress_interval_ms(),
            sandbox: false,
            annotate: false,
            history_capacity: default_history_capacity(),
            max_annotations: default_max_annotations(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.tile_size == 0 {
            return Err(RenderError::InvalidTileSize(self.tile_size));
        }
        if self.progress_interval_ms == 0 {
            return Err(RenderError::InvalidConfig(
                "progress interval must be > 0 ms".into(),
            ));
        }
        if self.threads == Some(0) {
            return Err(RenderError::InvalidConfig(
                "thread count must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Number of workers the engine will run.
    pub fn worker_count(&self) -> usize {
        if self.single_threaded {
            return 1;
        }
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
