pub mod colormap;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod formula;
mod job;
pub mod overlay;
pub mod present;
pub mod preview;
pub mod raster;
pub mod session;
pub mod tile;

pub use colormap::{ColorTable, Colormap, TABLE_SIZE};
pub use config::EngineConfig;
pub use engine::{wait_for_finish, RenderEngine, RenderEvent};
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use formula::Formula;
pub use present::{colorize, present, Frame};
pub use preview::parameter_preview;
pub use raster::RasterBuffer;
pub use session::{RenderOutcome, RenderRequest, RenderSession, SessionHistory};
pub use tile::{build_tile_grid, Phase, Tile, TILE_SIZE};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
