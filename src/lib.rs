// Export main modules
pub mod config;
pub mod driver;
pub mod error;
mod export;
pub mod kernel;
pub mod mesh;
pub mod octave;
pub mod registry;
pub mod tile;

// Re-export everything for public use
pub use config::{Schedule, WaterConfig};
pub use driver::{GeometrySink, WaveAnimator};
pub use error::WaterError;
pub use mesh::{Bounds, TileMesh, TileMeshes};
pub use octave::Octave;
pub use registry::TileRegistry;
pub use tile::{Tile, TileGeometry, TileSource, TileTransform};

pub mod prelude {
    pub use crate::config::{Schedule, WaterConfig};
    pub use crate::driver::{GeometrySink, WaveAnimator};
    pub use crate::error::WaterError;
    pub use crate::mesh::{TileMesh, TileMeshes};
    pub use crate::octave::{generate_octaves, Octave};
    pub use crate::registry::TileRegistry;
    pub use crate::tile::{grid_layout, Tile, TileGeometry, TileSource, TileTransform};
}
