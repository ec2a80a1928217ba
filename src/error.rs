//! Error types for water-surface.

use thiserror::Error;

/// Errors raised while building, animating or configuring a water surface.
#[derive(Debug, Error)]
pub enum WaterError {
    /// Tile bounds or scale cannot produce a grid.
    #[error("invalid geometry for tile {tile}: {reason}")]
    InvalidTile {
        /// Tile position in the setup order.
        tile: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Anchor buffer and tile tables disagree.
    #[error("registry mismatch: {0}")]
    RegistryMismatch(String),

    /// Global vertex index past the end of the concatenated buffer.
    #[error("vertex index {index} out of range (buffer holds {len} vertices)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Buffer length.
        len: usize,
    },

    /// Tile id not known to the registry or sink.
    #[error("unknown tile: {0}")]
    UnknownTile(usize),

    /// Vertex slice handed to a tile has the wrong length.
    #[error("tile {tile} expects {expected} vertices, got {got}")]
    VertexCountMismatch {
        /// Tile id.
        tile: usize,
        /// Vertex count recorded for the tile.
        expected: usize,
        /// Length of the slice provided.
        got: usize,
    },

    /// Kernel produced NaN or infinity for a vertex.
    #[error("non-finite displacement for vertex {index} of tile {tile}")]
    NonFiniteDisplacement {
        /// Owning tile.
        tile: usize,
        /// Global vertex index.
        index: usize,
    },

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid RON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
