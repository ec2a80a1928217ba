use glam::{Mat4, Vec2, Vec3};

use crate::error::WaterError;
use crate::tile::{Tile, TileGeometry};

/// All tiles sharing one anchor buffer.
///
/// Tiles are laid out back to back: tile `i` owns the global indices
/// `[vertex_offset, vertex_offset + vertex_count)`. `bounds[i]` holds the
/// running vertex count up to and including tile `i`, the exclusive upper
/// bound used to resolve which tile owns an index.
#[derive(Debug, Clone)]
pub struct TileRegistry {
    tiles: Vec<Tile>,
    bounds: Vec<usize>,
    anchors: Vec<Vec3>,
}

impl TileRegistry {
    /// Concatenate built tiles, assigning each its vertex offset.
    ///
    /// # Arguments
    /// * `geometry` - Built tiles in setup order; their grid vertices become the anchors
    pub fn from_geometry<'a, I>(geometry: I) -> Result<Self, WaterError>
    where
        I: IntoIterator<Item = &'a TileGeometry>,
    {
        let mut tiles = Vec::new();
        let mut anchors = Vec::new();

        for geo in geometry {
            let mut tile = geo.tile;
            tile.vertex_offset = anchors.len();
            anchors.extend_from_slice(&geo.vertices);
            tiles.push(tile);
        }

        Self::from_parts(tiles, anchors)
    }

    /// Build from tile tables and a prepared anchor buffer, checking they line up.
    ///
    /// # Arguments
    /// * `tiles` - Tile descriptors with offsets already assigned, in buffer order
    /// * `anchors` - Rest positions of every tile's vertices, concatenated tile by tile
    pub fn from_parts(tiles: Vec<Tile>, anchors: Vec<Vec3>) -> Result<Self, WaterError> {
        let mut bounds = Vec::with_capacity(tiles.len());
        let mut total = 0usize;

        for (i, tile) in tiles.iter().enumerate() {
            let expected = (tile.dimensions.x as usize + 1) * (tile.dimensions.y as usize + 1);
            if tile.vertex_count != expected {
                return Err(WaterError::RegistryMismatch(format!(
                    "tile {} records {} vertices but its {}x{} grid has {}",
                    i, tile.vertex_count, tile.dimensions.x, tile.dimensions.y, expected
                )));
            }
            if tile.vertex_offset != total {
                return Err(WaterError::RegistryMismatch(format!(
                    "tile {} starts at {} but previous tiles end at {}",
                    i, tile.vertex_offset, total
                )));
            }
            total += tile.vertex_count;
            bounds.push(total);
        }

        if anchors.len() != total {
            return Err(WaterError::RegistryMismatch(format!(
                "anchor buffer holds {} vertices, tiles account for {}",
                anchors.len(),
                total
            )));
        }

        Ok(Self {
            tiles,
            bounds,
            anchors,
        })
    }

    /// Id of the tile owning global vertex `index`.
    pub fn resolve(&self, index: usize) -> Result<usize, WaterError> {
        let tile = self.bounds.partition_point(|&end| end <= index);
        if tile == self.tiles.len() {
            return Err(WaterError::IndexOutOfRange {
                index,
                len: self.anchors.len(),
            });
        }
        Ok(tile)
    }

    /// Transform and scale ratio of the tile owning `index`.
    pub fn lookup(&self, index: usize) -> Result<(&Mat4, Vec2), WaterError> {
        let tile = &self.tiles[self.resolve(index)?];
        Ok((&tile.local_to_world, tile.scale_ratio))
    }

    pub fn set_local_to_world(&mut self, tile: usize, local_to_world: Mat4) -> Result<(), WaterError> {
        let entry = self.tiles.get_mut(tile).ok_or(WaterError::UnknownTile(tile))?;
        entry.local_to_world = local_to_world;
        Ok(())
    }

    pub fn tile(&self, tile: usize) -> Option<&Tile> {
        self.tiles.get(tile)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn anchors(&self) -> &[Vec3] {
        &self.anchors
    }

    /// Anchors belonging to one tile.
    pub fn tile_anchors(&self, tile: usize) -> Option<&[Vec3]> {
        self.tiles
            .get(tile)
            .map(|t| &self.anchors[t.vertex_offset..t.vertex_offset + t.vertex_count])
    }

    pub fn vertex_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
