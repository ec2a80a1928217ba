//! Tile descriptors and per-tile grid generation.
//!
//! Every tile is a uniform grid of `(count_x + 1) * (count_z + 1)` vertices in
//! row-major order: the vertex at grid cell `(x, z)` lives at
//! `x * (count_z + 1) + z`. Triangles and UVs use the same addressing.

use glam::{Mat4, Quat, UVec2, Vec2, Vec3};
use rayon::prelude::*;

use crate::error::WaterError;

/// Placement of the object a tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TileTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TileTransform {
    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Geometry supplied by the collaborator for one tile before grid generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSource {
    /// Center of the source mesh's local bounds.
    pub bounds_center: Vec3,
    /// Half-size of the source mesh's local bounds.
    pub bounds_extents: Vec3,
    pub transform: TileTransform,
}

/// Descriptor of one built tile inside the shared vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// Grid cell counts along x and z.
    pub dimensions: UVec2,
    pub origin_world: Vec3,
    /// `(1 / scale.x, 1 / scale.z)` of the source transform.
    pub scale_ratio: Vec2,
    pub local_to_world: Mat4,
    pub vertex_count: usize,
    /// Position of the tile's first vertex in the shared buffer.
    pub vertex_offset: usize,
}

impl Tile {
    /// Local vertex index of grid point `(x, z)`.
    #[inline]
    pub fn index(&self, x: u32, z: u32) -> usize {
        grid_index(x, z, self.dimensions.y)
    }
}

/// A built tile with its generated mesh arrays.
#[derive(Debug, Clone)]
pub struct TileGeometry {
    pub tile: Tile,
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub uvs: Vec<Vec2>,
}

/// Row-major grid addressing shared by vertices, triangles and UVs.
#[inline]
pub fn grid_index(x: u32, z: u32, count_z: u32) -> usize {
    x as usize * (count_z as usize + 1) + z as usize
}

/// Build the grid, triangles and UVs for one tile.
///
/// The returned tile has `vertex_offset` 0; the registry assigns offsets when
/// tiles are concatenated.
///
/// # Arguments
/// * `tile_id` - Position of the tile in the setup order, only used to label errors
/// * `source` - Local bounds and object transform supplied by the engine
/// * `verts_per_unit` - Grid density, vertices per world unit along each axis
/// * `uv_scale` - UV ping-pong period in grid cells
pub fn build_tile(
    tile_id: usize,
    source: &TileSource,
    verts_per_unit: u32,
    uv_scale: f32,
) -> Result<TileGeometry, WaterError> {
    let invalid = |reason: String| WaterError::InvalidTile {
        tile: tile_id,
        reason,
    };

    if verts_per_unit == 0 {
        return Err(invalid("density must be at least one vertex per unit".into()));
    }
    let extents = source.bounds_extents;
    let scale = source.transform.scale;
    if !extents.is_finite() || extents.x < 0.0 || extents.z < 0.0 {
        return Err(invalid(format!("bad bounds extents {}", extents)));
    }
    if !scale.is_finite() || scale.x <= 0.0 || scale.z <= 0.0 {
        return Err(invalid(format!("bad scale {}", scale)));
    }

    let (count_x, count_z) = match (
        axis_cells(extents.x, scale.x, verts_per_unit),
        axis_cells(extents.z, scale.z, verts_per_unit),
    ) {
        (Some(x), Some(z)) => (x, z),
        _ => {
            return Err(invalid(format!(
                "grid for extents {} at scale {} and density {} is too large",
                extents, scale, verts_per_unit
            )))
        }
    };
    if count_x == 0 || count_z == 0 {
        return Err(invalid(format!(
            "grid has no cells ({} x {})",
            count_x, count_z
        )));
    }

    // Every vertex must be addressable by a u32 triangle index
    let vertex_count = (count_x as u64 + 1) * (count_z as u64 + 1);
    if vertex_count > u32::MAX as u64 + 1 {
        return Err(invalid(format!(
            "{} x {} grid has {} vertices, more than u32 indices can address",
            count_x, count_z, vertex_count
        )));
    }

    let origin = Vec3::new(
        source.bounds_center.x - extents.x * scale.x,
        0.0,
        source.bounds_center.z - extents.z * scale.z,
    );

    // Scale is baked into the grid spacing, so the stored transform drops it
    let local_to_world = Mat4::from_rotation_translation(
        source.transform.rotation,
        source.transform.translation,
    );

    let tile = Tile {
        dimensions: UVec2::new(count_x, count_z),
        origin_world: origin,
        scale_ratio: Vec2::new(1.0 / scale.x, 1.0 / scale.z),
        local_to_world,
        vertex_count: (count_x as usize + 1) * (count_z as usize + 1),
        vertex_offset: 0,
    };

    let vertices = generate_vertices(&tile, verts_per_unit);
    let indices = generate_indices(count_x, count_z);
    let uvs = generate_uvs(count_x, count_z, uv_scale);

    log::debug!(
        "tile {}: {}x{} cells, {} vertices, origin {}",
        tile_id,
        count_x,
        count_z,
        tile.vertex_count,
        origin
    );

    Ok(TileGeometry {
        tile,
        vertices,
        indices,
        uvs,
    })
}

/// `round(extent * 2 * scale) * density`, rounding half to even.
///
/// `None` when the cell count does not fit in a `u32`.
fn axis_cells(extent: f32, scale: f32, verts_per_unit: u32) -> Option<u32> {
    let rounded = (extent * 2.0 * scale).round_ties_even();
    // 2^32, the first value a u32 cannot hold
    if !(rounded < 4_294_967_296.0) {
        return None;
    }
    (rounded as u32).checked_mul(verts_per_unit)
}

/// Split a row-major local index back into grid coordinates.
#[inline]
fn grid_coords(index: usize, count_z: u32) -> (u32, u32) {
    let row = count_z as usize + 1;
    ((index / row) as u32, (index % row) as u32)
}

fn generate_vertices(tile: &Tile, verts_per_unit: u32) -> Vec<Vec3> {
    let spacing = 1.0 / verts_per_unit as f32;
    let count_z = tile.dimensions.y;
    let origin = tile.origin_world;

    // Create vertices in parallel, one per row-major index
    (0..tile.vertex_count)
        .into_par_iter()
        .map(|i| {
            let (x, z) = grid_coords(i, count_z);
            Vec3::new(
                origin.x + x as f32 * spacing,
                0.0,
                origin.z + z as f32 * spacing,
            )
        })
        .collect()
}

/// Two triangles per cell, cells in x-major order.
///
/// Indices are `u32`; [`build_tile`] rejects grids with more vertices than
/// that can address before calling this.
pub fn generate_indices(count_x: u32, count_z: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(count_x as usize * count_z as usize * 6);
    let idx = |x: u32, z: u32| grid_index(x, z, count_z) as u32;

    for x in 0..count_x {
        for z in 0..count_z {
            indices.extend_from_slice(&[
                idx(x, z),
                idx(x + 1, z + 1),
                idx(x + 1, z),
                idx(x, z),
                idx(x, z + 1),
                idx(x + 1, z + 1),
            ]);
        }
    }

    indices
}

/// Mirrored UV tiling: the coordinate runs 0..1 then back 1..0 every `2 * uv_scale` cells.
#[inline]
pub fn ping_pong_uv(coord: f32, uv_scale: f32) -> f32 {
    let t = (coord / uv_scale) % 2.0;
    if t <= 1.0 {
        t
    } else {
        2.0 - t
    }
}

pub fn generate_uvs(count_x: u32, count_z: u32, uv_scale: f32) -> Vec<Vec2> {
    let vertex_count = (count_x as usize + 1) * (count_z as usize + 1);

    (0..vertex_count)
        .into_par_iter()
        .map(|i| {
            let (x, z) = grid_coords(i, count_z);
            Vec2::new(ping_pong_uv(x as f32, uv_scale), ping_pong_uv(z as f32, uv_scale))
        })
        .collect()
}

/// Tile sources for a `tiles_x` by `tiles_z` grid of square plane meshes.
///
/// Each source is a `tile_size` plane centered on its own origin and placed so
/// that neighbouring tiles meet edge to edge.
///
/// # Arguments
/// * `tiles_x` - Number of tiles in X direction
/// * `tiles_z` - Number of tiles in Z direction
/// * `tile_size` - Edge length of each plane before scaling
/// * `scale` - Object scale applied to every tile
pub fn grid_layout(tiles_x: usize, tiles_z: usize, tile_size: f32, scale: Vec3) -> Vec<TileSource> {
    let half = tile_size * 0.5;
    let step_x = tile_size * scale.x;
    let step_z = tile_size * scale.z;
    let start_x = -(tiles_x as f32 - 1.0) * step_x * 0.5;
    let start_z = -(tiles_z as f32 - 1.0) * step_z * 0.5;

    let mut sources = Vec::with_capacity(tiles_x * tiles_z);
    for row in 0..tiles_z {
        for col in 0..tiles_x {
            sources.push(TileSource {
                bounds_center: Vec3::ZERO,
                bounds_extents: Vec3::new(half, 0.0, half),
                transform: TileTransform {
                    translation: Vec3::new(
                        start_x + col as f32 * step_x,
                        0.0,
                        start_z + row as f32 * step_z,
                    ),
                    rotation: Quat::IDENTITY,
                    scale,
                },
            });
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_source(extent: f32, scale: Vec3) -> TileSource {
        TileSource {
            bounds_center: Vec3::ZERO,
            bounds_extents: Vec3::new(extent, 0.0, extent),
            transform: TileTransform {
                scale,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_single_cell_triangulation() {
        assert_eq!(generate_indices(1, 1), vec![0, 3, 2, 0, 1, 3]);
    }

    #[test]
    fn test_triangulation_covers_every_cell() {
        let indices = generate_indices(3, 2);
        assert_eq!(indices.len(), 3 * 2 * 6);
        let max = *indices.iter().max().unwrap() as usize;
        assert_eq!(max, grid_index(3, 2, 2));
        // Second cell along z starts at grid point (0, 1)
        assert_eq!(&indices[6..9], &[1, 5, 4]);
    }

    #[test]
    fn test_ping_pong_uv() {
        assert_eq!(ping_pong_uv(15.0, 10.0), 0.5);
        assert_eq!(ping_pong_uv(5.0, 10.0), 0.5);
        assert_eq!(ping_pong_uv(10.0, 10.0), 1.0);
        assert_eq!(ping_pong_uv(20.0, 10.0), 0.0);
        assert_eq!(ping_pong_uv(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_build_tile_dimensions_and_layout() {
        // 2x2 plane at density 2 gives a 4x4 cell grid starting at (-1, -1)
        let geometry = build_tile(0, &unit_source(1.0, Vec3::ONE), 2, 20.0).unwrap();
        let tile = geometry.tile;
        assert_eq!(tile.dimensions, UVec2::new(4, 4));
        assert_eq!(tile.vertex_count, 25);
        assert_eq!(geometry.vertices.len(), 25);
        assert_eq!(geometry.uvs.len(), 25);
        assert_eq!(geometry.indices.len(), 4 * 4 * 6);
        assert_eq!(tile.origin_world, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(geometry.vertices[tile.index(0, 0)], Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(geometry.vertices[tile.index(1, 0)], Vec3::new(-0.5, 0.0, -1.0));
        assert_eq!(geometry.vertices[tile.index(0, 1)], Vec3::new(-1.0, 0.0, -0.5));
        assert_eq!(geometry.vertices[tile.index(4, 4)], Vec3::new(1.0, 0.0, 1.0));
        assert!(geometry.vertices.iter().all(|v| v.y == 0.0));
    }

    #[test]
    fn test_axes_use_their_own_extent() {
        let source = TileSource {
            bounds_center: Vec3::new(1.0, 0.0, 0.0),
            bounds_extents: Vec3::new(1.0, 0.0, 3.0),
            transform: TileTransform::default(),
        };
        let geometry = build_tile(0, &source, 1, 10.0).unwrap();
        assert_eq!(geometry.tile.dimensions, UVec2::new(2, 6));
        assert_eq!(geometry.tile.origin_world, Vec3::new(0.0, 0.0, -3.0));
    }

    #[test]
    fn test_scale_is_baked_and_normalized() {
        let source = TileSource {
            bounds_center: Vec3::ZERO,
            bounds_extents: Vec3::new(0.5, 0.0, 0.5),
            transform: TileTransform {
                translation: Vec3::new(10.0, 0.0, 0.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::new(4.0, 1.0, 2.0),
            },
        };
        let geometry = build_tile(0, &source, 1, 10.0).unwrap();
        let tile = geometry.tile;
        assert_eq!(tile.dimensions, UVec2::new(4, 2));
        assert_eq!(tile.scale_ratio, Vec2::new(0.25, 0.5));
        assert_eq!(tile.local_to_world, Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 1.25 * 2 = 2.5 rounds to 2, 1.75 * 2 = 3.5 rounds to 4
        assert_eq!(axis_cells(1.25, 1.0, 1), Some(2));
        assert_eq!(axis_cells(1.75, 1.0, 1), Some(4));
        assert_eq!(axis_cells(1.25, 1.0, 3), Some(6));
    }

    #[test]
    fn test_oversized_grids_are_rejected() {
        assert_eq!(axis_cells(1e12, 1.0, 1), None);
        assert_eq!(axis_cells(1e6, 1.0, 10_000), None);
        assert_eq!(axis_cells(f32::MAX, 4.0, 1), None);

        // Cell count overflows u32 once density is applied
        assert!(matches!(
            build_tile(2, &unit_source(1e6, Vec3::ONE), 10_000, 10.0),
            Err(WaterError::InvalidTile { tile: 2, .. })
        ));
        // Cell counts fit, but the vertex count is past u32 indexing
        assert!(matches!(
            build_tile(0, &unit_source(50_000.0, Vec3::ONE), 1, 10.0),
            Err(WaterError::InvalidTile { tile: 0, .. })
        ));
    }

    #[test]
    fn test_grid_coords_invert_grid_index() {
        for x in 0..=3 {
            for z in 0..=5 {
                assert_eq!(grid_coords(grid_index(x, z, 5), 5), (x, z));
            }
        }
    }

    #[test]
    fn test_rejects_degenerate_tiles() {
        assert!(matches!(
            build_tile(3, &unit_source(0.0, Vec3::ONE), 1, 10.0),
            Err(WaterError::InvalidTile { tile: 3, .. })
        ));
        assert!(build_tile(0, &unit_source(1.0, Vec3::new(0.0, 1.0, 1.0)), 1, 10.0).is_err());
        assert!(build_tile(0, &unit_source(f32::NAN, Vec3::ONE), 1, 10.0).is_err());
        assert!(build_tile(0, &unit_source(1.0, Vec3::ONE), 0, 10.0).is_err());
    }

    #[test]
    fn test_grid_layout_tiles_meet() {
        let sources = grid_layout(2, 1, 10.0, Vec3::ONE);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].transform.translation, Vec3::new(-5.0, 0.0, 0.0));
        assert_eq!(sources[1].transform.translation, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(sources[0].bounds_extents, Vec3::new(5.0, 0.0, 5.0));
    }
}
