//! Per-frame animation of a tiled water surface.
//!
//! A tick runs the displacement kernel over every vertex of every tile, joins,
//! and only then hands each tile's slice of the result to the geometry sink on
//! the calling thread.

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::config::{Schedule, WaterConfig};
use crate::error::WaterError;
use crate::kernel;
use crate::octave::Octave;
use crate::registry::TileRegistry;
use crate::tile::{build_tile, TileGeometry, TileSource};

/// The engine side of the surface: receives built tiles and per-frame vertices.
pub trait GeometrySink {
    /// Install freshly built geometry for `tile`.
    fn set_geometry(&mut self, tile: usize, geometry: &TileGeometry) -> Result<(), WaterError>;

    /// Replace the live vertex positions of `tile`.
    fn set_vertices(&mut self, tile: usize, vertices: &[Vec3]) -> Result<(), WaterError>;

    /// Placement update for `tile`. Sinks that own no transforms can ignore it.
    fn set_local_to_world(&mut self, _tile: usize, _local_to_world: Mat4) -> Result<(), WaterError> {
        Ok(())
    }

    fn recalculate_normals(&mut self, tile: usize) -> Result<(), WaterError>;

    fn recalculate_bounds(&mut self, tile: usize) -> Result<(), WaterError>;

    fn recalculate_tangents(&mut self, tile: usize) -> Result<(), WaterError>;
}

/// Owns the tile tables, anchors and octaves, and drives the sink each tick.
#[derive(Debug, Clone)]
pub struct WaveAnimator {
    registry: TileRegistry,
    octaves: Vec<Octave>,
    output: Vec<Vec3>,
    schedule: Schedule,
    batch_size: usize,
}

impl WaveAnimator {
    /// Build every tile, register it with the sink and prepare the shared buffers.
    ///
    /// # Arguments
    /// * `sources` - Bounds and transform of each tile, in the order tile ids are assigned
    /// * `config` - Octaves, grid density, UV scale and scheduling
    /// * `sink` - Receives each tile's geometry followed by normals, bounds and tangents
    pub fn setup<S: GeometrySink>(
        sources: &[TileSource],
        config: &WaterConfig,
        sink: &mut S,
    ) -> Result<Self, WaterError> {
        config.validate()?;
        let uv_scale = config.uv_scale();

        let geometry = sources
            .iter()
            .enumerate()
            .map(|(i, source)| build_tile(i, source, config.verts_per_unit, uv_scale))
            .collect::<Result<Vec<_>, _>>()?;

        for (tile, geo) in geometry.iter().enumerate() {
            sink.set_geometry(tile, geo)?;
            sink.recalculate_normals(tile)?;
            sink.recalculate_bounds(tile)?;
            sink.recalculate_tangents(tile)?;
        }

        let registry = TileRegistry::from_geometry(&geometry)?;
        log::info!(
            "water surface ready: {} tiles, {} vertices, {} octaves",
            registry.len(),
            registry.vertex_count(),
            config.octaves.len()
        );

        Ok(Self::new(registry, config.octaves.clone(), config.schedule, config.batch_size))
    }

    /// Wrap an existing registry.
    pub fn new(registry: TileRegistry, octaves: Vec<Octave>, schedule: Schedule, batch_size: usize) -> Self {
        let output = registry.anchors().to_vec();
        Self {
            registry,
            octaves,
            output,
            schedule,
            batch_size: batch_size.max(1),
        }
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn octaves(&self) -> &[Octave] {
        &self.octaves
    }

    /// Replace the octave set used from the next tick on.
    pub fn set_octaves(&mut self, octaves: Vec<Octave>) {
        self.octaves = octaves;
    }

    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    /// Move a tile and tell the sink about it.
    pub fn set_tile_transform<S: GeometrySink>(
        &mut self,
        tile: usize,
        local_to_world: Mat4,
        sink: &mut S,
    ) -> Result<(), WaterError> {
        self.registry.set_local_to_world(tile, local_to_world)?;
        sink.set_local_to_world(tile, local_to_world)
    }

    /// Displaced positions from the last [`compute`](Self::compute).
    pub fn output(&self) -> &[Vec3] {
        &self.output
    }

    /// Fill the output buffer for `time`. Returns once every vertex is written.
    pub fn compute(&mut self, time: f32) -> Result<(), WaterError> {
        let registry = &self.registry;
        let octaves = self.octaves.as_slice();

        match self.schedule {
            Schedule::Parallel => {
                self.output
                    .par_iter_mut()
                    .enumerate()
                    .with_min_len(self.batch_size)
                    .try_for_each(|(index, slot)| {
                        *slot = kernel::displace_index(registry, octaves, time, index)?;
                        Ok(())
                    })
            }
            Schedule::Sequential => {
                for tile in registry.tiles() {
                    let start = tile.vertex_offset;
                    let end = start + tile.vertex_count;
                    for (anchor, slot) in registry.anchors()[start..end]
                        .iter()
                        .zip(&mut self.output[start..end])
                    {
                        *slot = kernel::displace(*anchor, &tile.local_to_world, tile.scale_ratio, octaves, time);
                    }
                }
                Ok(())
            }
        }
    }

    /// Compute the frame for `time` and hand every tile's slice to the sink.
    ///
    /// A non-finite position anywhere in the frame fails the tick before any
    /// tile is handed off.
    ///
    /// # Arguments
    /// * `time` - Animation time in seconds
    /// * `sink` - Receives each tile's displaced positions and a normal recalculation
    pub fn tick<S: GeometrySink>(&mut self, time: f32, sink: &mut S) -> Result<(), WaterError> {
        self.compute(time)?;

        // Reject the whole frame before any tile sees it
        if let Some(index) = self.output.par_iter().position_first(|v| !v.is_finite()) {
            return Err(WaterError::NonFiniteDisplacement {
                tile: self.registry.resolve(index)?,
                index,
            });
        }

        for (id, tile) in self.registry.tiles().iter().enumerate() {
            let slice = &self.output[tile.vertex_offset..tile.vertex_offset + tile.vertex_count];
            sink.set_vertices(id, slice)?;
            sink.recalculate_normals(id)?;
        }

        log::debug!("tick t={:.3}: {} vertices", time, self.output.len());
        Ok(())
    }
}
