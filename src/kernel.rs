//! Per-vertex Gerstner displacement.
//!
//! Every vertex is displaced from its rest anchor, never from the previous
//! frame, so the result depends only on the anchor, the owning tile, the
//! octave set and the time.

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::PI;

use crate::error::WaterError;
use crate::octave::Octave;
use crate::registry::TileRegistry;

/// Gravitational acceleration used for the deep-water phase speed.
pub const GRAVITY: f32 = 9.8;

/// Displace one anchor.
///
/// The phase is evaluated at the anchor's world position; the returned point
/// stays in the tile's local space with the summed horizontal offsets applied
/// and the height replaced by the summed vertical offset.
#[inline]
pub fn displace(anchor: Vec3, local_to_world: &Mat4, ratio: Vec2, octaves: &[Octave], time: f32) -> Vec3 {
    // 3x4 point transform: rows 0..3 only, w is ignored
    let world = (*local_to_world * anchor.extend(1.0)).truncate();
    let offset = displacement(Vec2::new(world.x, world.z), ratio, octaves, time);
    Vec3::new(anchor.x + offset.x, offset.y, anchor.z + offset.z)
}

/// Summed `(x, y, z)` offsets of all enabled octaves at a world-space xz position.
pub fn displacement(world_xz: Vec2, ratio: Vec2, octaves: &[Octave], time: f32) -> Vec3 {
    let mut incr = Vec3::ZERO;

    for octave in octaves {
        if octave.wavelength == 0.0 {
            continue;
        }
        let Some(d) = octave.direction.try_normalize() else {
            continue;
        };

        let k = 2.0 * PI / octave.wavelength;
        let c = (GRAVITY / k).sqrt();
        let f = k * (d.dot(world_xz) - c * time);
        let a = octave.steepness / k;

        incr.x += d.x * (a * (f * ratio.x).cos());
        incr.y += a * (f * ratio.y).sin();
        incr.z += d.y * (a * (f * ratio.y).cos());
    }

    incr
}

/// Kernel body for one global vertex index.
#[inline]
pub fn displace_index(registry: &TileRegistry, octaves: &[Octave], time: f32, index: usize) -> Result<Vec3, WaterError> {
    let (local_to_world, ratio) = registry.lookup(index)?;
    Ok(displace(registry.anchors()[index], local_to_world, ratio, octaves, time))
}
