use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// One summed Gerstner wave component.
///
/// `direction` is stored as configured and normalized when the kernel uses it.
/// A `wavelength` of exactly zero marks a disabled slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Octave {
    pub direction: Vec2,
    pub steepness: f32,
    pub wavelength: f32,
}

impl Octave {
    pub fn new(direction: Vec2, steepness: f32, wavelength: f32) -> Self {
        Self {
            direction,
            steepness,
            wavelength,
        }
    }

    /// Whether this octave contributes any displacement.
    pub fn is_enabled(&self) -> bool {
        self.wavelength != 0.0 && self.direction != Vec2::ZERO
    }

    /// Wave number `k = 2π / wavelength`.
    #[inline]
    pub fn wave_number(&self) -> f32 {
        2.0 * PI / self.wavelength
    }
}

/// Generate a seeded set of octaves around a base direction.
///
/// Wavelength shrinks for each successive octave, direction is jittered by up
/// to `spread_degrees` either side of the base angle and steepness is jittered
/// by ±20% and capped at 1.
///
/// # Arguments
/// * `count` - Number of octaves to generate
/// * `base_wavelength` - Wavelength of the first octave
/// * `base_steepness` - Steepness before jitter
/// * `base_direction_degrees` - Direction around which octaves are spread
/// * `spread_degrees` - Maximum direction jitter either side of the base angle
/// * `seed` - Seed for the random generator, equal seeds give equal sets
pub fn generate_octaves(
    count: usize,
    base_wavelength: f32,
    base_steepness: f32,
    base_direction_degrees: f32,
    spread_degrees: f32,
    seed: u64,
) -> Vec<Octave> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut octaves = Vec::with_capacity(count);

    for i in 0..count {
        // Shorter waves for higher octaves
        let wavelength = base_wavelength / (1.0 + i as f32 * 0.5);

        let jitter = if spread_degrees > 0.0 {
            rng.gen_range(-spread_degrees..=spread_degrees)
        } else {
            0.0
        };
        let angle = (base_direction_degrees + jitter).to_radians();
        let direction = Vec2::new(angle.cos(), angle.sin());

        let steepness = base_steepness * rng.gen_range(0.8..1.2);

        octaves.push(Octave {
            direction,
            steepness: steepness.clamp(0.0, 1.0),
            wavelength,
        });
    }

    octaves
}
