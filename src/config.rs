//! Water surface configuration, loadable from RON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::WaterError;
use crate::octave::Octave;

/// Default number of vertices handed to a worker at a time.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// How the displacement kernel is dispatched each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Rayon fan-out/join over the whole vertex range.
    #[default]
    Parallel,
    /// Single-threaded, tile by tile.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub octaves: Vec<Octave>,
    /// Grid vertices per world unit along each axis.
    pub verts_per_unit: u32,
    /// UV ping-pong period in grid cells. Derived from density when unset.
    pub uv_scale: Option<f32>,
    /// Minimum vertices per parallel work item.
    pub batch_size: usize,
    pub schedule: Schedule,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            octaves: Vec::new(),
            verts_per_unit: 10,
            uv_scale: None,
            batch_size: DEFAULT_BATCH_SIZE,
            schedule: Schedule::Parallel,
        }
    }
}

impl WaterConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron(text: &str) -> Result<Self, WaterError> {
        let config: WaterConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a RON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WaterError> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Effective UV period.
    pub fn uv_scale(&self) -> f32 {
        self.uv_scale
            .unwrap_or(2.0 * self.verts_per_unit as f32 * 5.0)
    }

    pub fn validate(&self) -> Result<(), WaterError> {
        if self.verts_per_unit == 0 {
            return Err(WaterError::InvalidConfig(
                "verts_per_unit must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(WaterError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if let Some(scale) = self.uv_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(WaterError::InvalidConfig(format!(
                    "uv_scale must be positive, got {}",
                    scale
                )));
            }
        }
        for (i, octave) in self.octaves.iter().enumerate() {
            if !octave.direction.is_finite()
                || !octave.steepness.is_finite()
                || !octave.wavelength.is_finite()
            {
                return Err(WaterError::InvalidConfig(format!(
                    "octave {} has non-finite parameters",
                    i
                )));
            }
            // Zero marks a disabled slot; negative makes the phase speed NaN
            if octave.wavelength < 0.0 {
                return Err(WaterError::InvalidConfig(format!(
                    "octave {} has negative wavelength {}",
                    i, octave.wavelength
                )));
            }
            if !octave.is_enabled() {
                log::warn!("octave {} is disabled (zero wavelength or direction)", i);
            }
        }
        Ok(())
    }
}
