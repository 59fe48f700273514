//! Simulation configuration and per-frame parameters.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SimError;
use crate::serde_utils;

/// Settings fixed when the simulation is created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Particle capacity; creation beyond it fails.
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    /// Object capacity; creation beyond it fails.
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
    /// Particle radius. Lattice spacing is one diameter.
    #[serde(default = "default_particle_radius")]
    pub particle_radius: f32,
    #[serde(with = "serde_utils::vec3", default = "default_gravity")]
    pub gravity: Vec3,
}

fn default_max_particles() -> usize {
    MAX_PARTICLES
}
fn default_max_objects() -> usize {
    MAX_OBJECTS
}
fn default_particle_radius() -> f32 {
    PARTICLE_RADIUS
}
fn default_gravity() -> Vec3 {
    GRAVITY
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_particles: MAX_PARTICLES,
            max_objects: MAX_OBJECTS,
            particle_radius: PARTICLE_RADIUS,
            gravity: GRAVITY,
        }
    }
}

impl SimConfig {
    pub fn with_capacity(max_particles: usize, max_objects: usize) -> Self {
        Self {
            max_particles,
            max_objects,
            ..Self::default()
        }
    }

    #[inline]
    pub fn particle_diameter(&self) -> f32 {
        self.particle_radius * 2.0
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_particles == 0 || self.max_objects == 0 {
            return Err(SimError::InvalidParams("capacities must be non-zero".to_string()));
        }
        if !(self.particle_radius > 0.0) || !self.particle_radius.is_finite() {
            return Err(SimError::InvalidParams(format!(
                "particle radius must be positive, got {}",
                self.particle_radius
            )));
        }
        if !self.gravity.is_finite() {
            return Err(SimError::InvalidParams("gravity must be finite".to_string()));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

/// World bounds particles are clamped against.
///
/// Axes flagged in `open_upper` have no upper bound; infinite bounds are
/// allowed on any side and serialize as `null`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryBox {
    #[serde(with = "serde_utils::lower_bound")]
    pub min: Vec3,
    #[serde(with = "serde_utils::upper_bound")]
    pub max: Vec3,
    #[serde(default = "default_open_upper")]
    pub open_upper: [bool; 3],
}

fn default_open_upper() -> [bool; 3] {
    [false, true, false]
}

impl Default for BoundaryBox {
    fn default() -> Self {
        Self {
            min: Vec3::new(-BOUNDARY_HALF_SIZE, 0.0, -BOUNDARY_HALF_SIZE),
            max: Vec3::splat(BOUNDARY_HALF_SIZE),
            open_upper: default_open_upper(),
        }
    }
}

impl BoundaryBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            open_upper: default_open_upper(),
        }
    }

    /// Only a ground plane at height `y`; every other side is unbounded.
    pub fn ground(y: f32) -> Self {
        Self {
            min: Vec3::new(f32::NEG_INFINITY, y, f32::NEG_INFINITY),
            max: Vec3::INFINITY,
            open_upper: [true, true, true],
        }
    }

    /// Whether the upper bound on `axis` is enforced.
    #[inline]
    pub fn clamps_upper(&self, axis: usize) -> bool {
        !self.open_upper[axis]
    }
}

/// Parameters for one frame advance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimParams {
    /// Frame time step (s).
    pub dt: f32,
    /// Fraction of the distance to the shape-matching goal applied per substep (0-1).
    pub correction_rate: f32,
    /// Velocity multiplier applied once per frame (0-1).
    pub damping: f32,
    /// Constraint/collision iterations per frame.
    pub substeps: u32,
    #[serde(default)]
    pub boundary: BoundaryBox,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            correction_rate: DEFAULT_CORRECTION_RATE,
            damping: DEFAULT_DAMPING,
            substeps: DEFAULT_SUBSTEPS,
            boundary: BoundaryBox::default(),
        }
    }
}

impl SimParams {
    pub fn with_boundary(mut self, boundary: BoundaryBox) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(SimError::InvalidParams(format!("dt must be positive, got {}", self.dt)));
        }
        if self.substeps == 0 {
            return Err(SimError::InvalidParams("substeps must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.correction_rate) {
            return Err(SimError::InvalidParams(format!(
                "correction rate must be in [0, 1], got {}",
                self.correction_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(SimError::InvalidParams(format!(
                "damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        if self.boundary.min.is_nan() || self.boundary.max.is_nan() {
            return Err(SimError::InvalidParams("boundary box contains NaN".to_string()));
        }
        Ok(())
    }

    /// Save parameters to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load parameters from JSON file
    pub fn load_json(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}
