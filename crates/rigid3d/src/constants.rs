//! Reference constants for the shape-matching solver.
//!
//! Lengths are in world units (the host engine's meters), times in seconds.
//! Capacities and frame parameters here are the defaults used by
//! [`SimConfig`](crate::params::SimConfig) and
//! [`SimParams`](crate::params::SimParams).

use glam::Vec3;

/// Gravity acceleration (world units/s^2), negative Y.
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);

/// Radius of every lattice particle.
pub const PARTICLE_RADIUS: f32 = 0.05;

/// Tolerance for "on the surface", "zero rotation" and "not moving" checks.
pub const EPSILON: f32 = 1e-6;

/// Additive guard on the normalizing denominator of pairwise corrections.
pub const PAIR_DIRECTION_GUARD: f32 = 0.1;

/// Fraction of the penetration depth applied to each particle of a pair.
pub const PAIR_CORRECTION_SCALE: f32 = 0.5;

// =============================================================================
// CAPACITIES
// =============================================================================

/// Default particle capacity.
pub const MAX_PARTICLES: usize = 20_000;

/// Default object capacity.
pub const MAX_OBJECTS: usize = 500;

// =============================================================================
// FRAME DEFAULTS
// =============================================================================

/// Default frame time step (60 Hz host).
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Default fraction of the distance to the shape-matching goal applied per substep.
pub const DEFAULT_CORRECTION_RATE: f32 = 0.8;

/// Default per-frame velocity damping factor.
pub const DEFAULT_DAMPING: f32 = 0.95;

/// Default number of constraint/collision substeps per frame.
pub const DEFAULT_SUBSTEPS: u32 = 30;

/// Half-size of the default world boundary box on X and Z.
pub const BOUNDARY_HALF_SIZE: f32 = 1000.0;

// =============================================================================
// MATERIAL DEFAULTS
// =============================================================================

/// Default static friction coefficient.
pub const DEFAULT_STATIC_FRICTION: f32 = 1.0;

/// Default kinetic friction coefficient.
pub const DEFAULT_KINETIC_FRICTION: f32 = 1.0;

/// Default restitution.
pub const DEFAULT_RESTITUTION: f32 = 1.0;
