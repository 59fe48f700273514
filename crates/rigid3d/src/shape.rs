//! Box particle lattices with per-particle signed distance and gradient.
//!
//! The distance field is the cheap per-axis approximation the collision
//! tolerances are tuned against, not a true Euclidean SDF:
//! - Surface particles get distance 0 and a gradient along the axis (or
//!   blend of axes) whose face they sit on.
//! - Interior particles keep only the single axis with the smallest face
//!   distance; the distance is minus that face distance.
//!
//! Distances are computed on the axis-aligned box; positions and gradients
//! are then rotated into the world about the box center.

use glam::{Mat3, UVec3, Vec3};

use crate::constants::EPSILON;
use crate::error::SimError;

/// Particles generated for one box, in lattice order.
#[derive(Clone, Debug)]
pub struct BoxLattice {
    /// World-space rest positions.
    pub positions: Vec<Vec3>,
    /// Signed distance to the box surface (<= 0).
    pub signed_distances: Vec<f32>,
    /// Approximate outward surface normal, rotated into world space.
    pub gradients: Vec<Vec3>,
    /// Mean of `positions`.
    pub rest_center_of_mass: Vec3,
    /// Half-extents after snapping to a whole number of particle diameters.
    pub half_extent: Vec3,
    /// Lattice points along each axis.
    pub dims: UVec3,
}

impl BoxLattice {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Number of lattice points a box would produce, without building it.
///
/// Used to check capacity before any state is touched.
pub fn lattice_dims(half_extent: Vec3, diameter: f32) -> UVec3 {
    // Float to int casts saturate, so oversized boxes cannot overflow here.
    ((half_extent * 2.0 / diameter).ceil() + Vec3::ONE).as_uvec3()
}

/// Particle count of [`lattice_dims`], saturating instead of overflowing.
pub fn lattice_particle_count(half_extent: Vec3, diameter: f32) -> usize {
    let dims = lattice_dims(half_extent, diameter);
    let count = (dims.x as u64)
        .saturating_mul(dims.y as u64)
        .saturating_mul(dims.z as u64);
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// Build the particle lattice for a box.
///
/// Half-extents are snapped outward so the particle diameter evenly
/// divides each side; a zero half-extent on an axis gives a single layer.
pub fn build_box_lattice(
    center: Vec3,
    half_extent: Vec3,
    rotation: Mat3,
    diameter: f32,
) -> Result<BoxLattice, SimError> {
    validate_box(center, half_extent, rotation, diameter)?;

    let steps = (half_extent * 2.0 / diameter).ceil();
    let snapped = steps * diameter * 0.5;
    let dims = lattice_dims(half_extent, diameter);
    let count = lattice_particle_count(half_extent, diameter);

    // Gradients are covectors: they transform with the inverse transpose.
    let normal_transform = rotation.inverse().transpose();

    let mut lattice = BoxLattice {
        positions: Vec::with_capacity(count),
        signed_distances: Vec::with_capacity(count),
        gradients: Vec::with_capacity(count),
        rest_center_of_mass: Vec3::ZERO,
        half_extent: snapped,
        dims,
    };

    let mut position_sum = Vec3::ZERO;
    for i in 0..dims.x {
        for j in 0..dims.y {
            for k in 0..dims.z {
                // Box-local position, relative to the center.
                let local = -snapped + Vec3::new(i as f32, j as f32, k as f32) * diameter;
                let (distance, gradient) = axis_aligned_distance(local, snapped);

                let world = rotation * local + center;
                position_sum += world;

                lattice.positions.push(world);
                lattice.signed_distances.push(distance);
                lattice.gradients.push(normal_transform * gradient);
            }
        }
    }

    lattice.rest_center_of_mass = position_sum / count as f32;
    Ok(lattice)
}

/// Signed distance and gradient of a box-local point against the box
/// `[-half_extent, half_extent]`.
fn axis_aligned_distance(local: Vec3, half_extent: Vec3) -> (f32, Vec3) {
    let low = -half_extent;
    let high = half_extent;

    let mut dir = Vec3::ZERO;
    let mut sign = Vec3::ZERO;
    let mut min_distance = f32::INFINITY;
    for d in 0..3 {
        // Face on the nearer side of this axis.
        let distance = if local[d] - low[d] > high[d] - local[d] {
            sign[d] = 1.0;
            high[d] - local[d]
        } else {
            sign[d] = -1.0;
            low[d] - local[d]
        };
        dir[d] = distance;
        min_distance = min_distance.min(distance.abs());
    }

    if min_distance < EPSILON {
        // Surface particle: unit direction on every axis touching a face.
        for d in 0..3 {
            dir[d] = if dir[d].abs() > EPSILON { 0.0 } else { sign[d] };
        }
        return (0.0, dir.normalize_or_zero());
    }

    // Interior particle: the last axis tied for the minimum wins.
    let mut remaining = 0;
    for d in 0..3 {
        if (dir[d].abs() - min_distance).abs() < EPSILON {
            remaining = d;
        }
    }
    for d in 0..3 {
        if d != remaining {
            dir[d] = 0.0;
        }
    }
    (-dir.length(), dir.normalize_or_zero())
}

/// Reject boxes that cannot produce a lattice.
pub fn validate_box(center: Vec3, half_extent: Vec3, rotation: Mat3, diameter: f32) -> Result<(), SimError> {
    if !center.is_finite() {
        return Err(SimError::InvalidShape(format!("non-finite center {:?}", center)));
    }
    if !half_extent.is_finite() || half_extent.min_element() < 0.0 {
        return Err(SimError::InvalidShape(format!(
            "half-extent must be finite and non-negative, got {:?}",
            half_extent
        )));
    }
    if !(diameter > 0.0) {
        return Err(SimError::InvalidShape(format!("particle diameter {} is not positive", diameter)));
    }
    if !rotation.is_finite() || rotation.determinant().abs() < EPSILON {
        return Err(SimError::InvalidShape("rotation is singular".to_string()));
    }
    Ok(())
}
