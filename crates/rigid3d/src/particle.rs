//! Fixed-capacity particle storage.
//!
//! Struct-of-arrays so each solver pass can borrow only the fields it
//! touches (positions immutably while staging corrections, velocities
//! mutably during integration, and so on).

use glam::Vec3;

use crate::error::{Resource, SimError};
use crate::object::ObjectId;
use crate::shape::BoxLattice;

/// All particles in the simulation, indexed `0..len()`.
///
/// Particles are only ever appended in whole object blocks; nothing is
/// removed until the store is dropped.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    /// Current world position.
    pub position: Vec<Vec3>,
    /// Position at the start of the frame's integration, for velocity reconstruction.
    pub position_prev: Vec<Vec3>,
    /// World-space rest position, fixed at creation.
    pub rest_position: Vec<Vec3>,
    pub velocity: Vec<Vec3>,
    /// Owning object; blocks of equal owners are contiguous.
    pub owner: Vec<ObjectId>,
    /// Approximate signed distance to the owner's surface (<= 0).
    pub signed_distance: Vec<f32>,
    /// Approximate surface normal at creation.
    pub distance_gradient: Vec<Vec3>,
    capacity: usize,
}

impl ParticleStore {
    /// Create an empty store that accepts at most `capacity` particles.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            position: Vec::with_capacity(capacity),
            position_prev: Vec::with_capacity(capacity),
            rest_position: Vec::with_capacity(capacity),
            velocity: Vec::with_capacity(capacity),
            owner: Vec::with_capacity(capacity),
            signed_distance: Vec::with_capacity(capacity),
            distance_gradient: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Particles that can still be added.
    pub fn remaining(&self) -> usize {
        self.capacity - self.len()
    }

    /// Fail unless `count` more particles fit.
    pub fn check_room(&self, count: usize) -> Result<(), SimError> {
        if count > self.remaining() {
            return Err(SimError::CapacityExceeded {
                resource: Resource::Particles,
                requested: self.len() + count,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Append a lattice as one contiguous block owned by `owner`.
    ///
    /// Returns the index of the first appended particle.
    pub fn append_lattice(&mut self, lattice: &BoxLattice, owner: ObjectId) -> Result<usize, SimError> {
        self.check_room(lattice.len())?;

        let begin = self.len();
        self.position.extend_from_slice(&lattice.positions);
        self.position_prev.extend_from_slice(&lattice.positions);
        self.rest_position.extend_from_slice(&lattice.positions);
        self.velocity.resize(begin + lattice.len(), Vec3::ZERO);
        self.owner.resize(begin + lattice.len(), owner);
        self.signed_distance.extend_from_slice(&lattice.signed_distances);
        self.distance_gradient.extend_from_slice(&lattice.gradients);
        Ok(begin)
    }

    /// Zero velocities and put every particle back at its rest position.
    pub fn reset_to_rest(&mut self) {
        self.position.copy_from_slice(&self.rest_position);
        self.position_prev.copy_from_slice(&self.rest_position);
        self.velocity.fill(Vec3::ZERO);
    }

    /// True if the particle is on its owner's surface.
    #[inline]
    pub fn is_surface(&self, index: usize, eps: f32) -> bool {
        self.signed_distance[index].abs() < eps
    }
}
