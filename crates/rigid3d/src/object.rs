//! Rigid object registry.
//!
//! Each object owns a contiguous block of particles and carries its rest
//! pose, its current pose (rewritten every substep by shape matching) and
//! its material.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_KINETIC_FRICTION, DEFAULT_RESTITUTION, DEFAULT_STATIC_FRICTION};
use crate::error::{Resource, SimError};
use crate::serde_utils;

/// Stable handle for a registered object. Ids are issued in creation
/// order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulation class of an object.
///
/// Only `Static` changes solver behavior: static particles are never
/// integrated, corrected or clamped. `Kinematic` is accepted as a tag and
/// solved exactly like `Dynamic`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectState {
    Static,
    Kinematic,
    #[default]
    Dynamic,
}

impl ObjectState {
    #[inline]
    pub fn is_static(self) -> bool {
        self == ObjectState::Static
    }
}

/// Coulomb-style friction pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Friction {
    /// Static coefficient (mu_s).
    pub static_coeff: f32,
    /// Kinetic coefficient (mu_k).
    pub kinetic_coeff: f32,
}

impl Friction {
    pub fn new(static_coeff: f32, kinetic_coeff: f32) -> Self {
        Self { static_coeff, kinetic_coeff }
    }
}

impl Default for Friction {
    fn default() -> Self {
        Self::new(DEFAULT_STATIC_FRICTION, DEFAULT_KINETIC_FRICTION)
    }
}

/// Creation request for a box-shaped object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoxDesc {
    #[serde(with = "serde_utils::vec3")]
    pub center: Vec3,
    /// Half side lengths; snapped outward to whole particle diameters.
    #[serde(with = "serde_utils::vec3")]
    pub half_extent: Vec3,
    #[serde(with = "serde_utils::mat3_rows", default = "identity")]
    pub rotation: Mat3,
    #[serde(default)]
    pub state: ObjectState,
    #[serde(default)]
    pub friction: Friction,
    #[serde(default = "default_restitution")]
    pub restitution: f32,
}

fn identity() -> Mat3 {
    Mat3::IDENTITY
}

fn default_restitution() -> f32 {
    DEFAULT_RESTITUTION
}

impl BoxDesc {
    /// Dynamic, axis-aligned box with reference material.
    pub fn new(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            center,
            half_extent,
            rotation: Mat3::IDENTITY,
            state: ObjectState::Dynamic,
            friction: Friction::default(),
            restitution: DEFAULT_RESTITUTION,
        }
    }

    /// Cube with equal half-extents on every axis.
    pub fn cube(center: Vec3, half_extent: f32) -> Self {
        Self::new(center, Vec3::splat(half_extent))
    }

    pub fn with_rotation(mut self, rotation: Mat3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_quat(self, rotation: Quat) -> Self {
        self.with_rotation(Mat3::from_quat(rotation))
    }

    pub fn with_state(mut self, state: ObjectState) -> Self {
        self.state = state;
        self
    }

    pub fn with_friction(mut self, friction: Friction) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}

/// A registered rigid object.
#[derive(Clone, Debug)]
pub struct RigidObject {
    pub state: ObjectState,
    pub rest_center_of_mass: Vec3,
    /// Rotation supplied at creation.
    pub rest_rotation: Mat3,
    pub center_of_mass: Vec3,
    /// Best-fit rotation from the last shape-matching pass.
    pub rotation: Mat3,
    /// Scratch covariance from the last shape-matching pass.
    pub covariance: Mat3,
    pub friction: Friction,
    pub restitution: f32,
    pub particle_begin: usize,
    pub particle_size: usize,
    /// Particle count (unit particle mass).
    pub mass: f32,
}

impl RigidObject {
    /// Particle index range owned by this object.
    #[inline]
    pub fn particles(&self) -> std::ops::Range<usize> {
        self.particle_begin..self.particle_begin + self.particle_size
    }

    /// Restore the pose recorded at creation.
    pub fn reset_pose(&mut self) {
        self.center_of_mass = self.rest_center_of_mass;
        self.rotation = self.rest_rotation;
    }
}

/// Fixed-capacity table of objects, indexed by [`ObjectId`].
#[derive(Clone, Debug)]
pub struct ObjectRegistry {
    pub objects: Vec<RigidObject>,
    capacity: usize,
}

impl ObjectRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Id the next registered object will receive.
    pub fn next_id(&self) -> ObjectId {
        ObjectId(self.objects.len() as u32)
    }

    /// Fail unless one more object fits.
    pub fn check_room(&self) -> Result<(), SimError> {
        if self.objects.len() >= self.capacity {
            return Err(SimError::CapacityExceeded {
                resource: Resource::Objects,
                requested: self.objects.len() + 1,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, object: RigidObject) -> Result<ObjectId, SimError> {
        self.check_room()?;
        let id = self.next_id();
        self.objects.push(object);
        Ok(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&RigidObject> {
        self.objects.get(id.index())
    }

    /// Look up an object, reporting unknown ids as errors.
    pub fn require(&self, id: ObjectId) -> Result<&RigidObject, SimError> {
        self.get(id).ok_or(SimError::UnknownObject(id))
    }

    /// State of the object owning a particle.
    #[inline]
    pub fn state_of(&self, owner: ObjectId) -> ObjectState {
        self.objects[owner.index()].state
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &RigidObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i as u32), object))
    }
}
