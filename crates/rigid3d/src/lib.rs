//! Shape-Matching Rigid Body Simulation
//!
//! Rigid objects are clusters of particles on a regular lattice. Every frame
//! the particles are integrated freely, then a fixed number of substeps pull
//! them back into rigid configurations:
//! 1. Pairwise penetration correction between particles of different objects
//! 2. Shape matching toward the best-fit rigid transform of each object
//! 3. Clamping against the world boundary box with friction and restitution
//!
//! Velocities are rebuilt from the frame's net displacement at the end.
//!
//! # Example
//!
//! ```
//! use rigid3d::{BoxDesc, ObjectState, RigidSimulation3D, SimParams};
//! use glam::Vec3;
//!
//! let mut sim = RigidSimulation3D::with_defaults();
//!
//! // A static pedestal and a cube resting on it
//! sim.create_box(BoxDesc::cube(Vec3::new(0.0, 0.5, 0.0), 0.5).with_state(ObjectState::Static))
//!     .unwrap();
//! let cube = sim.create_box(BoxDesc::cube(Vec3::new(0.0, 1.3, 0.0), 0.2)).unwrap();
//!
//! sim.step(&SimParams { substeps: 4, ..SimParams::default() }).unwrap();
//! let pose = sim.object_pose(cube).unwrap();
//! assert!(pose.center.y > 1.0);
//! ```

pub mod collision;
pub mod constants;
pub mod error;
pub mod integration;
pub mod math;
pub mod object;
pub mod params;
pub mod particle;
pub mod readback;
pub mod serde_utils;
pub mod shape;
pub mod shape_matching;

pub use error::{Resource, SimError};
pub use glam::{Mat3, Quat, Vec3};
pub use object::{BoxDesc, Friction, ObjectId, ObjectRegistry, ObjectState, RigidObject};
pub use params::{BoundaryBox, SimConfig, SimParams};
pub use particle::ParticleStore;
pub use readback::{HostPoses, ObjectPose};

use math::{polar_decompose, rotation_or_identity};

/// Shape-matching rigid body simulation.
pub struct RigidSimulation3D {
    /// All particles, in object blocks
    pub particles: ParticleStore,
    /// All objects, indexed by id
    pub objects: ObjectRegistry,
    /// Settings fixed at creation
    config: SimConfig,
    /// Frames advanced since creation
    pub frame: u32,
}

impl RigidSimulation3D {
    /// Create an empty simulation with the capacities in `config`.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    /// Empty simulation with the reference capacities and gravity.
    pub fn with_defaults() -> Self {
        Self::from_valid_config(SimConfig::default())
    }

    fn from_valid_config(config: SimConfig) -> Self {
        Self {
            particles: ParticleStore::with_capacity(config.max_particles),
            objects: ObjectRegistry::with_capacity(config.max_objects),
            config,
            frame: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Add a box-shaped object and return its id.
    ///
    /// Capacity is checked before anything is allocated: a rejected box
    /// leaves the simulation exactly as it was.
    pub fn create_box(&mut self, desc: BoxDesc) -> Result<ObjectId, SimError> {
        let diameter = self.config.particle_diameter();
        shape::validate_box(desc.center, desc.half_extent, desc.rotation, diameter)?;
        if !(desc.friction.static_coeff.is_finite() && desc.friction.kinetic_coeff.is_finite())
            || !desc.restitution.is_finite()
        {
            return Err(SimError::InvalidShape(format!(
                "material must be finite, got friction {:?} and restitution {}",
                desc.friction, desc.restitution
            )));
        }

        let count = shape::lattice_particle_count(desc.half_extent, diameter);
        if let Err(err) = self.objects.check_room().and_then(|_| self.particles.check_room(count)) {
            log::warn!("rejected box at {:?}: {}", desc.center, err);
            return Err(err);
        }

        let lattice = shape::build_box_lattice(desc.center, desc.half_extent, desc.rotation, diameter)?;
        let id = self.objects.next_id();
        let particle_begin = self.particles.append_lattice(&lattice, id)?;

        let mut object = RigidObject {
            state: desc.state,
            rest_center_of_mass: lattice.rest_center_of_mass,
            rest_rotation: desc.rotation,
            center_of_mass: lattice.rest_center_of_mass,
            rotation: desc.rotation,
            covariance: Mat3::ZERO,
            friction: desc.friction,
            restitution: desc.restitution,
            particle_begin,
            particle_size: lattice.len(),
            mass: lattice.len() as f32,
        };

        // Initial pose, from the same routine the solver uses every substep.
        let (center_of_mass, covariance) = shape_matching::object_covariance(&object, &self.particles);
        object.center_of_mass = center_of_mass;
        object.covariance = covariance;
        object.rotation = rotation_or_identity(polar_decompose(covariance).0);

        let id = self.objects.push(object)?;
        log::info!(
            "object {} created: {:?}, {} particles ({}x{}x{}), rest center {:?}",
            id,
            desc.state,
            lattice.len(),
            lattice.dims.x,
            lattice.dims.y,
            lattice.dims.z,
            lattice.rest_center_of_mass
        );
        Ok(id)
    }

    /// Add a box and give all of its particles `velocity`.
    pub fn create_box_with_velocity(&mut self, desc: BoxDesc, velocity: Vec3) -> Result<ObjectId, SimError> {
        let id = self.create_box(desc)?;
        self.set_initial_velocity(id, velocity)?;
        Ok(id)
    }

    /// Overwrite the velocity of every particle of an object.
    pub fn set_initial_velocity(&mut self, id: ObjectId, velocity: Vec3) -> Result<(), SimError> {
        let range = self.objects.require(id)?.particles();
        self.particles.velocity[range].fill(velocity);
        Ok(())
    }

    /// Put every particle back at rest and restore the poses of the first
    /// `object_count` objects.
    pub fn reset_objects(&mut self, object_count: usize) {
        self.particles.reset_to_rest();
        for object in self.objects.objects.iter_mut().take(object_count) {
            object.reset_pose();
        }
        log::debug!("reset {} particles, {} object poses", self.particles.len(), object_count.min(self.objects.len()));
    }

    /// Reset every particle and every registered object.
    pub fn reset_all(&mut self) {
        self.reset_objects(self.objects.len());
    }

    /// Advance one frame.
    ///
    /// Parameters are validated first; on error nothing is touched.
    pub fn step(&mut self, params: &SimParams) -> Result<(), SimError> {
        params.validate()?;

        // 1. Free flight under gravity
        integration::integrate(&mut self.particles, &self.objects, self.config.gravity, params.dt);

        // 2. Constraint and collision substeps
        for _ in 0..params.substeps {
            self.substep(params);
        }

        // 3. Velocities from net displacement
        integration::reconstruct_velocities(&mut self.particles, &self.objects, params.dt, params.damping);

        self.frame += 1;
        log::debug!(
            "frame {}: {} particles, {} objects, {} substeps",
            self.frame,
            self.particles.len(),
            self.objects.len(),
            params.substeps
        );
        Ok(())
    }

    fn substep(&mut self, params: &SimParams) {
        // Compute against one snapshot, then commit.
        let corrections = collision::pairwise_corrections(&self.particles, &self.objects, self.config.particle_radius);
        collision::apply_corrections(&mut self.particles, &corrections);

        shape_matching::solve_shape_matching(&mut self.particles, &mut self.objects, params.correction_rate);

        collision::resolve_boundary(&mut self.particles, &self.objects, &params.boundary);
    }

    pub fn object(&self, id: ObjectId) -> Option<&RigidObject> {
        self.objects.get(id)
    }

    /// Current center of mass and rotation of an object.
    pub fn object_pose(&self, id: ObjectId) -> Option<ObjectPose> {
        self.objects.get(id).map(ObjectPose::from_object)
    }

    /// Readback buffers sized to the object capacity.
    pub fn host_poses(&self) -> HostPoses {
        HostPoses::with_capacity(self.config.max_objects)
    }

    /// Copy the first `object_count` poses into host arrays.
    pub fn copy_poses_to_host(&self, object_count: usize, host: &mut HostPoses) -> Result<(), SimError> {
        readback::copy_poses(&self.objects, object_count, host)
    }

    pub fn particle_positions(&self) -> &[Vec3] {
        &self.particles.position
    }

    /// Positions as `[x0, y0, z0, x1, ...]` for direct upload.
    pub fn particle_positions_flat(&self) -> &[f32] {
        readback::flatten_positions(&self.particles.position)
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }
}

impl Default for RigidSimulation3D {
    fn default() -> Self {
        Self::with_defaults()
    }
}
