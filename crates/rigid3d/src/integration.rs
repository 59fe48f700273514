//! Frame-level particle integration: semi-implicit Euler at the start of a
//! frame and velocity reconstruction from position deltas at the end.

use glam::Vec3;
use rayon::prelude::*;

use crate::constants::EPSILON;
use crate::object::ObjectRegistry;
use crate::particle::ParticleStore;

/// Apply gravity and advance positions by one frame.
///
/// Records the pre-step position in `position_prev`. Static particles are
/// left untouched.
pub fn integrate(particles: &mut ParticleStore, objects: &ObjectRegistry, gravity: Vec3, dt: f32) {
    let ParticleStore {
        position,
        position_prev,
        velocity,
        owner,
        ..
    } = particles;

    position
        .par_iter_mut()
        .zip(position_prev.par_iter_mut())
        .zip(velocity.par_iter_mut())
        .zip(owner.par_iter())
        .for_each(|(((x, x_prev), v), &owner)| {
            if objects.state_of(owner).is_static() {
                return;
            }
            *v += gravity * dt;
            *x_prev = *x;
            *x += *v * dt;
        });
}

/// Derive velocities from the frame's net displacement, then damp them.
///
/// Displacements shorter than [`EPSILON`] are treated as rest: the particle
/// snaps back to `position_prev` with zero velocity, which keeps resting
/// stacks from jittering.
pub fn reconstruct_velocities(particles: &mut ParticleStore, objects: &ObjectRegistry, dt: f32, damping: f32) {
    let ParticleStore {
        position,
        position_prev,
        velocity,
        owner,
        ..
    } = particles;

    position
        .par_iter_mut()
        .zip(position_prev.par_iter())
        .zip(velocity.par_iter_mut())
        .zip(owner.par_iter())
        .for_each(|(((x, x_prev), v), &owner)| {
            if objects.state_of(owner).is_static() {
                return;
            }
            let dx = *x - *x_prev;
            if dx.length() < EPSILON {
                *v = Vec3::ZERO;
                *x = *x_prev;
            } else {
                *v = dx / dt;
            }
            *v *= damping;
        });
}
