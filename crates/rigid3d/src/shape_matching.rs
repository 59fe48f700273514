//! Shape matching: pull each object's particles toward the best rigid fit
//! of its rest configuration.
//!
//! For every object:
//! 1. Center of mass of the current positions (unit particle mass)
//! 2. Covariance `A = sum (x - c) (x0 - c0)^T`
//! 3. Best-fit rotation `R` from the polar decomposition of `A`
//! 4. Goal `c + R (x0 - c0)`; each particle moves a fraction of the way there
//!
//! Reference: "Meshless Deformations Based on Shape Matching", Mueller et al., 2005

use glam::{Mat3, Vec3};
use rayon::prelude::*;

use crate::math::{outer_product, polar_decompose, rotation_or_identity};
use crate::object::{ObjectRegistry, RigidObject};
use crate::particle::ParticleStore;

/// Recompute center of mass, covariance and rotation of every object from
/// the current particle positions.
///
/// Each object sums its own particle block in index order, so results do
/// not depend on thread scheduling.
pub fn update_object_poses(objects: &mut ObjectRegistry, particles: &ParticleStore) {
    objects.objects.par_iter_mut().for_each(|object| {
        let (center_of_mass, covariance) = object_covariance(object, particles);
        let (rotation, _stretch) = polar_decompose(covariance);

        object.center_of_mass = center_of_mass;
        object.covariance = covariance;
        object.rotation = rotation_or_identity(rotation);
    });
}

/// Current center of mass and covariance of one object.
pub fn object_covariance(object: &RigidObject, particles: &ParticleStore) -> (Vec3, Mat3) {
    let range = object.particles();
    let positions = &particles.position[range.clone()];
    let rest_positions = &particles.rest_position[range];

    if positions.is_empty() || object.mass <= 0.0 {
        return (object.rest_center_of_mass, Mat3::ZERO);
    }

    let center_of_mass = positions.iter().copied().sum::<Vec3>() / object.mass;

    let mut covariance = Mat3::ZERO;
    for (x, x0) in positions.iter().zip(rest_positions) {
        covariance += outer_product(*x - center_of_mass, *x0 - object.rest_center_of_mass);
    }
    (center_of_mass, covariance)
}

/// Goal position of a particle given its owner's current pose.
#[inline]
pub fn goal_position(object: &RigidObject, rest_position: Vec3) -> Vec3 {
    object.center_of_mass + object.rotation * (rest_position - object.rest_center_of_mass)
}

/// Move every non-static particle `correction_rate` of the way to its goal.
///
/// Reads only the poses computed by [`update_object_poses`], never other
/// particles, so the pass is order independent.
pub fn apply_goal_correction(particles: &mut ParticleStore, objects: &ObjectRegistry, correction_rate: f32) {
    let ParticleStore {
        position,
        rest_position,
        owner,
        ..
    } = particles;

    position
        .par_iter_mut()
        .zip(rest_position.par_iter())
        .zip(owner.par_iter())
        .for_each(|((x, x0), &owner)| {
            let object = &objects.objects[owner.index()];
            if object.state.is_static() {
                return;
            }
            let goal = goal_position(object, *x0);
            *x += (goal - *x) * correction_rate;
        });
}

/// One shape-matching pass: refresh poses, then correct positions.
pub fn solve_shape_matching(particles: &mut ParticleStore, objects: &mut ObjectRegistry, correction_rate: f32) {
    update_object_poses(objects, particles);
    apply_goal_correction(particles, objects, correction_rate);
}
