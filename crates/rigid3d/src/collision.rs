//! Contact response: pairwise penetration correction between objects and
//! clamping against the world boundary box.
//!
//! The pairwise pass follows the compute-then-commit pattern. Every
//! particle's correction is computed against the same position snapshot
//! and staged in a delta buffer; positions change only in the apply pass.

use glam::Vec3;
use rayon::prelude::*;

use crate::constants::{EPSILON, PAIR_CORRECTION_SCALE, PAIR_DIRECTION_GUARD};
use crate::object::ObjectRegistry;
use crate::params::BoundaryBox;
use crate::particle::ParticleStore;

/// Coulomb friction on a positional update `p` with tangential part `vt`.
///
/// Below the static threshold `stress * mu_s` the tangential part is
/// removed entirely; above it, it is reduced by at most `stress * mu_k`.
#[inline]
fn apply_friction(p: Vec3, vt: Vec3, stress: f32, mu_s: f32, mu_k: f32) -> Vec3 {
    let vt_len = vt.length();
    if vt_len < stress * mu_s || vt_len <= 0.0 {
        p - vt
    } else {
        p - vt * (stress * mu_k / vt_len).min(1.0)
    }
}

/// Stage the pairwise correction of every particle.
///
/// Exhaustive O(n^2) scan: particle `i` is tested against every particle
/// `j` of a different object, in index order. A pair is in contact when
/// closer than `particle_radius` or than the sum of the two particles'
/// distance margins. Surface-surface contacts use one particle diameter as
/// the rest distance and get a friction response from the product of the
/// two objects' coefficients.
///
/// Pair friction acts on the correction accumulated so far for `i`. The
/// normal is the raw separation `x_j - x_i` and the stress is the signed
/// gap `dist - diameter`, which is negative for every surface contact.
/// With that stress the static branch never fires and the kinetic scale
/// stays below 1, so the tangential part is pushed further along itself
/// by `|gap| * mu_k`.
///
/// Static particles receive a zero correction.
pub fn pairwise_corrections(
    particles: &ParticleStore,
    objects: &ObjectRegistry,
    particle_radius: f32,
) -> Vec<Vec3> {
    let particle_diameter = particle_radius * 2.0;
    let positions = &particles.position;
    let owners = &particles.owner;
    let margins = &particles.signed_distance;

    (0..particles.len())
        .into_par_iter()
        .map(|i| {
            let owner_i = owners[i];
            let object_i = &objects.objects[owner_i.index()];
            if object_i.state.is_static() {
                return Vec3::ZERO;
            }

            let xi = positions[i];
            let margin_i = margins[i].abs();
            let surface_i = particles.is_surface(i, EPSILON);
            let mut delta = Vec3::ZERO;

            for j in 0..positions.len() {
                let owner_j = owners[j];
                if owner_j == owner_i {
                    continue;
                }

                let pij = xi - positions[j];
                let dist = pij.length();
                let margin_j = margins[j].abs();
                let margin_sum = margin_i + margin_j;
                if !(dist < particle_radius || dist < margin_sum) {
                    continue;
                }

                let surface_pair = surface_i && particles.is_surface(j, EPSILON);
                let depth = if surface_pair {
                    dist - particle_diameter
                } else {
                    dist - margin_sum
                };

                delta += -PAIR_CORRECTION_SCALE * depth * pij / (dist + PAIR_DIRECTION_GUARD);

                if surface_pair {
                    let object_j = &objects.objects[owner_j.index()];
                    let normal = -pij;
                    let vn = normal * normal.dot(delta);
                    let vt = delta - vn;
                    delta = apply_friction(
                        delta,
                        vt,
                        depth,
                        object_i.friction.static_coeff * object_j.friction.static_coeff,
                        object_i.friction.kinetic_coeff * object_j.friction.kinetic_coeff,
                    );
                }
            }
            delta
        })
        .collect()
}

/// Commit staged corrections.
pub fn apply_corrections(particles: &mut ParticleStore, corrections: &[Vec3]) {
    particles
        .position
        .par_iter_mut()
        .zip(corrections.par_iter())
        .for_each(|(x, delta)| *x += *delta);
}

/// Clamp every non-static particle into the boundary box.
///
/// Clamped particles get a contact normal summed from the clamped faces.
/// The frame displacement (clamped position minus `position_prev`) is split
/// along that normal: the tangential part is reduced by friction using the
/// penetration depth as stress, and the normal part is reflected into the
/// stored velocity scaled by `1 + restitution`.
pub fn resolve_boundary(particles: &mut ParticleStore, objects: &ObjectRegistry, boundary: &BoundaryBox) {
    let ParticleStore {
        position,
        position_prev,
        velocity,
        owner,
        ..
    } = particles;

    let min = boundary.min.to_array();
    let max = boundary.max.to_array();
    let clamps_upper = [boundary.clamps_upper(0), boundary.clamps_upper(1), boundary.clamps_upper(2)];

    position
        .par_iter_mut()
        .zip(position_prev.par_iter())
        .zip(velocity.par_iter_mut())
        .zip(owner.par_iter())
        .for_each(|(((x, x_prev), v), &owner)| {
            let object = &objects.objects[owner.index()];
            if object.state.is_static() {
                return;
            }

            let original = x.to_array();
            let mut p = original;
            let mut normal = [0.0f32; 3];
            let mut depth = [0.0f32; 3];

            for axis in 0..3 {
                if p[axis] < min[axis] {
                    p[axis] = min[axis];
                    normal[axis] -= 1.0;
                    depth[axis] += min[axis] - original[axis];
                }
            }
            for axis in 0..3 {
                if clamps_upper[axis] && p[axis] > max[axis] {
                    p[axis] = max[axis];
                    normal[axis] += 1.0;
                    depth[axis] += max[axis] - original[axis];
                }
            }

            let normal = Vec3::from_array(normal);
            let normal_len = normal.length();
            if normal_len <= EPSILON {
                return;
            }
            let normal = normal / normal_len;

            let mut p = Vec3::from_array(p);
            let displacement = p - *x_prev;
            let vn = normal * normal.dot(displacement);
            let vt = displacement - vn;
            let stress = Vec3::from_array(depth).length();

            p = apply_friction(
                p,
                vt,
                stress,
                object.friction.static_coeff,
                object.friction.kinetic_coeff,
            );
            *v -= (1.0 + object.restitution) * vn;
            *x = p;
        });
}
