//! Host-facing output: object poses and raw particle positions.

use glam::{Mat3, Quat, Vec3};

use crate::error::SimError;
use crate::math::mat3_to_quat;
use crate::object::{ObjectId, ObjectRegistry, RigidObject};

/// Pose of one object after the last frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectPose {
    pub center: Vec3,
    pub rotation: Mat3,
    /// `rotation` as a quaternion, for render transforms.
    pub quat: Quat,
}

impl ObjectPose {
    pub fn from_object(object: &RigidObject) -> Self {
        Self {
            center: object.center_of_mass,
            rotation: object.rotation,
            quat: mat3_to_quat(object.rotation),
        }
    }
}

/// Preallocated readback arrays, one slot per object the host can display.
///
/// Rotations are row-major, nine floats per object.
#[derive(Clone, Debug, Default)]
pub struct HostPoses {
    pub centers: Vec<[f32; 3]>,
    pub rotations: Vec<[f32; 9]>,
}

impl HostPoses {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            centers: vec![[0.0; 3]; capacity],
            rotations: vec![[0.0; 9]; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.centers.len().min(self.rotations.len())
    }

    /// Rotation of slot `index` as a matrix.
    pub fn rotation(&self, index: usize) -> Option<Mat3> {
        self.rotations.get(index).map(|r| Mat3::from_cols_array(r).transpose())
    }
}

/// Copy the first `object_count` poses into the host arrays.
pub fn copy_poses(objects: &ObjectRegistry, object_count: usize, host: &mut HostPoses) -> Result<(), SimError> {
    if object_count > objects.len() {
        return Err(SimError::UnknownObject(ObjectId(objects.len() as u32)));
    }
    if object_count > host.capacity() {
        return Err(SimError::InvalidParams(format!(
            "host pose buffer holds {} objects, {} requested",
            host.capacity(),
            object_count
        )));
    }

    for (id, object) in objects.iter().take(object_count) {
        host.centers[id.index()] = object.center_of_mass.to_array();
        host.rotations[id.index()] = object.rotation.transpose().to_cols_array();
    }
    Ok(())
}

/// Particle positions as a flat `[x0, y0, z0, x1, ...]` slice, without copying.
#[inline]
pub fn flatten_positions(positions: &[Vec3]) -> &[f32] {
    bytemuck::cast_slice(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Friction, ObjectState};

    fn registry(rotation: Mat3) -> ObjectRegistry {
        let mut objects = ObjectRegistry::with_capacity(2);
        objects
            .push(RigidObject {
                state: ObjectState::Dynamic,
                rest_center_of_mass: Vec3::ZERO,
                rest_rotation: Mat3::IDENTITY,
                center_of_mass: Vec3::new(1.0, 2.0, 3.0),
                rotation,
                covariance: Mat3::ZERO,
                friction: Friction::default(),
                restitution: 1.0,
                particle_begin: 0,
                particle_size: 1,
                mass: 1.0,
            })
            .unwrap();
        objects
    }

    #[test]
    fn test_copy_row_major() {
        let rotation = Mat3::from_rotation_z(0.4);
        let objects = registry(rotation);
        let mut host = HostPoses::with_capacity(4);
        copy_poses(&objects, 1, &mut host).unwrap();

        assert_eq!(host.centers[0], [1.0, 2.0, 3.0]);
        // row 0, column 1 is -sin
        assert!((host.rotations[0][1] + 0.4f32.sin()).abs() < 1e-6);
        assert_eq!(host.rotation(0).unwrap(), rotation);
        assert_eq!(host.centers[1], [0.0; 3]);
    }

    #[test]
    fn test_copy_rejects_bad_counts() {
        let objects = registry(Mat3::IDENTITY);
        let mut host = HostPoses::with_capacity(1);
        assert!(matches!(copy_poses(&objects, 2, &mut host), Err(SimError::UnknownObject(_))));
        let mut empty = HostPoses::default();
        assert!(matches!(copy_poses(&objects, 1, &mut empty), Err(SimError::InvalidParams(_))));
    }

    #[test]
    fn test_pose_quaternion_matches_matrix() {
        let rotation = Mat3::from_rotation_y(1.1);
        let pose = ObjectPose::from_object(&registry(rotation).objects[0]);
        assert!(Mat3::from_quat(pose.quat).abs_diff_eq(rotation, 1e-5));
    }

    #[test]
    fn test_flatten_positions() {
        let positions = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)];
        assert_eq!(flatten_positions(&positions), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
