//! End-to-end solver behavior
//!
//! Scenes are small (a few hundred particles at most) so the exhaustive
//! pairwise pass stays fast.

use rigid3d::collision::pairwise_corrections;
use rigid3d::math::polar_decompose;
use rigid3d::{
    BoundaryBox, BoxDesc, Friction, Mat3, ObjectId, ObjectState, Resource, RigidSimulation3D, SimConfig, SimError,
    SimParams, Vec3,
};

/// Frame parameters with fewer substeps than the reference, for speed.
fn params(substeps: u32) -> SimParams {
    SimParams {
        substeps,
        ..SimParams::default()
    }
}

/// Full particle and pose state, for exact comparisons.
fn snapshot(sim: &RigidSimulation3D) -> (Vec<Vec3>, Vec<Vec3>, Vec<Vec3>, Vec<(Vec3, Mat3)>) {
    (
        sim.particles.position.clone(),
        sim.particles.position_prev.clone(),
        sim.particles.velocity.clone(),
        sim.objects
            .objects
            .iter()
            .map(|o| (o.center_of_mass, o.rotation))
            .collect(),
    )
}

fn frobenius(m: Mat3) -> f32 {
    (m.x_axis.length_squared() + m.y_axis.length_squared() + m.z_axis.length_squared()).sqrt()
}

#[test]
fn test_polar_factors_reconstruct_input() {
    let matrices = [
        Mat3::from_cols_array(&[1.0, 0.2, -0.3, 0.4, 2.0, 0.1, -0.5, 0.3, 0.7]),
        Mat3::from_cols_array(&[0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
        Mat3::from_diagonal(Vec3::new(2.0, 1.0, -1.0)),
        Mat3::from_cols(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 4.0, 6.0), Vec3::new(-1.0, 0.0, 1.0)),
        Mat3::from_rotation_x(0.8) * Mat3::from_diagonal(Vec3::new(0.5, 3.0, 1.5)),
    ];

    for a in matrices {
        let (r, s) = polar_decompose(a);
        let residual = frobenius(r * s - a);
        assert!(residual < 1e-4 * frobenius(a).max(1.0), "R*S != A for {:?}: residual {}", a, residual);
        assert!(
            (r.transpose() * r).abs_diff_eq(Mat3::IDENTITY, 1e-4),
            "R not orthonormal for {:?}: {:?}",
            a,
            r
        );
        assert!((r.determinant() - 1.0).abs() < 1e-4, "R is not a proper rotation: det {}", r.determinant());
        assert!(s.abs_diff_eq(s.transpose(), 1e-5), "S not symmetric: {:?}", s);
    }
}

#[test]
fn test_reset_is_idempotent() {
    let mut sim = RigidSimulation3D::with_defaults();
    sim.create_box(BoxDesc::cube(Vec3::new(0.0, 0.1, 0.0), 0.1).with_state(ObjectState::Static))
        .unwrap();
    sim.create_box_with_velocity(BoxDesc::cube(Vec3::new(0.0, 0.6, 0.0), 0.1), Vec3::new(0.5, -1.0, 0.0))
        .unwrap();
    for _ in 0..10 {
        sim.step(&params(5)).unwrap();
    }

    sim.reset_all();
    let once = snapshot(&sim);
    sim.reset_all();
    let twice = snapshot(&sim);
    assert_eq!(once, twice, "second reset changed the state");
    assert_eq!(sim.particles.position, sim.particles.rest_position);
}

#[test]
fn test_static_object_never_moves() {
    let mut sim = RigidSimulation3D::with_defaults();
    let id = sim
        .create_box(BoxDesc::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.3, 0.1, 0.2)).with_state(ObjectState::Static))
        .unwrap();
    let initial = sim.particle_positions().to_vec();

    for _ in 0..30 {
        sim.step(&params(5)).unwrap();
    }

    assert_eq!(sim.particle_positions(), &initial[..], "static particles moved");
    assert!(sim.particles.velocity.iter().all(|v| *v == Vec3::ZERO));
    let object = sim.object(id).unwrap();
    assert!((object.center_of_mass - object.rest_center_of_mass).length() < 1e-5);
}

#[test]
fn test_single_particle_settles_on_ground() {
    let mut sim = RigidSimulation3D::with_defaults();
    let id = sim
        .create_box(BoxDesc::new(Vec3::new(0.3, 0.5, -0.2), Vec3::ZERO).with_restitution(0.0))
        .unwrap();
    assert_eq!(sim.particle_count(), 1);

    let frame_params = params(5).with_boundary(BoundaryBox::ground(0.0));
    for _ in 0..300 {
        sim.step(&frame_params).unwrap();
    }

    let position = sim.particle_positions()[0];
    let velocity = sim.particles.velocity[0];
    assert!(position.y.abs() < 1e-3, "particle should rest on y=0, got {:?}", position);
    assert!(velocity.length() < 1e-3, "particle should be at rest, velocity {:?}", velocity);
    assert!((position.x - 0.3).abs() < 1e-5 && (position.z + 0.2).abs() < 1e-5, "drifted: {:?}", position);
    assert_eq!(sim.object_pose(id).unwrap().rotation, Mat3::IDENTITY);
}

#[test]
fn test_separated_boxes_get_no_pairwise_correction() {
    let mut sim = RigidSimulation3D::with_defaults();
    sim.create_box(BoxDesc::cube(Vec3::new(-2.0, 3.0, 0.0), 0.2)).unwrap();
    sim.create_box(BoxDesc::cube(Vec3::new(2.0, 3.0, 0.0), 0.2)).unwrap();
    let radius = sim.config().particle_radius;

    for frame in 0..5 {
        let corrections = pairwise_corrections(&sim.particles, &sim.objects, radius);
        assert!(
            corrections.iter().all(|d| *d == Vec3::ZERO),
            "frame {}: unexpected pairwise correction",
            frame
        );
        sim.step(&params(3)).unwrap();
    }
}

#[test]
fn test_object_capacity_overflow_fails_cleanly() {
    let max_objects = 3;
    let mut sim = RigidSimulation3D::new(SimConfig::with_capacity(1000, max_objects)).unwrap();
    for i in 0..max_objects {
        let id = sim
            .create_box(BoxDesc::cube(Vec3::new(i as f32, 1.0, 0.0), 0.05))
            .unwrap();
        assert_eq!(id, ObjectId(i as u32));
    }
    let particles_before = sim.particle_count();

    let err = sim
        .create_box(BoxDesc::cube(Vec3::new(5.0, 1.0, 0.0), 0.05))
        .unwrap_err();
    assert!(
        matches!(
            err,
            SimError::CapacityExceeded { resource: Resource::Objects, requested: 4, capacity: 3 }
        ),
        "unexpected error: {}",
        err
    );
    assert_eq!(sim.object_count(), max_objects);
    assert_eq!(sim.particle_count(), particles_before);

    // Still steps normally afterwards.
    sim.step(&params(2)).unwrap();
}

#[test]
fn test_rest_center_is_particle_mean() {
    let mut sim = RigidSimulation3D::with_defaults();
    let id = sim
        .create_box(BoxDesc::new(Vec3::new(1.0, 2.0, -3.0), Vec3::new(0.25, 0.1, 0.33)))
        .unwrap();
    let object = sim.object(id).unwrap();
    let rest = &sim.particles.rest_position[object.particles()];
    let mean = rest.iter().copied().sum::<Vec3>() / rest.len() as f32;

    assert!(
        (object.rest_center_of_mass - mean).length() < 1e-5,
        "rest center {:?} vs mean {:?}",
        object.rest_center_of_mass,
        mean
    );
    // Snapped extents are symmetric about the requested center.
    assert!((mean - Vec3::new(1.0, 2.0, -3.0)).length() < 1e-4);
}

#[test]
fn test_stacked_box_rests_on_lower_box() {
    let mut sim = RigidSimulation3D::with_defaults();
    let lower = sim.create_box(BoxDesc::cube(Vec3::new(0.0, 0.1, 0.0), 0.1)).unwrap();
    let upper = sim.create_box(BoxDesc::cube(Vec3::new(0.0, 0.45, 0.0), 0.1)).unwrap();

    for _ in 0..90 {
        sim.step(&params(10)).unwrap();
    }

    let lower_pose = sim.object_pose(lower).unwrap();
    let upper_pose = sim.object_pose(upper).unwrap();
    assert!(sim.particle_positions().iter().all(|p| p.is_finite()));
    assert!(
        upper_pose.center.y - lower_pose.center.y > 0.15,
        "upper box sank into lower box: {:?} vs {:?}",
        upper_pose.center,
        lower_pose.center
    );
    assert!(lower_pose.center.y > 0.05, "lower box pushed through the floor: {:?}", lower_pose.center);
}

#[test]
fn test_kinematic_matches_dynamic() {
    let run = |state: ObjectState| {
        let mut sim = RigidSimulation3D::with_defaults();
        sim.create_box(BoxDesc::cube(Vec3::new(0.0, 0.1, 0.0), 0.1).with_state(ObjectState::Static))
            .unwrap();
        sim.create_box_with_velocity(
            BoxDesc::cube(Vec3::new(0.05, 0.5, 0.0), 0.1)
                .with_state(state)
                .with_friction(Friction::new(0.5, 0.3)),
            Vec3::new(0.2, 0.0, 0.0),
        )
        .unwrap();
        for _ in 0..10 {
            sim.step(&params(4)).unwrap();
        }
        sim.particle_positions().to_vec()
    };

    assert_eq!(run(ObjectState::Kinematic), run(ObjectState::Dynamic));
}

#[test]
fn test_host_readback_matches_poses() {
    let mut sim = RigidSimulation3D::new(SimConfig::with_capacity(2000, 4)).unwrap();
    sim.create_box(BoxDesc::cube(Vec3::new(0.0, 1.0, 0.0), 0.1)).unwrap();
    sim.create_box(BoxDesc::cube(Vec3::new(1.0, 1.0, 0.0), 0.1).with_quat(rigid3d::Quat::from_rotation_y(0.5)))
        .unwrap();
    sim.step(&params(3)).unwrap();

    let mut host = sim.host_poses();
    assert_eq!(host.capacity(), 4);
    sim.copy_poses_to_host(2, &mut host).unwrap();
    for i in 0..2 {
        let pose = sim.object_pose(ObjectId(i as u32)).unwrap();
        assert_eq!(host.centers[i], pose.center.to_array());
        assert_eq!(host.rotation(i).unwrap(), pose.rotation);
    }
    assert!(sim.copy_poses_to_host(3, &mut host).is_err());
}
