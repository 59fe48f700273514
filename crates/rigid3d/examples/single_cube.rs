//! Single Cube - one 11x11x11 particle cube dropped on a ground plane
//!
//! The cube starts tilted so it lands on an edge and rolls flat. The only
//! boundary is the plane y = 0.
//!
//! Run with: RUST_LOG=info cargo run --example single_cube --release

use glam::{Quat, Vec3};
use rigid3d::{BoundaryBox, BoxDesc, Friction, RigidSimulation3D, SimError, SimParams};

const FRAMES: u32 = 240;
const LOG_EVERY: u32 = 20;

fn main() -> Result<(), SimError> {
    env_logger::init();

    let mut sim = RigidSimulation3D::with_defaults();
    let cube = sim.create_box(
        BoxDesc::cube(Vec3::new(0.0, 1.5, 0.0), 0.5)
            .with_quat(Quat::from_rotation_z(0.4))
            .with_friction(Friction::new(0.6, 0.4))
            .with_restitution(0.2),
    )?;

    let params = SimParams {
        substeps: 10,
        ..SimParams::default()
    }
    .with_boundary(BoundaryBox::ground(0.0));

    for frame in 1..=FRAMES {
        sim.step(&params)?;

        if frame % LOG_EVERY == 0 {
            if let Some(pose) = sim.object_pose(cube) {
                let (axis, angle) = pose.quat.to_axis_angle();
                log::info!(
                    "frame {:3}: center {:?}, turned {:.3} rad about {:?} since creation",
                    frame,
                    pose.center,
                    angle,
                    axis
                );
            }
        }
    }

    let lowest = sim
        .particle_positions()
        .iter()
        .map(|p| p.y)
        .fold(f32::INFINITY, f32::min);
    log::info!("lowest particle after {} frames: y = {:.4}", FRAMES, lowest);
    Ok(())
}
