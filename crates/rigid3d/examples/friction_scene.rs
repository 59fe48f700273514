//! Friction Scene - stacked boxes on a static pedestal
//!
//! A large box with two columns of smaller boxes above it falls onto a
//! static pedestal. Halfway through, another box is thrown in sideways.
//! Poses are logged so the settling can be followed without a renderer.
//!
//! Run with: RUST_LOG=info cargo run --example friction_scene --release
//! Optionally pass a JSON file with frame parameters (see `SimParams`).

use std::path::Path;

use glam::Vec3;
use rigid3d::{BoxDesc, ObjectState, RigidSimulation3D, SimError, SimParams};

const FRAMES: u32 = 180;
const THROW_FRAME: u32 = 90;
const LOG_EVERY: u32 = 30;

fn main() -> Result<(), SimError> {
    env_logger::init();

    let params = match std::env::args().nth(1) {
        Some(path) => SimParams::load_json(Path::new(&path))?,
        None => SimParams::default(),
    };

    let mut sim = RigidSimulation3D::with_defaults();
    sim.create_box(BoxDesc::cube(Vec3::new(0.0, 2.2, 0.0), 0.3))?;
    for x in [-0.3, 0.3] {
        sim.create_box(BoxDesc::cube(Vec3::new(x, 2.8, 0.0), 0.2))?;
        sim.create_box(BoxDesc::cube(Vec3::new(x, 3.4, 0.0), 0.2))?;
    }
    sim.create_box(BoxDesc::cube(Vec3::new(0.0, 0.7, 0.0), 0.5).with_state(ObjectState::Static))?;

    log::info!(
        "friction scene: {} objects, {} particles, {} substeps/frame",
        sim.object_count(),
        sim.particle_count(),
        params.substeps
    );

    let mut host = sim.host_poses();
    let start = std::time::Instant::now();
    for frame in 1..=FRAMES {
        if frame == THROW_FRAME {
            let thrown = BoxDesc::cube(Vec3::new(0.0, 5.2, 0.0), 0.3);
            let id = sim.create_box_with_velocity(thrown, Vec3::new(10.0, 0.0, 0.0))?;
            log::info!("threw object {}", id);
        }

        sim.step(&params)?;

        if frame % LOG_EVERY == 0 {
            sim.copy_poses_to_host(sim.object_count(), &mut host)?;
            for (i, center) in host.centers[..sim.object_count()].iter().enumerate() {
                log::info!("frame {:3} object {}: center {:?}", frame, i, center);
            }
        }
    }

    let elapsed = start.elapsed();
    log::info!(
        "{} frames in {:.2?} ({:.1} ms/frame)",
        FRAMES,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / FRAMES as f64
    );
    Ok(())
}
