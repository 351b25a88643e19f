// Headless fish tank: steps the school and the shark at a fixed 60 Hz and
// logs what happens. RUST_LOG=debug shows every state change.
//
// Usage: shoal [frames] [seed]

use anyhow::Context;
use log::info;
use shoal::engine::path::DEFAULT_ARRIVAL_RADIUS;
use shoal::{CameraMode, Entity, FollowCamera, HeightField, Path, SimConfig, Simulation, Vec3};

const DT: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u64 = 3600;
/// Shark and fish bodies touch inside this distance.
const CONTACT_RADIUS: f32 = 1.5;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(arg) => arg.parse::<u64>().with_context(|| format!("invalid frame count `{arg}`"))?,
        None => DEFAULT_FRAMES,
    };
    let seed = match args.next() {
        Some(arg) => Some(arg.parse::<u64>().with_context(|| format!("invalid seed `{arg}`"))?),
        None => None,
    };

    let config = SimConfig { seed, ..SimConfig::default() };
    let camera_config = config.camera;
    let cruise = config.bounds.cruise_altitude;

    let path = Path::looping_circuit(Vec3::new(0.0, cruise, 0.0), 50.0, 8, DEFAULT_ARRIVAL_RADIUS)?;
    let seabed = HeightField::rolling(config.bounds.half_extent, 5.0, 0.0, 3.0)?;
    let mut sim = Simulation::new(config, path, seabed)?;

    let mut camera = FollowCamera::new(Vec3::new(0.0, cruise, -10.0), Vec3::Z, camera_config);
    let mut eaten = 0usize;

    for frame in 0..frames {
        for prey in contacts(&sim) {
            sim.report_contact(prey);
        }

        sim.step(DT);
        camera.update(&sim, DT);

        for effect in sim.drain_effects() {
            eaten += 1;
            info!("Blood in the water at {:.1?}", effect.position);
        }

        // Cut to the shark for a while every 20 seconds.
        if frame % 1200 == 600 {
            camera.select(CameraMode::Shark, sim.fish_count());
        } else if frame % 1200 == 0 && frame > 0 {
            camera.select(CameraMode::Fish, sim.fish_count());
        }

        if sim.frame() % 60 == 0 {
            info!(
                "frame {} | t={:.0}s | fish: {} | centroid: {:.1?} | shark: {:?} | camera: {:?} at {:.1?}",
                sim.frame(),
                sim.elapsed(),
                sim.fish_count(),
                sim.flock().centroid(),
                sim.shark_mode(),
                camera.mode(),
                camera.position
            );
        }
    }

    info!("Done after {} frames: {} eaten, {} left", sim.frame(), eaten, sim.fish_count());
    Ok(())
}

/// Fish whose centre is within `CONTACT_RADIUS` of the shark's.
fn contacts(sim: &Simulation) -> Vec<Entity> {
    let Some(shark) = sim.predator().and_then(|e| sim.vehicle(e)) else {
        return Vec::new();
    };
    sim.population()
        .iter()
        .copied()
        .filter(|&fish| {
            sim.vehicle(fish)
                .is_some_and(|v| v.position.distance_squared(shark.position) < CONTACT_RADIUS * CONTACT_RADIUS)
        })
        .collect()
}
