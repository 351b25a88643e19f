// Frame-stepped fish tank.
//
// Simulation owns the ECS world holding every vehicle, the FlockState
// aggregator, the terrain and the RNG. One call to step() is one frame:
//
//   1. resolve contacts reported since the last frame
//   2. apply queued removals, promoting a new leader if needed
//   3. refresh follow point, path cursor, centroid and heading
//   4. snapshot every agent into a FlockView
//   5. steer and integrate each fish in population order, then the shark
//
// Removals are never applied while agents are being iterated.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::{info, trace};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::camera::{CameraMode, FollowTarget};
use super::components::{Fish, FishRole, Shark, SharkMode, Vehicle, facing};
use super::flock::{AgentSnapshot, FlockState, FlockView};
use super::path::Path;
use super::terrain::Terrain;
use super::vehicle::{SteeringContext, uniform};
use crate::config::SimConfig;
use crate::error::SimError;

/// Fire-and-forget request for a death effect, drained by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathEffect {
    pub fish: Entity,
    pub position: Vec3,
}

pub struct Simulation {
    world: World,
    flock: FlockState,
    config: SimConfig,
    terrain: Box<dyn Terrain>,
    rng: StdRng,

    effects: Vec<DeathEffect>,
    contacts: Vec<Entity>,
    pending_removals: Vec<Entity>,

    frame: u64,
    elapsed: f32,
}

impl Simulation {
    /// Spawn the shark, the leader at the first waypoint and the followers
    /// scattered behind it.
    pub fn new(config: SimConfig, path: Path, terrain: impl Terrain + 'static) -> Result<Self, SimError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sim = Self {
            world: World::new(),
            flock: FlockState::new(path, config.flock.follow_distance),
            config,
            terrain: Box::new(terrain),
            rng,
            effects: Vec::new(),
            contacts: Vec::new(),
            pending_removals: Vec::new(),
            frame: 0,
            elapsed: 0.0,
        };

        sim.spawn_shark();
        sim.spawn_school();
        sim.aggregate();

        info!(
            "Spawned {} fish and a shark on a {}-waypoint path",
            sim.flock.len(),
            sim.flock.path().len()
        );
        Ok(sim)
    }

    fn spawn_shark(&mut self) {
        let cfg = self.config.shark;
        let vehicle = Vehicle::new(cfg.spawn_position, cfg.spawn_forward, cfg.vehicle);
        let wander_point = vehicle.wander_point(cfg.wander_distance, cfg.wander_radius, &mut self.rng);
        let shark = self.world.spawn((vehicle, Shark::new(wander_point))).id();
        self.flock.set_predator(Some(shark));
    }

    fn spawn_school(&mut self) {
        let path = self.flock.path();
        let start = path.point(0);
        let heading = if path.len() > 1 { facing(path.point(1) - start) } else { Vec3::Z };

        self.spawn_fish(start, heading);

        let follow_point = start - heading * self.config.flock.follow_distance;
        let r = self.config.flock.spawn_radius;
        let center = start - heading * r;
        for _ in 0..self.config.flock.follower_count {
            let offset = Vec3::new(
                uniform(&mut self.rng, -r, r),
                uniform(&mut self.rng, -r, r),
                uniform(&mut self.rng, -r, r),
            );
            let position = center + offset;
            self.spawn_fish(position, follow_point - position);
        }
    }

    /// Add a fish at the back of the school. The first fish of an empty
    /// school becomes its leader and swims slightly slower than the rest.
    pub fn spawn_fish(&mut self, position: Vec3, forward: Vec3) -> Entity {
        let leading = self.flock.is_empty();
        let (fish, params) = if leading {
            let mut params = self.config.fish.vehicle;
            params.max_speed -= self.config.flock.leader_speed_penalty;
            (Fish::leader(), params)
        } else {
            (Fish::follower(), self.config.fish.vehicle)
        };

        let entity = self.world.spawn((Vehicle::new(position, forward, params), fish)).id();
        self.flock.push(entity);
        entity
    }

    // ========================================================================
    // TRIGGERS
    // ========================================================================

    /// Queue a fish for removal at the start of the next frame.
    pub fn kill_fish(&mut self, fish: Entity) {
        self.pending_removals.push(fish);
    }

    /// Collision feed: the shark's bounds overlapped `prey`.
    pub fn report_contact(&mut self, prey: Entity) {
        self.contacts.push(prey);
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    /// Advance one frame. Non-finite or negative `dt` counts as zero.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.resolve_contacts();
        self.apply_removals();
        let view = self.refresh();
        self.steer_agents(&view, dt);

        self.frame += 1;
        self.elapsed += dt;
    }

    fn resolve_contacts(&mut self) {
        if self.contacts.is_empty() {
            return;
        }
        let contacts = std::mem::take(&mut self.contacts);
        let Some(predator) = self.flock.predator() else { return };

        for prey in contacts {
            let alive = self.flock.contains(prey) && !self.pending_removals.contains(&prey);
            let eaten = self
                .world
                .get_mut::<Shark>(predator)
                .is_some_and(|mut shark| shark.on_contact(prey, alive));
            if eaten {
                self.pending_removals.push(prey);
            }
        }
    }

    fn apply_removals(&mut self) {
        for fish in std::mem::take(&mut self.pending_removals) {
            let position = self.world.get::<Vehicle>(fish).map(|v| v.position);
            let Some(removal) = self.flock.remove(fish) else {
                trace!("Ignoring removal of {:?}: not in the school", fish);
                continue;
            };

            if let Some(position) = position {
                self.effects.push(DeathEffect { fish, position });
            }
            self.world.despawn(fish);

            if let Some(leader) = removal.promoted {
                if let Some(mut promoted) = self.world.get_mut::<Fish>(leader) {
                    promoted.role = FishRole::Leader;
                }
            }

            let role = if removal.was_leader { "leader" } else { "follower" };
            info!("Fish {:?} ({}) eaten, {} left", fish, role, self.flock.len());
        }
    }

    fn members(&self) -> Vec<AgentSnapshot> {
        self.flock
            .population()
            .iter()
            .filter_map(|&fish| self.snapshot(fish))
            .collect()
    }

    fn snapshot(&self, entity: Entity) -> Option<AgentSnapshot> {
        self.world.get::<Vehicle>(entity).map(|v| v.snapshot(entity))
    }

    fn aggregate(&mut self) {
        let members = self.members();
        self.flock.aggregate(&members);
    }

    fn refresh(&mut self) -> FlockView {
        let members = self.members();
        self.flock.refresh(&members);
        let predator = self.flock.predator().and_then(|e| self.snapshot(e));
        self.flock.view(members, predator)
    }

    fn steer_agents(&mut self, view: &FlockView, dt: f32) {
        let mut ctx = SteeringContext {
            view,
            terrain: self.terrain.as_ref(),
            config: &self.config,
            rng: &mut self.rng,
            dt,
        };

        let mut school = self.world.query::<(&mut Vehicle, &mut Fish)>();
        for member in &view.population {
            if let Ok((mut vehicle, mut fish)) = school.get_mut(&mut self.world, member.entity) {
                vehicle.tick(&mut *fish, &mut ctx);
            }
        }

        if let Some(predator) = self.flock.predator() {
            let mut sharks = self.world.query::<(&mut Vehicle, &mut Shark)>();
            if let Ok((mut vehicle, mut shark)) = sharks.get_mut(&mut self.world, predator) {
                vehicle.tick(&mut *shark, &mut ctx);
            }
        }
    }

    // ========================================================================
    // READ API
    // ========================================================================

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn flock(&self) -> &FlockState {
        &self.flock
    }

    pub fn population(&self) -> &[Entity] {
        self.flock.population()
    }

    pub fn fish_count(&self) -> usize {
        self.flock.len()
    }

    pub fn leader(&self) -> Option<Entity> {
        self.flock.leader()
    }

    pub fn predator(&self) -> Option<Entity> {
        self.flock.predator()
    }

    pub fn vehicle(&self, entity: Entity) -> Option<&Vehicle> {
        self.world.get::<Vehicle>(entity)
    }

    /// Direct access for hosts that reposition agents (teleports, tests).
    pub fn vehicle_mut(&mut self, entity: Entity) -> Option<Mut<'_, Vehicle>> {
        self.world.get_mut::<Vehicle>(entity)
    }

    pub fn fish(&self, entity: Entity) -> Option<&Fish> {
        self.world.get::<Fish>(entity)
    }

    pub fn shark(&self) -> Option<&Shark> {
        self.flock.predator().and_then(|e| self.world.get::<Shark>(e))
    }

    pub fn shark_mode(&self) -> Option<SharkMode> {
        self.shark().map(Shark::mode)
    }

    /// Pose a camera in `mode` should trail, if any.
    pub fn camera_target(&self, mode: CameraMode) -> Option<FollowTarget> {
        match mode {
            CameraMode::Fish if !self.flock.is_empty() => Some(FollowTarget {
                position: self.flock.centroid(),
                forward: self.flock.heading(),
            }),
            CameraMode::Shark => self
                .flock
                .predator()
                .and_then(|e| self.vehicle(e))
                .map(|v| FollowTarget { position: v.position, forward: v.forward }),
            _ => None,
        }
    }

    /// Take every death effect requested since the last drain.
    pub fn drain_effects(&mut self) -> Vec<DeathEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds since construction.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
