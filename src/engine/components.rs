// Core ECS components for the fish tank.
// A fish is spawned as (Vehicle, Fish), the predator as (Vehicle, Shark).

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::config::VehicleParams;

/// Force-integrated body shared by every agent.
///
/// `forward` is always unit length. It follows the velocity direction and is
/// left untouched on frames where the vehicle comes to a stop.
#[derive(Component, Debug, Clone, Copy)]
pub struct Vehicle {
    pub position: Vec3,
    pub forward: Vec3,
    pub velocity: Vec3,
    pub(crate) acceleration: Vec3,
    pub mass: f32,
    pub max_force: f32,
    pub max_speed: f32,
}

impl Vehicle {
    /// New vehicle coasting at unit speed along `forward`.
    pub fn new(position: Vec3, forward: Vec3, params: VehicleParams) -> Self {
        let forward = facing(forward);
        Self {
            position,
            forward,
            velocity: forward.clamp_length_max(params.max_speed),
            acceleration: Vec3::ZERO,
            mass: params.mass,
            max_force: params.max_force,
            max_speed: params.max_speed,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Accumulated acceleration not yet integrated this frame.
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Unit vector to the vehicle's right, level with the ground.
    pub fn right(&self) -> Vec3 {
        right_of(self.forward)
    }
}

/// Normalised direction, falling back to +Z for a zero vector.
pub fn facing(direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO { Vec3::Z } else { dir }
}

/// Right-hand side of a heading with +Y up (+Z forward gives +X right).
pub fn right_of(forward: Vec3) -> Vec3 {
    Vec3::Y.cross(forward).normalize_or_zero()
}

/// Position of a fish in the school's chain of command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FishRole {
    /// Follows the path; always index 0 of the population.
    Leader,
    /// Flocks behind the leader.
    Follower,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Fish {
    pub role: FishRole,
    /// True on frames where the predator is inside the safe radius.
    /// Cleared at the start of every steering pass.
    pub evading: bool,
}

impl Fish {
    pub fn leader() -> Self {
        Self { role: FishRole::Leader, evading: false }
    }

    pub fn follower() -> Self {
        Self { role: FishRole::Follower, evading: false }
    }

    pub fn is_leader(&self) -> bool {
        self.role == FishRole::Leader
    }
}

/// Predator behaviour state. Cycles Wander -> Chase -> Eat -> Wander.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharkMode {
    #[default]
    Wander,
    Chase,
    /// Wanders while ignoring prey.
    Eat,
}

#[derive(Component, Debug, Clone)]
pub struct Shark {
    pub(crate) mode: SharkMode,
    /// Seconds since the last wander point was picked.
    pub(crate) decision_timer: f32,
    pub(crate) chase_timer: f32,
    pub(crate) eat_timer: f32,
    /// Current prey. Re-validated against the population every frame.
    pub(crate) target: Option<Entity>,
    pub(crate) wander_point: Vec3,
}

impl Shark {
    pub fn new(wander_point: Vec3) -> Self {
        Self {
            mode: SharkMode::Wander,
            decision_timer: 0.0,
            chase_timer: 0.0,
            eat_timer: 0.0,
            target: None,
            wander_point,
        }
    }

    pub fn mode(&self) -> SharkMode {
        self.mode
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn chase_timer(&self) -> f32 {
        self.chase_timer
    }

    pub fn eat_timer(&self) -> f32 {
        self.eat_timer
    }

    pub fn wander_point(&self) -> Vec3 {
        self.wander_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> VehicleParams {
        VehicleParams { mass: 1.0, max_force: 4.0, max_speed: 3.0 }
    }

    #[test]
    fn new_vehicle_coasts_along_forward() {
        let v = Vehicle::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0), params());
        assert_eq!(v.forward, Vec3::Z);
        assert_eq!(v.velocity, Vec3::Z);
        assert_eq!(v.acceleration(), Vec3::ZERO);
    }

    #[test]
    fn zero_forward_falls_back_to_z() {
        let v = Vehicle::new(Vec3::ZERO, Vec3::ZERO, params());
        assert_eq!(v.forward, Vec3::Z);
    }

    #[test]
    fn right_of_z_is_x() {
        assert!((right_of(Vec3::Z) - Vec3::X).length() < 1e-6);
        assert!((right_of(Vec3::X) + Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn shark_starts_wandering() {
        let shark = Shark::new(Vec3::ONE);
        assert_eq!(shark.mode(), SharkMode::Wander);
        assert_eq!(shark.target(), None);
        assert_eq!(shark.wander_point(), Vec3::ONE);
    }
}
