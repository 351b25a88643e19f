// Tunables for the fish tank.
// Defaults are the hand-tuned values of the demo tank.

use glam::Vec3;
use crate::error::SimError;

// ============================================================================
// WORLD CONSTANTS
// ============================================================================

/// World runs from -WORLD_HALF to +WORLD_HALF on both X and Z.
pub const WORLD_HALF: f32 = 100.0;
/// How far ahead of a vehicle the boundary probe is placed.
pub const BOUNDS_LOOKAHEAD: f32 = 20.0;
/// Probes above this height steer the vehicle back down.
pub const CEILING: f32 = 40.0;
/// Altitude vehicles are steered toward when they leave the vertical band.
pub const CRUISE_ALTITUDE: f32 = 20.0;

// ============================================================================
// SUB-CONFIGS
// ============================================================================

/// Containment box and terrain clearance used by `stay_in_bounds`.
#[derive(Debug, Clone, Copy)]
pub struct BoundsConfig {
    pub half_extent: f32,
    pub lookahead: f32,
    pub ceiling: f32,
    pub cruise_altitude: f32,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            half_extent: WORLD_HALF,
            lookahead: BOUNDS_LOOKAHEAD,
            ceiling: CEILING,
            cruise_altitude: CRUISE_ALTITUDE,
        }
    }
}

/// Physical limits shared by every vehicle of one kind.
#[derive(Debug, Clone, Copy)]
pub struct VehicleParams {
    pub mass: f32,
    pub max_force: f32,
    pub max_speed: f32,
}

impl VehicleParams {
    /// `fields` names mass, max_speed and max_force in that order.
    fn validate(&self, fields: [&'static str; 3]) -> Result<(), SimError> {
        positive(fields[0], self.mass)?;
        positive(fields[1], self.max_speed)?;
        non_negative(fields[2], self.max_force)
    }
}

/// Flocking weights and radii for fish.
#[derive(Debug, Clone, Copy)]
pub struct FishConfig {
    pub vehicle: VehicleParams,
    pub seek_weight: f32,
    pub evade_weight: f32,
    pub in_bounds_weight: f32,
    pub separate_weight: f32,
    pub cohesion_weight: f32,
    pub align_weight: f32,
    /// Compared against the *squared* distance to a neighbour.
    pub separate_distance: f32,
    pub evade_predict_distance: f32,
    pub safe_radius: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleParams { mass: 1.0, max_force: 8.0, max_speed: 6.0 },
            seek_weight: 50.0,
            evade_weight: 100.0,
            in_bounds_weight: 200.0,
            separate_weight: 300.0,
            cohesion_weight: 25.0,
            align_weight: 25.0,
            separate_distance: 5.0,
            evade_predict_distance: 5.0,
            safe_radius: 25.0,
        }
    }
}

/// Predator timings, radii and weights.
#[derive(Debug, Clone, Copy)]
pub struct SharkConfig {
    pub vehicle: VehicleParams,
    /// Seconds between new wander points.
    pub decision_interval: f32,
    pub chase_radius: f32,
    /// Seconds of fruitless chasing before giving up.
    pub chase_timeout: f32,
    /// Seconds spent ignoring prey after a meal.
    pub eat_duration: f32,
    pub wander_distance: f32,
    pub wander_radius: f32,
    pub pursue_predict_distance: f32,
    pub wander_weight: f32,
    pub chase_weight: f32,
    pub in_bounds_weight: f32,
    pub spawn_position: Vec3,
    pub spawn_forward: Vec3,
}

impl Default for SharkConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleParams { mass: 1.0, max_force: 10.0, max_speed: 7.0 },
            decision_interval: 0.2,
            chase_radius: 75.0,
            chase_timeout: 30.0,
            eat_duration: 10.0,
            wander_distance: 20.0,
            wander_radius: 15.0,
            pursue_predict_distance: 5.0,
            wander_weight: 50.0,
            chase_weight: 50.0,
            in_bounds_weight: 250.0,
            spawn_position: Vec3::new(60.0, 20.0, 60.0),
            spawn_forward: Vec3::NEG_Z,
        }
    }
}

/// School layout.
#[derive(Debug, Clone, Copy)]
pub struct FlockConfig {
    /// Distance of the follow point behind the leader.
    pub follow_distance: f32,
    /// Followers spawned in addition to the leader.
    pub follower_count: usize,
    /// Half-extent of the spawn cube behind the leader.
    pub spawn_radius: f32,
    /// Subtracted from the leader's max speed so followers can keep up.
    pub leader_speed_penalty: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            follow_distance: 1.5,
            follower_count: 15,
            spawn_radius: 10.0,
            leader_speed_penalty: 1.0,
        }
    }
}

/// Smooth-follow and free-look parameters for [`FollowCamera`](crate::FollowCamera).
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub distance: f32,
    pub height: f32,
    pub height_damping: f32,
    pub position_damping: f32,
    pub rotation_damping: f32,
    /// Degrees per unit of look input per second.
    pub look_sensitivity: f32,
    /// World units per second in free mode.
    pub move_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 3.0,
            height: 1.5,
            height_damping: 1.0,
            position_damping: 1.0,
            rotation_damping: 1.0,
            look_sensitivity: 60.0,
            move_speed: 1.0,
        }
    }
}

// ============================================================================
// TOP LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SimConfig {
    pub bounds: BoundsConfig,
    pub fish: FishConfig,
    pub shark: SharkConfig,
    pub flock: FlockConfig,
    pub camera: CameraConfig,
    /// Deterministic RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl SimConfig {
    /// Check every tunable the simulation divides by or samples a range from.
    pub fn validate(&self) -> Result<(), SimError> {
        self.fish.vehicle.validate(["fish.mass", "fish.max_speed", "fish.max_force"])?;
        self.shark.vehicle.validate(["shark.mass", "shark.max_speed", "shark.max_force"])?;

        positive("bounds.half_extent", self.bounds.half_extent)?;
        non_negative("bounds.lookahead", self.bounds.lookahead)?;

        non_negative("fish.separate_distance", self.fish.separate_distance)?;
        non_negative("fish.safe_radius", self.fish.safe_radius)?;

        non_negative("shark.decision_interval", self.shark.decision_interval)?;
        non_negative("shark.chase_radius", self.shark.chase_radius)?;
        non_negative("shark.chase_timeout", self.shark.chase_timeout)?;
        non_negative("shark.eat_duration", self.shark.eat_duration)?;
        non_negative("shark.wander_radius", self.shark.wander_radius)?;

        non_negative("flock.follow_distance", self.flock.follow_distance)?;
        non_negative("flock.spawn_radius", self.flock.spawn_radius)?;
        non_negative("flock.leader_speed_penalty", self.flock.leader_speed_penalty)?;
        positive(
            "flock.leader_speed_penalty",
            self.fish.vehicle.max_speed - self.flock.leader_speed_penalty,
        )
        .map_err(|_| SimError::InvalidConfig {
            field: "flock.leader_speed_penalty",
            value: self.flock.leader_speed_penalty,
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig { field, value })
    }
}
