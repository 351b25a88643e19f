// Steering toolkit shared by every vehicle.
//
// Every primitive returns a force and leaves the vehicle untouched; callers
// weight and sum them, clamp the total to max_force, then hand it to
// apply_force(). Normalising a zero vector always yields zero, never NaN.

use glam::Vec3;
use rand::{Rng, RngCore};

use super::components::Vehicle;
use super::flock::{AgentSnapshot, FlockView};
use super::terrain::Terrain;
use crate::config::{BoundsConfig, SimConfig};

// ============================================================================
// STEERING AGENT
// ============================================================================

/// Everything an agent may read while computing its steering for one frame.
pub struct SteeringContext<'a> {
    pub view: &'a FlockView,
    pub terrain: &'a dyn Terrain,
    pub config: &'a SimConfig,
    pub rng: &'a mut dyn RngCore,
    pub dt: f32,
}

/// Behaviour that turns the shared world snapshot into one steering force.
pub trait SteeringAgent {
    /// Weighted sum of primitives, clamped to `vehicle.max_force`.
    fn calc_steering_forces(&mut self, vehicle: &Vehicle, ctx: &mut SteeringContext<'_>) -> Vec3;
}

// ============================================================================
// INTEGRATION
// ============================================================================

impl Vehicle {
    /// One frame: steer, then integrate.
    pub fn tick<A: SteeringAgent + ?Sized>(&mut self, agent: &mut A, ctx: &mut SteeringContext<'_>) {
        let force = agent.calc_steering_forces(self, ctx);
        self.apply_force(force);
        self.integrate(ctx.dt);
    }

    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force / self.mass;
    }

    /// Semi-implicit Euler step. Speed never exceeds `max_speed` afterwards
    /// and the accumulated acceleration is consumed.
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.velocity = self.velocity.clamp_length_max(self.max_speed);
        self.position += self.velocity * dt;

        let heading = self.velocity.normalize_or_zero();
        if heading != Vec3::ZERO {
            self.forward = heading;
        }

        self.acceleration = Vec3::ZERO;
    }

    pub fn snapshot(&self, entity: bevy_ecs::entity::Entity) -> AgentSnapshot {
        AgentSnapshot {
            entity,
            position: self.position,
            forward: self.forward,
            velocity: self.velocity,
        }
    }

    // ========================================================================
    // PRIMITIVES
    // ========================================================================

    /// Full-strength force toward `target`, net of the current velocity.
    pub fn seek(&self, target: Vec3) -> Vec3 {
        let to_target = target - self.position;
        if to_target == Vec3::ZERO {
            return Vec3::ZERO;
        }
        (to_target - self.velocity).normalize_or_zero() * self.max_force
    }

    /// Seek that fades to zero inside `radius`, scaled by distance / radius.
    pub fn arrive(&self, target: Vec3, radius: f32) -> Vec3 {
        let dist_sq = self.position.distance_squared(target);
        let radius_sq = radius * radius;
        let force = self.seek(target);

        if dist_sq < radius_sq {
            force * (dist_sq / radius_sq).sqrt()
        } else {
            force
        }
    }

    /// Seek the point `predict_dist` ahead of a moving target.
    pub fn pursue(&self, target: &AgentSnapshot, predict_dist: f32) -> Vec3 {
        self.seek(target.position + target.forward * predict_dist)
    }

    /// Flee the predicted position of `threat` while it is inside `safe_radius`.
    ///
    /// Returns `None` when the threat is far enough away; the caller uses that
    /// to decide whether it is evading this frame.
    pub fn evade(&self, threat: &AgentSnapshot, predict_dist: f32, safe_radius: f32) -> Option<Vec3> {
        if self.position.distance_squared(threat.position) >= safe_radius * safe_radius {
            return None;
        }
        let predicted = threat.position + threat.forward * predict_dist;
        Some((self.position - predicted).normalize_or_zero() * self.max_speed - self.velocity)
    }

    /// Jittered point ahead of the vehicle. Vertical jitter is half the
    /// horizontal range.
    pub fn wander_point(&self, distance: f32, radius: f32, rng: &mut dyn RngCore) -> Vec3 {
        let ahead = self.position + self.forward * distance;
        ahead + Vec3::new(
            uniform(rng, -radius, radius),
            uniform(rng, -radius / 2.0, radius / 2.0),
            uniform(rng, -radius, radius),
        )
    }

    /// Steer back inside the world box and away from the terrain and ceiling.
    ///
    /// A probe is placed `lookahead` units along the heading. Horizontal
    /// breaches steer toward the vertical axis through the origin; a probe
    /// above the ceiling steers toward cruise altitude; a probe under the
    /// terrain steers upward.
    pub fn stay_in_bounds(&self, terrain: &dyn Terrain, bounds: &BoundsConfig) -> Vec3 {
        let mut desired = Vec3::ZERO;
        let probe = self.position + self.forward * bounds.lookahead;
        let ground = terrain.sample_height(probe.x, probe.z);

        let h = bounds.half_extent;
        if probe.x < -h || probe.x > h || probe.z < -h || probe.z > h {
            desired.x = -self.position.x;
            desired.z = -self.position.z;
        }

        if probe.y > bounds.ceiling {
            desired.y = bounds.cruise_altitude - self.position.y;
        } else if probe.y < ground {
            desired.y = bounds.cruise_altitude + self.position.y;
        }

        desired.normalize_or_zero() * self.max_force
    }
}

/// Uniform sample in `[min, max)`, or `min` when the range is empty.
pub fn uniform(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    if max > min { rng.gen_range(min..max) } else { min }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VehicleParams;
    use crate::engine::terrain::FlatTerrain;
    use bevy_ecs::entity::Entity;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f32 = 1e-4;

    fn params() -> VehicleParams {
        VehicleParams { mass: 2.0, max_force: 4.0, max_speed: 3.0 }
    }

    fn resting(position: Vec3) -> Vehicle {
        Vehicle::new(position, Vec3::Z, params()).with_velocity(Vec3::ZERO)
    }

    fn snapshot_at(position: Vec3, forward: Vec3) -> AgentSnapshot {
        let entity = Entity::from_raw(1);
        AgentSnapshot { entity, position, forward, velocity: Vec3::ZERO }
    }

    #[test]
    fn integrate_clamps_speed_for_any_force() {
        for magnitude in [0.5_f32, 10.0, 1.0e4, 1.0e9] {
            let mut v = Vehicle::new(Vec3::ZERO, Vec3::X, params());
            v.apply_force(Vec3::new(1.0, -2.0, 0.5).normalize() * magnitude);
            v.integrate(0.5);
            assert!(v.velocity.length() <= v.max_speed + EPS, "{}", magnitude);
            assert_eq!(v.acceleration(), Vec3::ZERO);
        }
    }

    #[test]
    fn apply_force_divides_by_mass() {
        let mut v = resting(Vec3::ZERO);
        v.apply_force(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(v.acceleration(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn integrate_moves_and_turns() {
        let mut v = resting(Vec3::ZERO);
        v.apply_force(Vec3::new(2.0, 0.0, 0.0));
        v.integrate(1.0);
        assert!((v.velocity - Vec3::X).length() < EPS);
        assert!((v.position - Vec3::X).length() < EPS);
        assert!((v.forward - Vec3::X).length() < EPS);
    }

    #[test]
    fn stopped_vehicle_keeps_heading() {
        let mut v = Vehicle::new(Vec3::ZERO, Vec3::X, params()).with_velocity(Vec3::ZERO);
        v.integrate(1.0);
        assert_eq!(v.forward, Vec3::X);
        assert!(v.forward.is_finite());
    }

    #[test]
    fn seek_own_position_is_zero() {
        let v = Vehicle::new(Vec3::ONE, Vec3::Z, params());
        assert_eq!(v.seek(Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn seek_points_at_target_with_max_force() {
        let v = resting(Vec3::ZERO);
        let force = v.seek(Vec3::new(10.0, 0.0, 0.0));
        assert!((force.length() - v.max_force).abs() < EPS);
        assert!(force.dot(Vec3::X) > 0.0);
    }

    #[test]
    fn seek_is_net_of_velocity() {
        let v = resting(Vec3::ZERO).with_velocity(Vec3::new(0.0, 0.0, 3.0));
        let force = v.seek(Vec3::new(10.0, 0.0, 0.0));
        assert!(force.length() <= v.max_force + EPS);
        assert!(force.z < 0.0);
    }

    #[test]
    fn arrive_ramps_with_distance() {
        let v = resting(Vec3::ZERO);
        let radius = 10.0;
        let at_edge = v.arrive(Vec3::new(radius, 0.0, 0.0), radius).length();
        assert!((at_edge - v.seek(Vec3::new(radius, 0.0, 0.0)).length()).abs() < EPS);
        assert!(v.arrive(Vec3::ZERO, radius).length() < EPS);

        let mut previous = 0.0;
        for step in 1..=10 {
            let d = step as f32;
            let magnitude = v.arrive(Vec3::new(d, 0.0, 0.0), radius).length();
            assert!(magnitude > previous, "not increasing at {}", d);
            previous = magnitude;
        }
    }

    #[test]
    fn pursue_leads_the_target() {
        let v = resting(Vec3::ZERO);
        let target = snapshot_at(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        let expected = v.seek(Vec3::new(10.0, 0.0, 5.0));
        assert!((v.pursue(&target, 5.0) - expected).length() < EPS);
    }

    #[test]
    fn evade_only_inside_safe_radius() {
        let v = resting(Vec3::ZERO);
        let far = snapshot_at(Vec3::new(30.0, 0.0, 0.0), Vec3::NEG_X);
        assert_eq!(v.evade(&far, 5.0, 25.0), None);

        let near = snapshot_at(Vec3::new(10.0, 0.0, 0.0), Vec3::NEG_X);
        let force = v.evade(&near, 5.0, 25.0).expect("threat is inside the safe radius");
        assert!((force - Vec3::new(-3.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn wander_point_stays_in_jitter_box() {
        let v = resting(Vec3::ZERO);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let p = v.wander_point(20.0, 15.0, &mut rng);
            assert!(p.x.abs() <= 15.0);
            assert!(p.y.abs() <= 7.5);
            assert!((p.z - 20.0).abs() <= 15.0);
        }
    }

    #[test]
    fn wander_point_with_zero_radius_is_straight_ahead() {
        let v = resting(Vec3::ZERO);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(v.wander_point(20.0, 0.0, &mut rng), Vec3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn in_bounds_is_quiet_in_open_water() {
        let v = resting(Vec3::new(0.0, 20.0, 0.0));
        let force = v.stay_in_bounds(&FlatTerrain::new(0.0), &BoundsConfig::default());
        assert_eq!(force, Vec3::ZERO);
    }

    #[test]
    fn in_bounds_turns_toward_center_near_wall() {
        let v = Vehicle::new(Vec3::new(90.0, 20.0, 0.0), Vec3::X, params());
        let force = v.stay_in_bounds(&FlatTerrain::new(0.0), &BoundsConfig::default());
        assert!((force - Vec3::new(-v.max_force, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn in_bounds_dives_under_ceiling() {
        let v = Vehicle::new(Vec3::new(0.0, 35.0, 0.0), Vec3::Y, params());
        let force = v.stay_in_bounds(&FlatTerrain::new(0.0), &BoundsConfig::default());
        assert!((force - Vec3::new(0.0, -v.max_force, 0.0)).length() < EPS);
    }

    #[test]
    fn in_bounds_climbs_over_terrain() {
        let v = Vehicle::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Z, params());
        let force = v.stay_in_bounds(&FlatTerrain::new(10.0), &BoundsConfig::default());
        assert!((force - Vec3::new(0.0, v.max_force, 0.0)).length() < EPS);
    }
}
