// Schooling behaviour.
//
// Every fish evades the shark and stays in bounds. When not evading, the
// leader seeks the next waypoint and followers combine cohesion, alignment,
// separation and an arrive at the follow point behind the leader.

use glam::Vec3;

use super::components::{Fish, FishRole, Vehicle};
use super::flock::FlockView;
use super::vehicle::{SteeringAgent, SteeringContext};

impl SteeringAgent for Fish {
    fn calc_steering_forces(&mut self, vehicle: &Vehicle, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let cfg = &ctx.config.fish;
        let view = ctx.view;
        let mut steer = Vec3::ZERO;

        self.evading = false;
        if let Some(shark) = &view.predator {
            if let Some(flee) = vehicle.evade(shark, cfg.evade_predict_distance, cfg.safe_radius) {
                self.evading = true;
                steer += flee * cfg.evade_weight;
            }
        }

        steer += vehicle.stay_in_bounds(ctx.terrain, &ctx.config.bounds) * cfg.in_bounds_weight;

        if !self.evading {
            match self.role {
                FishRole::Leader => {
                    steer += vehicle.seek(view.next_waypoint) * cfg.seek_weight;
                }
                FishRole::Follower => {
                    steer += vehicle.seek(view.centroid) * cfg.cohesion_weight;
                    steer += align(vehicle, view.heading) * cfg.align_weight;
                    steer += separation(vehicle, view, cfg.separate_distance) * cfg.separate_weight;
                    steer += vehicle.arrive(view.follow_point, view.follow_distance) * cfg.seek_weight;
                }
            }
        }

        steer.clamp_length_max(vehicle.max_force)
    }
}

/// Steer toward the school's average heading at full speed.
pub fn align(vehicle: &Vehicle, heading: Vec3) -> Vec3 {
    heading.normalize_or_zero() * vehicle.max_speed - vehicle.velocity
}

/// Keep out of the leader's way and off the other followers.
///
/// Inside the follow distance of the leader the fish heads for one of the
/// leader's flanks. It takes the leader's left flank when exactly one of "the
/// offset from the leader points along my right" and "we face opposite ways"
/// holds, otherwise the leader's right flank.
/// Every other follower whose squared distance is below `separate_distance`
/// pushes back with a weight of one over its distance. `separate_distance`
/// is compared against the squared distance as given.
pub fn separation(vehicle: &Vehicle, view: &FlockView, separate_distance: f32) -> Vec3 {
    let mut desired = Vec3::ZERO;

    if let Some(leader) = view.leader() {
        let from_leader = vehicle.position - leader.position;
        let follow_sq = view.follow_distance * view.follow_distance;

        if from_leader.length_squared() < follow_sq {
            let offset_on_my_right = vehicle.right().dot(from_leader) > 0.0;
            let facing_away = vehicle.forward.dot(leader.forward) < 0.0;
            let flank = leader.right() * view.follow_distance;

            desired += if offset_on_my_right ^ facing_away {
                vehicle.seek(leader.position - flank)
            } else {
                vehicle.seek(leader.position + flank)
            };
        }
    }

    for other in view.followers() {
        let from_other = vehicle.position - other.position;
        let dist_sq = from_other.length_squared();
        if dist_sq > 0.0 && dist_sq < separate_distance {
            desired += from_other.normalize_or_zero() / dist_sq.sqrt();
        }
    }

    if desired.length_squared() > 0.0 {
        desired.normalize_or_zero() * vehicle.max_speed - vehicle.velocity
    } else {
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SimConfig, VehicleParams};
    use crate::engine::flock::AgentSnapshot;
    use crate::engine::terrain::FlatTerrain;
    use bevy_ecs::entity::Entity;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f32 = 1e-4;

    fn params() -> VehicleParams {
        VehicleParams { mass: 1.0, max_force: 8.0, max_speed: 6.0 }
    }

    fn snap(n: u32, position: Vec3, forward: Vec3) -> AgentSnapshot {
        AgentSnapshot { entity: Entity::from_raw(n), position, forward, velocity: forward }
    }

    fn view(population: Vec<AgentSnapshot>, predator: Option<AgentSnapshot>) -> FlockView {
        FlockView {
            population,
            predator,
            centroid: Vec3::new(0.0, 20.0, 0.0),
            heading: Vec3::Z,
            follow_point: Vec3::new(0.0, 20.0, -1.5),
            follow_distance: 1.5,
            next_waypoint: Vec3::new(0.0, 20.0, 50.0),
        }
    }

    fn steer(fish: &mut Fish, vehicle: &Vehicle, view: &FlockView) -> Vec3 {
        let config = SimConfig::default();
        let terrain = FlatTerrain::new(0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = SteeringContext { view, terrain: &terrain, config: &config, rng: &mut rng, dt: 0.1 };
        fish.calc_steering_forces(vehicle, &mut ctx)
    }

    #[test]
    fn leader_heads_for_waypoint() {
        let vehicle = Vehicle::new(Vec3::new(0.0, 20.0, 0.0), Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let v = view(vec![snap(1, vehicle.position, Vec3::Z)], None);
        let mut fish = Fish::leader();
        let force = steer(&mut fish, &vehicle, &v);
        assert!(!fish.evading);
        assert!((force - Vec3::new(0.0, 0.0, 8.0)).length() < EPS);
    }

    #[test]
    fn shark_inside_safe_radius_overrides_flocking() {
        let vehicle = Vehicle::new(Vec3::new(0.0, 20.0, 0.0), Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let shark = snap(9, Vec3::new(0.0, 20.0, 10.0), Vec3::NEG_Z);
        let v = view(vec![snap(1, vehicle.position, Vec3::Z)], Some(shark));
        let mut fish = Fish::leader();
        let force = steer(&mut fish, &vehicle, &v);
        assert!(fish.evading);
        assert!(force.z < 0.0, "should flee away from the shark, got {:?}", force);
        assert!(force.length() <= vehicle.max_force + EPS);
    }

    #[test]
    fn evading_flag_resets_when_shark_leaves() {
        let vehicle = Vehicle::new(Vec3::new(0.0, 20.0, 0.0), Vec3::Z, params());
        let far_shark = snap(9, Vec3::new(0.0, 20.0, 90.0), Vec3::Z);
        let v = view(vec![snap(1, vehicle.position, Vec3::Z)], Some(far_shark));
        let mut fish = Fish { role: FishRole::Leader, evading: true };
        steer(&mut fish, &vehicle, &v);
        assert!(!fish.evading);
    }

    #[test]
    fn follower_force_is_clamped() {
        let leader = snap(1, Vec3::new(0.0, 20.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::new(0.5, 20.0, -1.0), Vec3::Z, params());
        let others = vec![leader, snap(2, vehicle.position, Vec3::Z), snap(3, Vec3::new(1.0, 20.0, -1.0), Vec3::Z)];
        let v = view(others, None);
        let force = steer(&mut Fish::follower(), &vehicle, &v);
        assert!(force.length() <= vehicle.max_force + EPS);
        assert!(force.is_finite());
    }

    #[test]
    fn align_targets_heading_at_full_speed() {
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::X, params()).with_velocity(Vec3::X);
        assert!((align(&vehicle, Vec3::new(0.0, 0.0, 2.0)) - Vec3::new(-1.0, 0.0, 6.0)).length() < EPS);
    }

    #[test]
    fn align_with_no_heading_just_brakes() {
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::X, params()).with_velocity(Vec3::X);
        assert_eq!(align(&vehicle, Vec3::ZERO), -Vec3::X);
    }

    #[test]
    fn separation_is_zero_when_alone() {
        let leader = snap(1, Vec3::new(50.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params());
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z)], None);
        assert_eq!(separation(&vehicle, &v, 5.0), Vec3::ZERO);
    }

    #[test]
    fn separation_pushes_away_from_close_follower() {
        let leader = snap(1, Vec3::new(50.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z), snap(3, Vec3::new(1.0, 0.0, 0.0), Vec3::Z)], None);
        let force = separation(&vehicle, &v, 5.0);
        assert!((force - Vec3::new(-6.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn separation_weights_neighbours_by_inverse_distance() {
        let leader = snap(1, Vec3::new(50.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let v = view(
            vec![
                leader,
                snap(2, Vec3::ZERO, Vec3::Z),
                snap(3, Vec3::new(1.0, 0.0, 0.0), Vec3::Z),
                snap(4, Vec3::new(0.0, 0.0, 2.0), Vec3::Z),
            ],
            None,
        );
        // (-1, 0, 0) / 1 + (0, 0, -1) / 2
        let expected = Vec3::new(-1.0, 0.0, -0.5).normalize() * 6.0;
        let force = separation(&vehicle, &v, 5.0);
        assert!((force - expected).length() < EPS, "got {:?}", force);
    }

    #[test]
    fn separation_threshold_is_compared_to_squared_distance() {
        // 3 units away: 9 is not below 5, so this neighbour is ignored.
        let leader = snap(1, Vec3::new(50.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params());
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z), snap(3, Vec3::new(3.0, 0.0, 0.0), Vec3::Z)], None);
        assert_eq!(separation(&vehicle, &v, 5.0), Vec3::ZERO);

        // 2 units away: 4 is below 5.
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z), snap(3, Vec3::new(2.0, 0.0, 0.0), Vec3::Z)], None);
        assert_ne!(separation(&vehicle, &v, 5.0), Vec3::ZERO);
    }

    #[test]
    fn separation_ignores_the_leader_as_a_neighbour() {
        // Leader is close but outside the follow distance, so only the
        // neighbour loop could react to it, and it must not.
        let leader = snap(1, Vec3::new(2.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params());
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z)], None);
        assert_eq!(separation(&vehicle, &v, 5.0), Vec3::ZERO);
    }

    #[test]
    fn same_heading_leader_on_our_right_takes_its_right_flank() {
        // Leader at +X of us; our right is +X, so from_leader points -X and
        // right·from_leader < 0. Same heading, so the XOR is false: right flank.
        let leader = snap(1, Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z)], None);
        let force = separation(&vehicle, &v, 5.0);
        // Right flank is (1 + 1.5, 0, 0).
        assert!(force.x > 0.0);
        assert!((force.length() - vehicle.max_speed).abs() < EPS);
    }

    #[test]
    fn same_heading_leader_on_our_left_takes_its_left_flank() {
        let leader = snap(1, Vec3::new(-1.0, 0.0, 0.0), Vec3::Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z)], None);
        let force = separation(&vehicle, &v, 5.0);
        // Left flank is (-1 - 1.5, 0, 0).
        assert!(force.x < 0.0);
    }

    #[test]
    fn opposite_heading_flips_the_flank() {
        let leader = snap(1, Vec3::new(-1.0, 0.0, 0.0), Vec3::NEG_Z);
        let vehicle = Vehicle::new(Vec3::ZERO, Vec3::Z, params()).with_velocity(Vec3::ZERO);
        let v = view(vec![leader, snap(2, Vec3::ZERO, Vec3::Z)], None);
        let force = separation(&vehicle, &v, 5.0);
        // right·from_leader > 0 and facing away: XOR false, so the leader's
        // right flank. The leader faces -Z, its right is -X: (-2.5, 0, 0).
        assert!(force.x < 0.0);
    }
}
