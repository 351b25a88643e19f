// Predator state machine.
//
//   Wander --prey within chase radius--> Chase
//   Chase  --timeout or prey gone------> Eat
//   Eat    --eat duration elapsed------> Wander
//
// A reported contact with a living fish outside of Eat jumps straight to Eat
// and asks the simulation to remove that fish (see `on_contact`).

use bevy_ecs::entity::Entity;
use glam::Vec3;
use log::debug;

use super::components::{Shark, SharkMode, Vehicle};
use super::flock::AgentSnapshot;
use super::vehicle::{SteeringAgent, SteeringContext};
use crate::config::SharkConfig;

impl SteeringAgent for Shark {
    fn calc_steering_forces(&mut self, vehicle: &Vehicle, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let cfg = ctx.config.shark;
        let mut steer = Vec3::ZERO;

        self.decision_timer += ctx.dt;

        match self.mode {
            SharkMode::Wander => {
                steer += self.wander(vehicle, ctx, &cfg);

                self.target = nearest_prey(vehicle.position, &ctx.view.population, cfg.chase_radius);
                if let Some(prey) = self.target {
                    debug!("Shark spotted {:?}, giving chase", prey);
                    self.mode = SharkMode::Chase;
                }
            }
            SharkMode::Chase => {
                self.chase_timer += ctx.dt;

                let prey = self.target.and_then(|e| ctx.view.member(e));
                match prey {
                    Some(prey) if self.chase_timer <= cfg.chase_timeout => {
                        steer += vehicle.pursue(prey, cfg.pursue_predict_distance) * cfg.chase_weight;
                    }
                    _ => {
                        debug!(
                            "Shark gave up the chase after {:.1}s (target lost: {})",
                            self.chase_timer,
                            prey.is_none()
                        );
                        self.target = None;
                        self.mode = SharkMode::Eat;
                    }
                }
            }
            SharkMode::Eat => {
                steer += self.wander(vehicle, ctx, &cfg);

                self.eat_timer += ctx.dt;
                if self.eat_timer > cfg.eat_duration {
                    self.chase_timer = 0.0;
                    self.eat_timer = 0.0;
                    self.mode = SharkMode::Wander;
                    debug!("Shark is hungry again");
                }
            }
        }

        steer += vehicle.stay_in_bounds(ctx.terrain, &ctx.config.bounds) * cfg.in_bounds_weight;

        steer.clamp_length_max(vehicle.max_force)
    }
}

impl Shark {
    /// Seek the current wander point, re-rolling it every decision interval.
    fn wander(&mut self, vehicle: &Vehicle, ctx: &mut SteeringContext<'_>, cfg: &SharkConfig) -> Vec3 {
        if self.decision_timer > cfg.decision_interval {
            self.decision_timer = 0.0;
            self.wander_point = vehicle.wander_point(cfg.wander_distance, cfg.wander_radius, &mut *ctx.rng);
        }
        vehicle.seek(self.wander_point) * cfg.wander_weight
    }

    /// Contact with `prey` reported by the collision feed.
    ///
    /// Returns true when the fish should be eaten: it is still alive and the
    /// shark is not already digesting. The shark then switches to Eat at once,
    /// independently of its timers, and drops whatever it was chasing.
    pub fn on_contact(&mut self, prey: Entity, prey_alive: bool) -> bool {
        if !prey_alive || self.mode == SharkMode::Eat {
            return false;
        }
        debug!("Shark caught {:?}", prey);
        self.target = None;
        self.mode = SharkMode::Eat;
        true
    }
}

/// Closest fish strictly inside `radius`, first one wins on ties.
pub fn nearest_prey(position: Vec3, population: &[AgentSnapshot], radius: f32) -> Option<Entity> {
    let radius_sq = radius * radius;
    let mut closest = None;
    let mut closest_sq = radius_sq;

    for fish in population {
        let dist_sq = position.distance_squared(fish.position);
        if dist_sq < radius_sq && dist_sq < closest_sq {
            closest = Some(fish.entity);
            closest_sq = dist_sq;
        }
    }

    closest
}
