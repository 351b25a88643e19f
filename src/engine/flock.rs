// Shared school state.
//
// FlockState is the only writer of the population list, the leader, the path
// cursor and the derived aggregates. Agents never see it directly: once per
// tick it publishes a FlockView snapshot that every agent reads from.

use bevy_ecs::entity::Entity;
use glam::Vec3;
use log::debug;

use super::components::right_of;
use super::path::Path;

// ============================================================================
// AGENT SNAPSHOT
// ============================================================================

/// Read-only kinematics of one agent, collected before any agent steers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub forward: Vec3,
    pub velocity: Vec3,
}

impl AgentSnapshot {
    pub fn right(&self) -> Vec3 {
        right_of(self.forward)
    }
}

// ============================================================================
// FLOCK VIEW
// ============================================================================

/// Everything an agent may read about the world during one tick.
#[derive(Debug, Clone)]
pub struct FlockView {
    /// Fish in population order. Index 0 is the leader.
    pub population: Vec<AgentSnapshot>,
    pub predator: Option<AgentSnapshot>,
    pub centroid: Vec3,
    /// Unit average heading, or zero when the school is empty.
    pub heading: Vec3,
    pub follow_point: Vec3,
    pub follow_distance: f32,
    /// Waypoint the leader is currently seeking.
    pub next_waypoint: Vec3,
}

impl FlockView {
    pub fn leader(&self) -> Option<&AgentSnapshot> {
        self.population.first()
    }

    /// Everyone except the leader.
    pub fn followers(&self) -> &[AgentSnapshot] {
        self.population.get(1..).unwrap_or(&[])
    }

    /// Snapshot of `entity` if it is still a living member of the school.
    pub fn member(&self, entity: Entity) -> Option<&AgentSnapshot> {
        self.population.iter().find(|m| m.entity == entity)
    }
}

// ============================================================================
// FLOCK STATE
// ============================================================================

/// Outcome of removing one fish from the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub was_leader: bool,
    /// Fish promoted to leader, if the leader was removed and anyone is left.
    pub promoted: Option<Entity>,
}

pub struct FlockState {
    population: Vec<Entity>,
    predator: Option<Entity>,
    path: Path,
    path_index: usize,
    follow_distance: f32,
    follow_point: Vec3,
    centroid: Vec3,
    heading: Vec3,
}

impl FlockState {
    pub fn new(path: Path, follow_distance: f32) -> Self {
        Self {
            population: Vec::new(),
            predator: None,
            path,
            path_index: 0,
            follow_distance,
            follow_point: Vec3::ZERO,
            centroid: Vec3::ZERO,
            heading: Vec3::ZERO,
        }
    }

    /// Append a fish. Returns true if it became the leader.
    pub fn push(&mut self, fish: Entity) -> bool {
        self.population.push(fish);
        self.population.len() == 1
    }

    pub fn set_predator(&mut self, predator: Option<Entity>) {
        self.predator = predator;
    }

    pub fn population(&self) -> &[Entity] {
        &self.population
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn contains(&self, fish: Entity) -> bool {
        self.population.contains(&fish)
    }

    pub fn leader(&self) -> Option<Entity> {
        self.population.first().copied()
    }

    pub fn predator(&self) -> Option<Entity> {
        self.predator
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn next_waypoint(&self) -> Vec3 {
        self.path.point(self.path_index)
    }

    pub fn follow_distance(&self) -> f32 {
        self.follow_distance
    }

    pub fn follow_point(&self) -> Vec3 {
        self.follow_point
    }

    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Remove `fish`, promoting the next fish when the leader goes.
    ///
    /// Returns `None` if it was not a member. Must not be called while agents
    /// are iterating the population; the simulation queues removals and
    /// applies them between ticks.
    pub fn remove(&mut self, fish: Entity) -> Option<Removal> {
        let index = self.population.iter().position(|&e| e == fish)?;
        self.population.remove(index);

        let was_leader = index == 0;
        let promoted = if was_leader { self.leader() } else { None };
        if let Some(new_leader) = promoted {
            debug!("Leader {:?} lost, promoting {:?}", fish, new_leader);
        }

        Some(Removal { was_leader, promoted })
    }

    /// Per-tick update from the members' current kinematics, given in
    /// population order.
    pub fn refresh(&mut self, members: &[AgentSnapshot]) {
        if let Some(leader) = members.first() {
            self.track_leader(leader);
        }
        self.aggregate(members);
    }

    /// Move the follow point behind the leader and advance the path cursor
    /// once the leader is inside the arrival radius.
    pub fn track_leader(&mut self, leader: &AgentSnapshot) {
        self.follow_point = leader.position - leader.forward * self.follow_distance;
        self.check_arrival(leader.position);
    }

    /// Returns true if the cursor advanced.
    pub fn check_arrival(&mut self, leader_position: Vec3) -> bool {
        if !self.path.arrived(self.path_index, leader_position) {
            return false;
        }
        self.path_index = self.path.next_index(self.path_index);
        debug!("Leader reached waypoint, heading for #{}", self.path_index);
        true
    }

    /// Recompute centroid and average heading. Both are zero for an empty
    /// school.
    pub fn aggregate(&mut self, members: &[AgentSnapshot]) {
        self.centroid = Vec3::ZERO;
        self.heading = Vec3::ZERO;
        if members.is_empty() {
            return;
        }

        let count = members.len() as f32;
        for m in members {
            self.centroid += m.position;
            self.heading += m.forward;
        }
        self.centroid /= count;
        self.heading = (self.heading / count).normalize_or_zero();
    }

    /// Publish the read-only view agents steer from this tick.
    pub fn view(&self, population: Vec<AgentSnapshot>, predator: Option<AgentSnapshot>) -> FlockView {
        FlockView {
            population,
            predator,
            centroid: self.centroid,
            heading: self.heading,
            follow_point: self.follow_point,
            follow_distance: self.follow_distance,
            next_waypoint: self.next_waypoint(),
        }
    }
}
