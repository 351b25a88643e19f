// Waypoint loop for the school leader.

use glam::Vec3;

use crate::error::SimError;

/// Default distance at which the leader counts as having reached a waypoint.
pub const DEFAULT_ARRIVAL_RADIUS: f32 = 10.0;

/// Ordered, immutable waypoint loop. The leader's cursor into it lives on
/// [`FlockState`](super::flock::FlockState) and wraps back to index 0.
#[derive(Debug, Clone)]
pub struct Path {
    waypoints: Vec<Vec3>,
    arrival_radius: f32,
}

impl Path {
    pub fn new(waypoints: Vec<Vec3>, arrival_radius: f32) -> Result<Self, SimError> {
        if waypoints.is_empty() {
            return Err(SimError::EmptyPath);
        }
        if !arrival_radius.is_finite() || arrival_radius <= 0.0 {
            return Err(SimError::InvalidArrivalRadius(arrival_radius));
        }
        Ok(Self { waypoints, arrival_radius })
    }

    /// `count` waypoints evenly spaced on a horizontal circle.
    pub fn looping_circuit(center: Vec3, radius: f32, count: usize, arrival_radius: f32) -> Result<Self, SimError> {
        let waypoints = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
            })
            .collect();
        Self::new(waypoints, arrival_radius)
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn arrival_radius(&self) -> f32 {
        self.arrival_radius
    }

    /// Waypoint at `index`, wrapping around the loop.
    pub fn point(&self, index: usize) -> Vec3 {
        self.waypoints[index % self.waypoints.len()]
    }

    /// Index after `index`, wrapping from the last waypoint to 0.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    /// True when `position` is strictly inside the arrival radius of `index`.
    pub fn arrived(&self, index: usize, position: Vec3) -> bool {
        position.distance_squared(self.point(index)) < self.arrival_radius * self.arrival_radius
    }
}
