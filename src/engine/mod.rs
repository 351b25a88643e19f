// Engine module - steering agents, school state and the frame loop
// Agents live in a bevy_ecs World; Simulation drives them one frame at a time.

pub mod camera;
pub mod components;
pub mod fish;
pub mod flock;
pub mod path;
pub mod shark;
pub mod simulation;
pub mod terrain;
pub mod vehicle;

// Re-export commonly used items
pub use camera::{CameraMode, FollowCamera, FollowTarget, FreeLookInput};
pub use components::*;
pub use flock::{AgentSnapshot, FlockState, FlockView};
pub use path::Path;
pub use simulation::{DeathEffect, Simulation};
pub use terrain::{FlatTerrain, HeightField, Terrain};
pub use vehicle::{SteeringAgent, SteeringContext};
