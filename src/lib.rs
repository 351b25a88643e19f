// Fish school and shark simulation built on steering behaviours.
//
// A leader fish follows a looping path, followers flock behind it and a shark
// wanders, chases and eats. The host owns rendering and collision: it steps a
// `Simulation`, reports shark/fish contacts and drains death effects.

pub mod config;
pub mod engine;
pub mod error;

pub use bevy_ecs::entity::Entity;
pub use config::SimConfig;
pub use engine::{
    CameraMode, DeathEffect, FlatTerrain, FollowCamera, HeightField, Path, SharkMode, Simulation, Terrain,
};
pub use error::SimError;
pub use glam::Vec3;
