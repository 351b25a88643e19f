// Mode-switching follow camera
//
// Camera model:
//   - Fish mode trails the school's centroid along its average heading
//   - Shark mode trails the predator
//   - Free mode ignores targets and is driven by look/move input
//   - Following is damped: height, position and facing each lerp toward the
//     wanted pose at their own rate
//
// Input polling stays outside; callers pass already-sampled look and move
// amounts to `free_look`.

use glam::{Mat4, Quat, Vec2, Vec3};

use super::simulation::Simulation;
use crate::config::CameraConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Fish,
    Shark,
    Free,
}

/// Pose the camera trails behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Sampled free-look input for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeLookInput {
    /// Mouse motion: x turns about up, y pitches about left.
    pub look: Vec2,
    /// Local movement axes in [-1, 1]: x right, y up, z forward.
    pub movement: Vec3,
}

pub struct FollowCamera {
    pub position: Vec3,
    /// Unit facing direction.
    forward: Vec3,
    mode: CameraMode,
    pub config: CameraConfig,

    /// Accumulated free-look angles in degrees, wrapped to (-360, 360).
    rotation_x: f32,
    rotation_y: f32,
    /// Orientation captured when free mode was entered.
    initial_rotation: Quat,
}

impl FollowCamera {
    /// Starts in fish mode.
    pub fn new(position: Vec3, forward: Vec3, config: CameraConfig) -> Self {
        let forward = forward.normalize_or_zero();
        Self {
            position,
            forward: if forward == Vec3::ZERO { Vec3::Z } else { forward },
            mode: CameraMode::Fish,
            config,
            rotation_x: 0.0,
            rotation_y: 0.0,
            initial_rotation: Quat::IDENTITY,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Switch modes. Fish mode is refused while no fish are alive.
    pub fn select(&mut self, mode: CameraMode, fish_count: usize) -> bool {
        if mode == CameraMode::Fish && fish_count == 0 {
            return false;
        }
        if mode == CameraMode::Free && self.mode != CameraMode::Free {
            self.initial_rotation = Quat::from_rotation_arc(Vec3::Z, self.forward);
            self.rotation_x = 0.0;
            self.rotation_y = 0.0;
        }
        self.mode = mode;
        true
    }

    /// Per-frame update, run after the simulation has stepped.
    pub fn update(&mut self, sim: &Simulation, dt: f32) {
        if self.mode == CameraMode::Fish && sim.fish_count() == 0 {
            self.mode = CameraMode::Shark;
        }
        if self.mode != CameraMode::Free {
            self.follow(sim.camera_target(self.mode), dt);
        }
    }

    /// Damped trail behind `target`. No target, no movement.
    pub fn follow(&mut self, target: Option<FollowTarget>, dt: f32) {
        let Some(target) = target else { return };
        let cfg = &self.config;

        let wanted_height = target.position.y + cfg.height;
        let height = lerp(self.position.y, wanted_height, cfg.height_damping * dt);

        let wanted_position = target.position - target.forward * cfg.distance;
        self.position = self.position.lerp(wanted_position, dt * cfg.position_damping);
        self.position.y = height;

        let facing = self.forward.lerp(target.forward, dt * cfg.rotation_damping).normalize_or_zero();
        if facing != Vec3::ZERO {
            self.forward = facing;
        }
    }

    /// Mouse-look and fly. Only has an effect in free mode.
    pub fn free_look(&mut self, input: FreeLookInput, dt: f32) {
        if self.mode != CameraMode::Free {
            return;
        }
        let cfg = &self.config;

        self.rotation_x = (self.rotation_x + input.look.x * cfg.look_sensitivity * dt) % 360.0;
        self.rotation_y = (self.rotation_y + input.look.y * cfg.look_sensitivity * dt) % 360.0;

        let yaw = Quat::from_axis_angle(Vec3::Y, self.rotation_x.to_radians());
        let pitch = Quat::from_axis_angle(Vec3::NEG_X, self.rotation_y.to_radians());
        let rotation = self.initial_rotation * yaw * pitch;

        self.forward = (rotation * Vec3::Z).normalize_or_zero();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;

        let m = input.movement.clamp(Vec3::NEG_ONE, Vec3::ONE);
        self.position += (right * m.x + up * m.y + self.forward * m.z) * cfg.move_speed * dt;
    }

    /// View matrix looking along the current facing.
    ///
    /// Left-handed to match the rest of the engine: facing +Z with +Y up puts
    /// +X on the right of the screen.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_lh(self.position, self.forward, Vec3::Y)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
