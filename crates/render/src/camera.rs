use glam::{Mat4, Vec3};
use tableau_common::ProjectionMode;
use tableau_input::{CameraAction, InputSnapshot};

/// Starting pose and tuning for a [`CameraController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Initial view direction; does not need to be normalized.
    pub front: Vec3,
    pub world_up: Vec3,
    /// Vertical field of view in degrees for perspective projection.
    pub zoom_degrees: f32,
    /// Units per second at a speed factor of 1.
    pub base_speed: f32,
    /// Speed factor change per scroll notch.
    pub speed_step: f32,
    pub min_speed_factor: f32,
    /// Degrees of yaw/pitch per pointer pixel.
    pub sensitivity: f32,
    pub pitch_limit_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Half width and half height of the orthographic box.
    pub ortho_half_extent: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 12.0),
            front: Vec3::new(0.0, -0.5, -2.0),
            world_up: Vec3::Y,
            zoom_degrees: 80.0,
            base_speed: 20.0,
            speed_step: 0.1,
            min_speed_factor: 0.1,
            sensitivity: 0.1,
            pitch_limit_degrees: 89.0,
            near: 0.1,
            far: 100.0,
            ortho_half_extent: 10.0,
        }
    }
}

/// What the frame driver should do after an input update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSignal {
    Continue,
    Shutdown,
}

/// View and projection matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjection {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Fly camera driven by pointer motion, scroll and held keys.
///
/// Orientation is integrated as yaw/pitch in degrees; `front`, `right` and
/// `up` are rebuilt from them after every change. Projection switching is
/// level-triggered: whichever projection action is held forces its mode on
/// every update, and orthographic is evaluated last.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    yaw_degrees: f32,
    pitch_degrees: f32,
    zoom_degrees: f32,
    speed_factor: f32,
    movement_speed: f32,
    projection_mode: ProjectionMode,
    last_pointer: Option<(f32, f32)>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        let front = config.front.try_normalize().unwrap_or(Vec3::NEG_Z);
        let limit = config.pitch_limit_degrees;
        let mut camera = Self {
            config,
            position: config.position,
            front,
            right: Vec3::X,
            up: config.world_up,
            yaw_degrees: front.z.atan2(front.x).to_degrees(),
            pitch_degrees: front.y.clamp(-1.0, 1.0).asin().to_degrees().clamp(-limit, limit),
            zoom_degrees: config.zoom_degrees,
            speed_factor: 1.0,
            movement_speed: config.base_speed,
            projection_mode: ProjectionMode::Perspective,
            last_pointer: None,
        };
        camera.update_vectors();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw_degrees(&self) -> f32 {
        self.yaw_degrees
    }

    pub fn pitch_degrees(&self) -> f32 {
        self.pitch_degrees
    }

    pub fn zoom_degrees(&self) -> f32 {
        self.zoom_degrees
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    /// Treat the next pointer position as a fresh reference point.
    pub fn reset_pointer(&mut self) {
        self.last_pointer = None;
    }

    /// Feed an absolute pointer position in window coordinates.
    ///
    /// The first position after construction or [`Self::reset_pointer`] only
    /// sets the reference point. Screen Y grows downward, so the vertical
    /// delta is inverted before it reaches pitch.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        let Some((last_x, last_y)) = self.last_pointer.replace((x, y)) else {
            return;
        };
        self.rotate(x - last_x, last_y - y);
    }

    fn rotate(&mut self, dx: f32, dy: f32) {
        let limit = self.config.pitch_limit_degrees;
        self.yaw_degrees += dx * self.config.sensitivity;
        self.pitch_degrees = (self.pitch_degrees + dy * self.config.sensitivity).clamp(-limit, limit);
        self.update_vectors();
    }

    /// Scroll up speeds the camera up one step, scroll down slows it, never
    /// below the configured minimum factor.
    pub fn on_scroll(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.speed_factor += self.config.speed_step;
        } else if delta_y < 0.0 {
            self.speed_factor =
                (self.speed_factor - self.config.speed_step).max(self.config.min_speed_factor);
        }
        self.movement_speed = self.config.base_speed * self.speed_factor;
    }

    /// Apply one held action for `elapsed_seconds`.
    pub fn on_key_state(&mut self, action: CameraAction, elapsed_seconds: f32) -> CameraSignal {
        let distance = self.movement_speed * elapsed_seconds.max(0.0);
        match action {
            CameraAction::MoveForward => self.position += self.front * distance,
            CameraAction::MoveBackward => self.position -= self.front * distance,
            CameraAction::MoveLeft => self.position -= self.right * distance,
            CameraAction::MoveRight => self.position += self.right * distance,
            CameraAction::MoveUp => self.position += self.up * distance,
            CameraAction::MoveDown => self.position -= self.up * distance,
            CameraAction::Perspective => self.projection_mode = ProjectionMode::Perspective,
            CameraAction::Orthographic => self.projection_mode = ProjectionMode::Orthographic,
            CameraAction::Quit => return CameraSignal::Shutdown,
        }
        CameraSignal::Continue
    }

    /// Apply every held action for this frame.
    ///
    /// Order is fixed: quit, perspective, orthographic, then movement. Holding
    /// both projection actions therefore ends in orthographic.
    pub fn update(&mut self, input: &InputSnapshot, elapsed_seconds: f32) -> CameraSignal {
        let mut signal = CameraSignal::Continue;
        let order = [CameraAction::Quit, CameraAction::Perspective, CameraAction::Orthographic]
            .into_iter()
            .chain(CameraAction::ALL.into_iter().filter(|a| a.is_movement()));
        for action in order {
            if input.is_held(action)
                && self.on_key_state(action, elapsed_seconds) == CameraSignal::Shutdown
            {
                signal = CameraSignal::Shutdown;
            }
        }
        if signal == CameraSignal::Shutdown {
            tracing::info!("shutdown requested");
        }
        signal
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Projection for the current mode.
    ///
    /// The orthographic box is fixed by configuration and ignores both zoom
    /// and aspect ratio.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let near = self.config.near;
        let far = self.config.far;
        match self.projection_mode {
            ProjectionMode::Perspective => {
                let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
                    aspect_ratio
                } else {
                    tracing::debug!(aspect_ratio, "invalid aspect ratio, using 1.0");
                    1.0
                };
                Mat4::perspective_rh(self.zoom_degrees.to_radians(), aspect, near, far)
            }
            ProjectionMode::Orthographic => {
                let h = self.config.ortho_half_extent;
                Mat4::orthographic_rh(-h, h, -h, h, near, far)
            }
        }
    }

    pub fn build_view_projection(&self, aspect_ratio: f32) -> ViewProjection {
        ViewProjection {
            view: self.view_matrix(),
            projection: self.projection_matrix(aspect_ratio),
        }
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw_degrees.to_radians(), self.pitch_degrees.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(self.config.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}
