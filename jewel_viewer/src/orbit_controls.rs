//! Damped orbit camera controls
//!
//! The camera sits on a sphere around a target. Rotation input adds angular
//! velocity that decays by `damping_factor` every update, so motion eases out
//! instead of stopping dead. Auto-rotation keeps spinning the azimuth.

use jewel_engine::config::CameraSettings;
use jewel_engine::foundation::math::Vec3;
use jewel_engine::render::{Camera, CameraState, Controls};

/// Keep the camera off the poles so the up vector stays valid
const POLAR_EPSILON: f32 = 1e-3;

/// Orbit controller around a fixed target
#[derive(Debug, Clone)]
pub struct OrbitControls {
    camera: Camera,
    radius: f32,
    azimuth: f32,
    polar: f32,
    azimuth_velocity: f32,
    polar_velocity: f32,
    /// Fraction of angular velocity applied (and removed) per update
    pub damping_factor: f32,
    /// Spin the camera around the target when idle
    pub auto_rotate: bool,
    /// Auto-rotation speed in orbits per minute
    pub auto_rotate_speed: f32,
}

impl OrbitControls {
    /// Build controls from camera settings, orbiting the origin
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        let camera = Camera::perspective(
            Vec3::from(settings.position),
            settings.fov_degrees,
            aspect,
            settings.near,
            settings.far,
        );
        let offset = camera.position - camera.target;
        let radius = offset.norm().max(settings.near);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);

        Self {
            camera,
            radius,
            azimuth,
            polar,
            azimuth_velocity: 0.0,
            polar_velocity: 0.0,
            damping_factor: 0.05,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }

    /// Enable auto-rotation at `speed`
    #[must_use]
    pub fn with_auto_rotate(mut self, speed: f32) -> Self {
        self.auto_rotate = true;
        self.auto_rotate_speed = speed;
        self
    }

    /// Queue a rotation impulse in radians
    pub fn rotate(&mut self, delta_azimuth: f32, delta_polar: f32) {
        self.azimuth_velocity += delta_azimuth;
        self.polar_velocity += delta_polar;
    }

    /// The controlled camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Distance from the target
    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn sync_camera(&mut self) {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        let offset = Vec3::new(sin_polar * sin_azimuth, cos_polar, sin_polar * cos_azimuth) * self.radius;
        self.camera.set_position(self.camera.target + offset);
    }
}

impl Controls for OrbitControls {
    fn update(&mut self, delta_time: f32) {
        if self.auto_rotate {
            self.azimuth_velocity += std::f32::consts::TAU / 60.0 * self.auto_rotate_speed * delta_time;
        }

        self.azimuth += self.azimuth_velocity * self.damping_factor;
        self.polar = (self.polar + self.polar_velocity * self.damping_factor)
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        self.azimuth_velocity *= 1.0 - self.damping_factor;
        self.polar_velocity *= 1.0 - self.damping_factor;

        self.sync_camera();
    }

    fn camera_state(&self) -> Option<CameraState> {
        Some(self.camera.state())
    }
}
