//! # Viewer Camera
//!
//! Perspective camera used by camera controls, plus the [`CameraState`]
//! snapshot handed to everything that only needs to know where the viewer
//! is looking from.
//!
//! ## Design Principles
//! - **Library-agnostic**: No backend dependencies in camera math
//! - **Snapshot hand-off**: Controls own the camera, the render loop only
//!   ever sees a copied [`CameraState`]

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Position and viewing direction of the active camera for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Camera position in world space
    pub position: Vec3,
    /// Unit vector the camera looks along
    pub view_direction: Vec3,
}

impl CameraState {
    /// Create a state, normalizing `view_direction`
    ///
    /// A zero direction falls back to looking down `-Z`.
    pub fn new(position: Vec3, view_direction: Vec3) -> Self {
        Self {
            position,
            view_direction: view_direction
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(|| Vec3::new(0.0, 0.0, -1.0)),
        }
    }

    /// State of a camera at `position` looking at `target`
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self::new(position, target - position)
    }

    /// Point one unit in front of the camera
    pub fn focus_point(&self) -> Vec3 {
        self.position + self.view_direction
    }
}

/// 3D perspective camera
///
/// # Coordinate System
/// Uses standard right-handed Y-up coordinates:
/// - X+ = Right
/// - Y+ = Up
/// - Z- = Forward
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use jewel_engine::foundation::math::Vec3;
    /// use jewel_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(15.0, 5.0, -5.0), 45.0, 16.0 / 9.0, 0.1, 1000.0);
    /// assert!(camera.view_direction().x < 0.0);
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update camera target (look-at point)
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        log::trace!("Camera target updated to: {:?}", target);
    }

    /// Update camera aspect ratio for viewport changes
    ///
    /// Only logs changes larger than 0.01 to keep resize events quiet.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Unit vector from the camera towards its target
    pub fn view_direction(&self) -> Vec3 {
        self.state().view_direction
    }

    /// Snapshot of the camera for this frame
    pub fn state(&self) -> CameraState {
        CameraState::looking_at(self.position, self.target)
    }

    /// World-to-camera transformation
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(self.position), &Point3::from(self.target), &self.up)
    }

    /// Perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Combined view-projection matrix: P × V
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
