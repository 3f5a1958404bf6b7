//! # Viewer Settings
//!
//! All tunables of the viewer core grouped by subsystem. Every struct uses
//! `#[serde(default)]`, so a config file only needs the values it changes.
//!
//! ```toml
//! [normalize]
//! desired_size = 10.0
//!
//! [rig]
//! spot_angle = 0.15
//! ```

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Asset normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Edge length of the largest axis after normalization
    pub desired_size: f32,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self { desired_size: 10.0 }
    }
}

/// Lighting rig constants
///
/// Distances are multiples of the asset's largest dimension; intensities of
/// point and spot lights are nominal at `reference_dimension` and scale with
/// the square of the size ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigSettings {
    /// Dimension used when the bounding box is degenerate
    pub fallback_dimension: f32,
    /// Asset size at which point/spot intensities are used unscaled
    pub reference_dimension: f32,
    /// Linear RGB color shared by all rig lights
    pub color: [f32; 3],
    /// Low ambient fill intensity
    pub ambient_fill_intensity: f32,
    /// High ambient intensity compensating metallic darkening
    pub ambient_boost_intensity: f32,
    /// Intensity of each corner directional light
    pub directional_intensity: f32,
    /// Nominal point light intensity
    pub point_intensity: f32,
    /// Point light range as a multiple of the dimension
    pub point_range_factor: f32,
    /// Nominal spot light intensity
    pub spot_intensity: f32,
    /// Spot distance along the positive diagonal, per axis
    pub spot_offset_factor: f32,
    /// Spot light range as a multiple of the dimension
    pub spot_range_factor: f32,
    /// Spot cone half-angle in radians
    pub spot_angle: f32,
    /// Spot penumbra fraction
    pub spot_penumbra: f32,
    /// Falloff exponent of point and spot lights
    pub decay: f32,
    /// Shadow map resolution for shadow-casting rig lights
    pub shadow_map_size: u32,
}

impl Default for RigSettings {
    fn default() -> Self {
        Self {
            fallback_dimension: 1.0,
            reference_dimension: 10.0,
            color: [1.0, 1.0, 1.0],
            ambient_fill_intensity: 0.5,
            ambient_boost_intensity: 2.5,
            directional_intensity: 3.0,
            point_intensity: 3.0,
            point_range_factor: 3.0,
            spot_intensity: 10.0,
            spot_offset_factor: 1.5,
            spot_range_factor: 4.0,
            spot_angle: 0.15,
            spot_penumbra: 1.0,
            decay: 2.0,
            shadow_map_size: 1024,
        }
    }
}

/// The shadow-casting directional light that follows the camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyLightSettings {
    /// Whether the viewer creates and tracks the key light at all
    pub enabled: bool,
    /// Linear RGB color
    pub color: [f32; 3],
    /// Light intensity
    pub intensity: f32,
    /// Half extent of the orthographic shadow frustum
    pub shadow_half_extent: f32,
}

impl Default for KeyLightSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            color: [1.0, 1.0, 1.0],
            intensity: 8.0,
            shadow_half_extent: 10.0,
        }
    }
}

/// Initial camera placement handed to the controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Camera position in world space
    pub position: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [15.0, 5.0, -5.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Render loop pacing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Frame rate cap, unlimited when `None`
    pub target_fps: Option<u32>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// # Complete Viewer Configuration
///
/// Top-level configuration that encompasses every subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Asset normalization
    pub normalize: NormalizeSettings,
    /// Lighting rig generation
    pub rig: RigSettings,
    /// Camera-following key light
    pub key_light: KeyLightSettings,
    /// Initial camera
    pub camera: CameraSettings,
    /// Render loop pacing
    pub render_loop: LoopSettings,
    /// Logging
    pub logging: LoggingSettings,
    /// Static help text shown in the GUI panel
    pub instructions: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            normalize: NormalizeSettings::default(),
            rig: RigSettings::default(),
            key_light: KeyLightSettings::default(),
            camera: CameraSettings::default(),
            render_loop: LoopSettings::default(),
            logging: LoggingSettings::default(),
            instructions: "Left drag: rotate\nRight drag: pan\nScroll: zoom\nDouble click: fullscreen".to_string(),
        }
    }
}

fn require_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a positive finite number, got {value}")))
    }
}

impl ViewerSettings {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("normalize.desired_size", self.normalize.desired_size)?;

        let rig = &self.rig;
        require_positive("rig.fallback_dimension", rig.fallback_dimension)?;
        require_positive("rig.reference_dimension", rig.reference_dimension)?;
        require_positive("rig.point_range_factor", rig.point_range_factor)?;
        require_positive("rig.spot_offset_factor", rig.spot_offset_factor)?;
        require_positive("rig.spot_range_factor", rig.spot_range_factor)?;
        if !(rig.spot_angle > 0.0 && rig.spot_angle < std::f32::consts::FRAC_PI_2) {
            return Err(ConfigError::Invalid(format!(
                "rig.spot_angle must be in (0, pi/2), got {}",
                rig.spot_angle
            )));
        }

        if self.key_light.enabled {
            require_positive("key_light.shadow_half_extent", self.key_light.shadow_half_extent)?;
        }

        require_positive("camera.fov_degrees", self.camera.fov_degrees)?;
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                self.camera.near, self.camera.far
            )));
        }

        if self.render_loop.target_fps == Some(0) {
            return Err(ConfigError::Invalid("render_loop.target_fps must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl Config for ViewerSettings {}
