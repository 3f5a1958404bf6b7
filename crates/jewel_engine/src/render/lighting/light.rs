//! Light source definitions
//!
//! Lights are pure data: the render backend decides how each kind is shaded.
//! Positions and targets are stored in world space because rig lights are
//! attached as scene roots.

use crate::foundation::math::Vec3;

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Uniform fill light without position or direction
    Ambient,
    /// Parallel rays from `position` towards `target`
    Directional,
    /// Omnidirectional light from a point
    Point,
    /// Cone of light from `position` towards `target`
    Spot,
}

/// Shadow map parameters for shadow-casting lights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Half extent of the orthographic shadow frustum (directional lights)
    pub frustum_half_extent: f32,
    /// Depth bias applied when sampling the shadow map
    pub bias: f32,
    /// Shadow map resolution in texels per side
    pub map_size: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            frustum_half_extent: 10.0,
            bias: -0.0005,
            map_size: 1024,
        }
    }
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct LightSpec {
    /// Light type
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// World-space position, unused by ambient lights
    pub position: Vec3,
    /// World-space aim point for directional and spot lights
    pub target: Option<Vec3>,
    /// Whether the light renders into a shadow map
    pub casts_shadow: bool,
    /// Falloff distance for point/spot lights, `0.0` means unlimited
    pub range: f32,
    /// Spot cone half-angle in radians
    pub angle: f32,
    /// Spot penumbra fraction in `[0, 1]`
    pub penumbra: f32,
    /// Physical falloff exponent for point/spot lights
    pub decay: f32,
    /// Shadow parameters, present when `casts_shadow` is set
    pub shadow: Option<ShadowSettings>,
}

impl LightSpec {
    fn base(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            position: Vec3::zeros(),
            target: None,
            casts_shadow: false,
            range: 0.0,
            angle: 0.0,
            penumbra: 0.0,
            decay: 0.0,
            shadow: None,
        }
    }

    /// Create an ambient light
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self::base(LightKind::Ambient, color, intensity)
    }

    /// Create a directional light shining from `position` towards `target`
    pub fn directional(position: Vec3, target: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            target: Some(target),
            ..Self::base(LightKind::Directional, color, intensity)
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            position,
            range,
            decay: 2.0,
            ..Self::base(LightKind::Point, color, intensity)
        }
    }

    /// Create a spot light
    pub fn spot(
        position: Vec3,
        target: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        angle: f32,
        penumbra: f32,
    ) -> Self {
        Self {
            position,
            target: Some(target),
            range,
            angle,
            penumbra: penumbra.clamp(0.0, 1.0),
            decay: 2.0,
            ..Self::base(LightKind::Spot, color, intensity)
        }
    }

    /// Enable shadow casting with the given parameters
    #[must_use]
    pub fn with_shadow(mut self, shadow: ShadowSettings) -> Self {
        self.casts_shadow = true;
        self.shadow = Some(shadow);
        self
    }

    /// Override the falloff exponent
    #[must_use]
    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    /// Normalized direction from position to target
    ///
    /// `None` for lights without a target or when both coincide.
    pub fn direction(&self) -> Option<Vec3> {
        let target = self.target?;
        (target - self.position).try_normalize(f32::EPSILON)
    }
}
