//! Adaptive lighting rig generation
//!
//! A rig is the full set of lights illuminating one asset. Its topology is
//! fixed (dual ambient, eight corner directionals, four shadowed points and
//! one spot) while every distance is a multiple of the asset's largest
//! dimension `d`, so the rig looks the same for a 2 mm stud and a 20 cm
//! pendant.
//!
//! ```text
//!          spot (1.5d, 1.5d, 1.5d)
//!               \
//!   dir ●-------● dir        ● directional at every (±d, ±d, ±d)
//!      /|  ◆   /|            ◆ asset center
//!     ● +-----● |            point lights on alternating corners
//! ```

use crate::config::RigSettings;
use crate::foundation::math::Vec3;
use crate::render::lighting::{LightKind, LightSpec, ShadowSettings};
use crate::scene::{Node, NodeKey, SceneGraph, AABB};

/// Cube corners of the eight directional lights
const DIRECTIONAL_CORNERS: [[f32; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, -1.0, -1.0],
];

/// Alternating cube corners of the four point lights (a regular tetrahedron)
const POINT_CORNERS: [[f32; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

/// Ordered set of lights generated for one asset
#[derive(Debug, Clone, PartialEq)]
pub struct LightingRig {
    lights: Vec<LightSpec>,
    dimension: f32,
    center: Vec3,
    attached: Vec<NodeKey>,
}

impl LightingRig {
    /// Lights in generation order
    pub fn lights(&self) -> &[LightSpec] {
        &self.lights
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether the rig holds no lights
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Number of lights of `kind`
    pub fn count(&self, kind: LightKind) -> usize {
        self.lights.iter().filter(|l| l.kind == kind).count()
    }

    /// Dimension the rig was laid out for, after the degenerate fallback
    pub fn dimension(&self) -> f32 {
        self.dimension
    }

    /// Center all directional and spot lights aim at
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Scene nodes holding this rig's lights, empty until attached
    pub fn attached_nodes(&self) -> &[NodeKey] {
        &self.attached
    }

    /// Whether the rig has been attached to a scene graph
    pub fn is_attached(&self) -> bool {
        !self.attached.is_empty()
    }
}

/// Builds size-relative lighting rigs
#[derive(Debug, Clone, Default)]
pub struct LightingRigGenerator {
    settings: RigSettings,
}

impl LightingRigGenerator {
    /// Create a generator with the given constants
    pub fn new(settings: RigSettings) -> Self {
        Self { settings }
    }

    /// Constants used by this generator
    pub fn settings(&self) -> &RigSettings {
        &self.settings
    }

    /// Generate the rig for an asset occupying `bounds`
    ///
    /// Always returns 15 lights: fill ambient, 8 directional, 4 point,
    /// boost ambient and 1 spot, in that order.
    pub fn generate_rig(&self, bounds: &AABB) -> LightingRig {
        let s = &self.settings;
        let measured = bounds.max_dimension();
        let d = if measured.is_finite() && measured > 0.0 {
            measured
        } else {
            log::warn!(
                "Degenerate bounds (max dimension {}), laying out rig for fallback dimension {}",
                measured, s.fallback_dimension
            );
            s.fallback_dimension
        };
        let center = bounds.center();
        let color = Vec3::from(s.color);
        let falloff_scale = (d / s.reference_dimension).powi(2);
        let shadow = ShadowSettings {
            frustum_half_extent: d,
            map_size: s.shadow_map_size,
            ..ShadowSettings::default()
        };
        let corner = |c: &[f32; 3]| center + Vec3::from(*c) * d;

        let mut lights = Vec::with_capacity(15);
        lights.push(LightSpec::ambient(color, s.ambient_fill_intensity));

        lights.extend(
            DIRECTIONAL_CORNERS
                .iter()
                .map(|c| LightSpec::directional(corner(c), center, color, s.directional_intensity)),
        );

        lights.extend(POINT_CORNERS.iter().map(|c| {
            LightSpec::point(corner(c), color, s.point_intensity * falloff_scale, s.point_range_factor * d)
                .with_decay(s.decay)
                .with_shadow(shadow)
        }));

        lights.push(LightSpec::ambient(color, s.ambient_boost_intensity));

        lights.push(
            LightSpec::spot(
                center + Vec3::repeat(s.spot_offset_factor * d),
                center,
                color,
                s.spot_intensity * falloff_scale,
                s.spot_range_factor * d,
                s.spot_angle,
                s.spot_penumbra,
            )
            .with_decay(s.decay)
            .with_shadow(shadow),
        );

        log::debug!("Generated lighting rig: {} lights, dimension {:.3}, center {:?}", lights.len(), d, center);

        LightingRig {
            lights,
            dimension: d,
            center,
            attached: Vec::new(),
        }
    }

    /// Swap the lights in `graph` from `previous` to `new`
    ///
    /// Every node of the previous rig is removed before any light of the new
    /// rig is inserted, so repeated regenerations never accumulate lights.
    /// Returns `new` with its node keys recorded.
    pub fn replace_rig(graph: &mut SceneGraph, previous: Option<LightingRig>, mut new: LightingRig) -> LightingRig {
        let stale = previous
            .into_iter()
            .flat_map(|rig| rig.attached)
            .chain(std::mem::take(&mut new.attached));
        let mut detached = 0;
        for key in stale {
            if graph.remove_node(key).is_some() {
                detached += 1;
            } else {
                log::warn!("Rig light {:?} was already gone from the scene", key);
            }
        }

        let mut counters = [0usize; 4];
        new.attached = new
            .lights
            .iter()
            .map(|light| {
                let slot = &mut counters[light.kind as usize];
                let name = format!("rig.{}.{}", kind_name(light.kind), *slot);
                *slot += 1;
                graph.add_root(Node::light(name, light.clone()))
            })
            .collect();

        log::info!("Lighting rig replaced: {} lights detached, {} attached", detached, new.attached.len());
        new
    }
}

fn kind_name(kind: LightKind) -> &'static str {
    match kind {
        LightKind::Ambient => "ambient",
        LightKind::Directional => "directional",
        LightKind::Point => "point",
        LightKind::Spot => "spot",
    }
}
