//! Environment lighting handle
//!
//! HDR environment maps are fetched and decoded by the render backend; the
//! scene graph only records which finished texture to use for reflections.

use serde::{Deserialize, Serialize};

/// How the environment texture is projected onto the sky sphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EnvironmentMapping {
    /// Equirectangular (lat-long) panorama used for reflections
    #[default]
    EquirectangularReflection,
    /// Six-face cube map
    CubeReflection,
}

/// Opaque reference to a finished environment texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentHandle {
    name: String,
    mapping: EnvironmentMapping,
}

impl EnvironmentHandle {
    /// Create a handle for a texture the backend has already loaded
    pub fn new(name: impl Into<String>, mapping: EnvironmentMapping) -> Self {
        Self {
            name: name.into(),
            mapping,
        }
    }

    /// Backend-side name or URI of the texture
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Projection of the texture
    pub fn mapping(&self) -> EnvironmentMapping {
        self.mapping
    }
}
