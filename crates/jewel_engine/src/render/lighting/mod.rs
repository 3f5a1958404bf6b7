//! Lighting: light definitions, size-adaptive rigs and the camera key light

mod follow;
mod light;
mod rig;

pub use follow::CameraFollowLight;
pub use light::{LightKind, LightSpec, ShadowSettings};
pub use rig::{LightingRig, LightingRigGenerator};
