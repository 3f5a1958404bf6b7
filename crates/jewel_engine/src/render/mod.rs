//! # Rendering Layer
//!
//! Everything between a prepared scene graph and the external renderer:
//! lights and lighting rigs, the camera, the backend traits and the render
//! loop that drives them.
//!
//! ## Architecture
//!
//! - **Lighting**: light definitions, size-adaptive rigs and the camera-following key light
//! - **Camera**: perspective camera and the per-frame [`CameraState`] snapshot
//! - **Backend**: [`RenderBackend`], [`Controls`] and [`FrameScheduler`] seams
//! - **Render loop**: [`RenderLoopController`] producing frames until stopped
//!
//! Rasterization, shading and shadow mapping belong to the backend.

pub mod backend;
pub mod camera;
pub mod lighting;
pub mod render_loop;

pub use backend::{Controls, FramePacer, FrameScheduler, RenderBackend, RenderError};
pub use camera::{Camera, CameraState};
pub use lighting::{
    CameraFollowLight, LightKind, LightSpec, LightingRig, LightingRigGenerator, ShadowSettings,
};
pub use render_loop::{FrameContext, LoopState, RenderLoopController, StopHandle, TickOutcome};
