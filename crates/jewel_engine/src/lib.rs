//! # Jewel Engine
//!
//! Core of a jewelry asset viewer: takes an imported model in whatever unit
//! it was authored in, fits it into a fixed viewing volume and lights it
//! with a rig that scales with the model.
//!
//! ## Features
//!
//! - **Bounds analysis**: world-space bounding boxes of scene graphs
//! - **Asset normalization**: uniform rescale and recentering of loaded models
//! - **Adaptive lighting**: 15-light rig proportional to the model size
//! - **Camera key light**: a shadow-casting light that follows the viewer
//! - **Render loop**: cooperative frame driver over pluggable backends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jewel_engine::prelude::*;
//!
//! struct StillCamera;
//!
//! impl Controls for StillCamera {
//!     fn update(&mut self, _delta_time: f32) {}
//!
//!     fn camera_state(&self) -> Option<CameraState> {
//!         Some(CameraState::looking_at(Vec3::new(15.0, 5.0, -5.0), Vec3::zeros()))
//!     }
//! }
//!
//! struct NullRenderer;
//!
//! impl RenderBackend for NullRenderer {
//!     fn render(&mut self, _scene: &SceneGraph, _camera: Option<&CameraState>) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut viewer = Viewer::new(ViewerSettings::default())?;
//!     viewer.load_blocking(ObjLoader, AssetSource::path("ring.obj"))?;
//!     viewer.run(&mut StillCamera, &mut NullRenderer, &mut FramePacer::new(Some(60)))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod scene;
pub mod assets;
pub mod render;
pub mod viewer;

pub use viewer::{Viewer, ViewerError};

/// Common imports for viewer users
pub mod prelude {
    pub use crate::{
        Viewer, ViewerError,
        foundation::{
            math::{Vec3, Mat4, Point3, Transform},
            time::{Timer, Stopwatch},
        },
        config::{Config, ConfigError, ViewerSettings},
        scene::{SceneGraph, Node, NodeKey, MeshData, AABB, BoundsAnalyzer, EnvironmentHandle, EnvironmentMapping},
        assets::{AssetLoader, AssetSource, AssetNormalizer, LoadError, LoadTask, ObjLoader, ProgressSink},
        render::{
            Camera, CameraState, CameraFollowLight, Controls, FramePacer, FrameScheduler,
            LightKind, LightSpec, LightingRig, LightingRigGenerator, LoopState,
            RenderBackend, RenderError, RenderLoopController, StopHandle, TickOutcome,
        },
    };
}
