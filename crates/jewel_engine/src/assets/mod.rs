//! Asset loading and preparation
//!
//! - [`loader`]: the [`AssetLoader`] seam and the background [`LoadTask`]
//! - [`obj_loader`]: reference Wavefront OBJ loader
//! - [`normalizer`]: fits a loaded asset into a fixed-size cube at the origin

pub mod loader;
pub mod normalizer;
pub mod obj_loader;

pub use loader::{AssetLoader, AssetSource, LoadError, LoadProgress, LoadTask, ProgressSink};
pub use normalizer::{AssetNormalizer, NormalizationResult};
pub use obj_loader::ObjLoader;
