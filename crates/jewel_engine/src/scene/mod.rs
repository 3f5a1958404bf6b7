//! Scene management
//!
//! The scene graph owned by the viewer, plus the bounding-volume analysis
//! that normalization and lighting-rig generation are built on.
//!
//! ```text
//! Asset loader ──► SceneGraph ──► BoundsAnalyzer ──► AABB
//! ```

mod scene_graph;
mod bounds;
mod environment;

pub use scene_graph::{SceneGraph, Node, NodeKey, NodeKind, NodeFlags, MeshData};
pub use bounds::{AABB, BoundsAnalyzer};
pub use environment::{EnvironmentHandle, EnvironmentMapping};
