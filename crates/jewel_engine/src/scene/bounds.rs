//! Bounding volumes of scene graphs
//!
//! [`BoundsAnalyzer`] walks every mesh reachable from the roots and unions
//! the world-space positions into a single [`AABB`].

use crate::foundation::math::{utils, Mat4, Vec3};
use crate::scene::{NodeKey, SceneGraph};

/// Axis-Aligned Bounding Box
///
/// Invariant: `min[i] <= max[i]` on every axis. Zero-volume boxes are valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from two corners, sorting them per axis
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Degenerate box containing a single point
    pub fn from_point(point: Vec3) -> Self {
        Self { min: point, max: point }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Self::from_point(first);
        for p in points {
            aabb.expand_to_include(p);
        }
        Some(aabb)
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Grow the box to contain `point`
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest edge length
    pub fn max_dimension(&self) -> f32 {
        utils::max_component(&self.size())
    }

    /// Whether the box has zero extent on its largest axis
    pub fn is_degenerate(&self) -> bool {
        self.max_dimension() <= 0.0
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }
}

/// Computes bounding boxes of scene graphs
pub struct BoundsAnalyzer;

impl BoundsAnalyzer {
    /// World-space bounds of every mesh in the graph
    ///
    /// An empty graph (or one without geometry) yields a degenerate box at
    /// the origin instead of failing.
    pub fn compute_bounding_box(graph: &SceneGraph) -> AABB {
        graph
            .roots()
            .iter()
            .filter_map(|&root| Self::accumulate(graph, root, Mat4::identity()))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| AABB::from_point(Vec3::zeros()))
    }

    /// World-space bounds of the meshes under `root`, `None` without geometry
    pub fn compute_subtree_bounds(graph: &SceneGraph, root: NodeKey) -> Option<AABB> {
        let parent_world = graph
            .get(root)?
            .parent()
            .and_then(|parent| graph.world_matrix(parent))
            .unwrap_or_else(Mat4::identity);
        Self::accumulate(graph, root, parent_world)
    }

    fn accumulate(graph: &SceneGraph, root: NodeKey, parent_world: Mat4) -> Option<AABB> {
        let mut bounds: Option<AABB> = None;
        let mut stack = vec![(root, parent_world)];

        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = graph.get(key) else {
                continue;
            };
            let world = parent_world * node.transform.to_matrix();

            if let Some(mesh) = node.as_mesh() {
                // Non-finite vertices would poison every min/max they touch
                let mesh_bounds = AABB::from_points(
                    mesh.positions
                        .iter()
                        .map(|p| world.transform_point(p).coords)
                        .filter(|p| p.iter().all(|c| c.is_finite())),
                );
                bounds = match (bounds, mesh_bounds) {
                    (Some(acc), Some(b)) => Some(acc.union(&b)),
                    (acc, b) => acc.or(b),
                };
            }

            stack.extend(node.children().iter().map(|&c| (c, world)));
        }

        bounds
    }
}
