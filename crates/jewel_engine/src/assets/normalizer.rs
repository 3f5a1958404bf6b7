//! Asset normalization
//!
//! Imported jewelry arrives in whatever unit the modelling tool exported
//! (millimetres, metres, inches). Normalization rescales the asset so its
//! largest axis spans a fixed size and moves its center onto the origin, so
//! camera distance and lighting never depend on the source unit.

use crate::foundation::math::Vec3;
use crate::scene::{BoundsAnalyzer, NodeKey, SceneGraph};

/// Outcome of normalizing one asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationResult {
    /// Uniform scale applied to the asset root
    pub scale_factor: f32,
    /// Translation applied to the asset root after scaling
    pub center_offset: Vec3,
}

impl NormalizationResult {
    /// Result of a normalization that changed nothing
    pub fn identity() -> Self {
        Self {
            scale_factor: 1.0,
            center_offset: Vec3::zeros(),
        }
    }
}

/// Rescales and recenters assets
pub struct AssetNormalizer;

impl AssetNormalizer {
    /// Fit the subtree under `root` into a `desired_size` cube centered on the origin
    ///
    /// Measures the subtree, scales `root` uniformly so the largest dimension
    /// becomes `desired_size`, re-measures, and translates `root` so the new
    /// center lands on the origin. Degenerate geometry keeps scale 1. A root
    /// without geometry (or a missing root) is left untouched.
    ///
    /// `root` may sit anywhere in the graph: the world-space recentering offset
    /// is mapped into its parent's space before it is applied.
    pub fn normalize(graph: &mut SceneGraph, root: NodeKey, desired_size: f32) -> NormalizationResult {
        let Some(before) = BoundsAnalyzer::compute_subtree_bounds(graph, root) else {
            log::warn!("Asset {:?} has no geometry, skipping normalization", root);
            return NormalizationResult::identity();
        };

        let max_dim = before.max_dimension();
        let scale_factor = if max_dim > 0.0 && max_dim.is_finite() {
            desired_size / max_dim
        } else {
            log::warn!("Asset extent {} is not usable, keeping its original scale", max_dim);
            1.0
        };

        if let Some(node) = graph.get_mut(root) {
            node.transform.scale_uniformly(scale_factor);
        }
        graph.mark_dirty(root);

        let after = BoundsAnalyzer::compute_subtree_bounds(graph, root).unwrap_or(before);
        let center_offset = -after.center();
        let local_offset = Self::to_parent_space(graph, root, center_offset);
        if let Some(node) = graph.get_mut(root) {
            node.transform.position += local_offset;
        }
        graph.mark_dirty(root);

        log::info!(
            "Normalized asset: max dimension {:.4} -> {:.4} (scale {:.4}), offset {:?}",
            max_dim,
            max_dim * scale_factor,
            scale_factor,
            center_offset
        );

        NormalizationResult {
            scale_factor,
            center_offset,
        }
    }

    fn to_parent_space(graph: &SceneGraph, root: NodeKey, offset: Vec3) -> Vec3 {
        let Some(parent) = graph.get(root).and_then(|node| node.parent()) else {
            return offset;
        };
        match graph.world_matrix(parent).and_then(|m| m.try_inverse()) {
            Some(inverse) => inverse.transform_vector(&offset),
            None => {
                log::warn!("Parent of asset {:?} is not invertible, applying offset unconverted", root);
                offset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Transform};
    use crate::scene::{MeshData, Node, AABB};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn box_mesh(min: Vec3, max: Vec3) -> MeshData {
        let mut positions = Vec::new();
        for x in [min.x, max.x] {
            for y in [min.y, max.y] {
                for z in [min.z, max.z] {
                    positions.push(Point3::new(x, y, z));
                }
            }
        }
        MeshData::new(positions, Vec::new())
    }

    fn asset(graph: &mut SceneGraph, mesh: MeshData) -> NodeKey {
        let root = graph.add_root(Node::group("asset"));
        graph.add_child(root, Node::mesh("body", mesh));
        root
    }

    #[test]
    fn test_unit_cube_scales_to_desired_size() {
        let mut graph = SceneGraph::new();
        let root = asset(&mut graph, box_mesh(Vec3::repeat(-1.0), Vec3::repeat(1.0)));

        let result = AssetNormalizer::normalize(&mut graph, root, 10.0);

        assert_relative_eq!(result.scale_factor, 5.0);
        assert_relative_eq!(result.center_offset, Vec3::zeros());
        let bounds = BoundsAnalyzer::compute_bounding_box(&graph);
        assert_relative_eq!(bounds.min, Vec3::repeat(-5.0));
        assert_relative_eq!(bounds.max, Vec3::repeat(5.0));
    }

    #[test]
    fn test_random_boxes_end_centered_at_desired_size() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let min = Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let extent = Vec3::new(rng.gen_range(5.0..200.0), rng.gen_range(0.1..200.0), rng.gen_range(0.1..200.0));
            let desired = rng.gen_range(0.5..20.0);

            let mut graph = SceneGraph::new();
            let root = asset(&mut graph, box_mesh(min, min + extent));
            AssetNormalizer::normalize(&mut graph, root, desired);

            let bounds = BoundsAnalyzer::compute_bounding_box(&graph);
            assert_relative_eq!(bounds.max_dimension(), desired, max_relative = 1e-3);
            assert!(bounds.center().norm() < 1e-2, "center {:?}", bounds.center());
        }
    }

    #[test]
    fn test_offset_and_existing_transform_are_respected() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(
            Node::group("asset").with_transform(Transform::from_position(Vec3::new(100.0, 0.0, 0.0))),
        );
        graph.add_child(root, Node::mesh("body", box_mesh(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 1.0))));

        let result = AssetNormalizer::normalize(&mut graph, root, 2.0);

        assert_relative_eq!(result.scale_factor, 0.5);
        let bounds = BoundsAnalyzer::compute_bounding_box(&graph);
        assert_relative_eq!(bounds.center(), Vec3::zeros(), epsilon = 1e-4);
        assert_relative_eq!(bounds.size(), Vec3::new(2.0, 1.0, 0.5), epsilon = 1e-4);
        assert_relative_eq!(result.center_offset, Vec3::new(-101.0, -0.5, -0.25), epsilon = 1e-4);
    }

    #[test]
    fn test_nested_root_is_recentered_in_world_space() {
        let mut graph = SceneGraph::new();
        let mut parent_transform = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));
        parent_transform.scale_uniformly(2.0);
        let parent = graph.add_root(Node::group("stage").with_transform(parent_transform));
        let root = graph.add_child(parent, Node::group("asset"));
        graph.add_child(root, Node::mesh("body", box_mesh(Vec3::zeros(), Vec3::repeat(2.0))));

        let result = AssetNormalizer::normalize(&mut graph, root, 2.0);

        assert_relative_eq!(result.scale_factor, 0.5);
        assert_relative_eq!(result.center_offset, Vec3::new(-6.0, -1.0, -1.0), epsilon = 1e-4);
        let bounds = BoundsAnalyzer::compute_subtree_bounds(&graph, root).unwrap();
        assert_relative_eq!(bounds.center(), Vec3::zeros(), epsilon = 1e-4);
        assert_relative_eq!(bounds.max_dimension(), 2.0, epsilon = 1e-4);
        assert_relative_eq!(graph.get(root).unwrap().transform.position, Vec3::new(-3.0, -0.5, -0.5), epsilon = 1e-4);
    }

    #[test]
    fn test_non_finite_vertices_do_not_defeat_scaling() {
        let mut graph = SceneGraph::new();
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(f32::INFINITY, 1.0, 1.0),
            Point3::new(1.0, 2.0, 3.0),
        ];
        let root = asset(&mut graph, MeshData::new(positions, Vec::new()));

        let result = AssetNormalizer::normalize(&mut graph, root, 10.0);

        assert_relative_eq!(result.scale_factor, 10.0 / 3.0, epsilon = 1e-5);
        let bounds = BoundsAnalyzer::compute_subtree_bounds(&graph, root).unwrap();
        assert_relative_eq!(bounds.max_dimension(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(bounds.center(), Vec3::zeros(), epsilon = 1e-4);
    }

    #[test]
    fn test_overflowing_extent_keeps_scale() {
        let mut graph = SceneGraph::new();
        let root = asset(&mut graph, box_mesh(Vec3::repeat(-3.0e38), Vec3::repeat(3.0e38)));

        let result = AssetNormalizer::normalize(&mut graph, root, 10.0);

        assert_relative_eq!(result.scale_factor, 1.0);
        assert!(result.center_offset.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_empty_asset_is_untouched() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::group("empty"));

        let result = AssetNormalizer::normalize(&mut graph, root, 10.0);

        assert_eq!(result, NormalizationResult::identity());
        assert_eq!(graph.get(root).unwrap().transform, Transform::identity());
    }

    #[test]
    fn test_single_point_keeps_scale_and_moves_to_origin() {
        let mut graph = SceneGraph::new();
        let root = asset(&mut graph, MeshData::new(vec![Point3::new(2.0, 3.0, 4.0)], Vec::new()));

        let result = AssetNormalizer::normalize(&mut graph, root, 10.0);

        assert_relative_eq!(result.scale_factor, 1.0);
        assert_relative_eq!(result.center_offset, Vec3::new(-2.0, -3.0, -4.0));
        assert_eq!(BoundsAnalyzer::compute_bounding_box(&graph), AABB::from_point(Vec3::zeros()));
    }

    #[test]
    fn test_other_roots_are_not_moved() {
        let mut graph = SceneGraph::new();
        let root = asset(&mut graph, box_mesh(Vec3::repeat(10.0), Vec3::repeat(12.0)));
        let other = graph.add_root(Node::mesh("floor", box_mesh(Vec3::repeat(-1.0), Vec3::repeat(1.0))));

        AssetNormalizer::normalize(&mut graph, root, 1.0);

        assert_eq!(graph.get(other).unwrap().transform, Transform::identity());
        let asset_bounds = BoundsAnalyzer::compute_subtree_bounds(&graph, root).unwrap();
        assert_relative_eq!(asset_bounds.center(), Vec3::zeros(), epsilon = 1e-5);
    }
}
