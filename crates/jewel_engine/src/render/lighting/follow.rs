//! Camera-following key light
//!
//! Keeps one directional light glued to the viewer: every frame the light
//! moves to the camera position and aims one unit along the view direction,
//! so the side of the asset facing the viewer is always lit.

use crate::foundation::math::Transform;
use crate::render::camera::CameraState;
use crate::scene::{NodeKey, SceneGraph};

/// Binds a light node to the active camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraFollowLight {
    light: NodeKey,
}

impl CameraFollowLight {
    /// Track the light stored at `light`
    pub fn new(light: NodeKey) -> Self {
        Self { light }
    }

    /// The tracked light node
    pub fn light(&self) -> NodeKey {
        self.light
    }

    /// Move the light to the camera
    ///
    /// Returns `false` without touching the graph when there is no camera
    /// yet, or when the tracked node is gone or holds no light.
    pub fn update(&self, graph: &mut SceneGraph, camera: Option<&CameraState>) -> bool {
        let Some(camera) = camera else {
            return false;
        };
        let Some(node) = graph.get_mut(self.light) else {
            log::trace!("Follow light {:?} no longer exists", self.light);
            return false;
        };

        let Some(light) = node.as_light_mut() else {
            return false;
        };
        light.position = camera.position;
        light.target = Some(camera.focus_point());
        node.transform = Transform {
            position: camera.position,
            ..node.transform.clone()
        };

        graph.mark_dirty(self.light);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::lighting::LightSpec;
    use crate::scene::Node;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn key_light(graph: &mut SceneGraph) -> NodeKey {
        graph.add_root(Node::light(
            "key",
            LightSpec::directional(Vec3::new(0.0, 10.0, 0.0), Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), 8.0),
        ))
    }

    fn random_vec(rng: &mut StdRng) -> Vec3 {
        Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0))
    }

    #[test]
    fn test_light_tracks_random_cameras() {
        let mut graph = SceneGraph::new();
        let follow = CameraFollowLight::new(key_light(&mut graph));
        let mut rng = StdRng::seed_from_u64(0x6a65_7765);

        for _ in 0..32 {
            let camera = CameraState::new(random_vec(&mut rng), random_vec(&mut rng));
            assert!(follow.update(&mut graph, Some(&camera)));

            let node = graph.get(follow.light()).unwrap();
            let light = node.as_light().unwrap();
            assert_eq!(light.position, camera.position);
            assert_eq!(node.transform.position, camera.position);
            assert_relative_eq!(light.target.unwrap(), camera.position + camera.view_direction);
            assert_relative_eq!(light.direction().unwrap(), camera.view_direction, epsilon = 1e-5);
            assert!(node.is_world_dirty());
        }
    }

    #[test]
    fn test_no_camera_leaves_light_untouched() {
        let mut graph = SceneGraph::new();
        let follow = CameraFollowLight::new(key_light(&mut graph));
        graph.update_world_transforms();

        assert!(!follow.update(&mut graph, None));
        let node = graph.get(follow.light()).unwrap();
        assert_eq!(node.as_light().unwrap().position, Vec3::new(0.0, 10.0, 0.0));
        assert!(!node.is_world_dirty());
    }

    #[test]
    fn test_removed_or_non_light_node_is_ignored() {
        let mut graph = SceneGraph::new();
        let key = key_light(&mut graph);
        let camera = CameraState::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));

        graph.remove_node(key);
        assert!(!CameraFollowLight::new(key).update(&mut graph, Some(&camera)));

        let group = graph.add_root(Node::group("not a light"));
        assert!(!CameraFollowLight::new(group).update(&mut graph, Some(&camera)));
    }
}
