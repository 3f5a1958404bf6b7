//! Scene graph storage
//!
//! Nodes live in a `SlotMap` so keys stay valid while other nodes are
//! inserted or removed. Each node carries a local [`Transform`]; world
//! matrices are the product of all ancestor transforms.

use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Point3, Transform};
use crate::render::lighting::LightSpec;
use crate::scene::environment::EnvironmentHandle;

new_key_type! {
    /// Stable key of a node inside a [`SceneGraph`]
    pub struct NodeKey;
}

bitflags! {
    /// Per-node state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        /// Node is drawn by the render backend
        const VISIBLE = 1 << 0;
        /// Cached world matrix is stale
        const WORLD_DIRTY = 1 << 1;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::WORLD_DIRTY
    }
}

/// Triangle geometry attached to a mesh node
///
/// Only positions matter to the core; materials stay with the render backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions in node-local space
    pub positions: Vec<Point3>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from positions and triangle indices
    pub fn new(positions: Vec<Point3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// What a node represents
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure transform node grouping its children
    Group,
    /// Renderable geometry
    Mesh(MeshData),
    /// Light source; its world-space placement lives in the light itself
    Light(LightSpec),
}

/// A single scene graph node
#[derive(Debug, Clone)]
pub struct Node {
    /// Human readable name, taken from the asset where available
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Node payload
    pub kind: NodeKind,
    /// State flags
    pub flags: NodeFlags,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    world: Mat4,
}

impl Node {
    /// Create a node with an identity transform
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            kind,
            flags: NodeFlags::default(),
            parent: None,
            children: Vec::new(),
            world: Mat4::identity(),
        }
    }

    /// Create an empty group node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Create a mesh node
    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    /// Create a light node placed at the light's position
    pub fn light(name: impl Into<String>, light: LightSpec) -> Self {
        let mut node = Self::new(name, NodeKind::Light(light.clone()));
        node.transform = Transform::from_position(light.position);
        node
    }

    /// Replace the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// World matrix as of the last [`SceneGraph::update_world_transforms`]
    pub fn cached_world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Light payload if this is a light node
    pub fn as_light(&self) -> Option<&LightSpec> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mutable light payload if this is a light node
    pub fn as_light_mut(&mut self) -> Option<&mut LightSpec> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mesh payload if this is a mesh node
    pub fn as_mesh(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Whether the cached world matrix is stale
    pub fn is_world_dirty(&self) -> bool {
        self.flags.contains(NodeFlags::WORLD_DIRTY)
    }
}

/// Tree of renderable nodes owned by a single viewer
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    environment: Option<EnvironmentHandle>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node
    pub fn add_root(&mut self, mut node: Node) -> NodeKey {
        node.parent = None;
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Add a node under `parent`
    ///
    /// Falls back to a root node when `parent` no longer exists.
    pub fn add_child(&mut self, parent: NodeKey, mut node: Node) -> NodeKey {
        if !self.nodes.contains_key(parent) {
            log::warn!("Parent node {:?} not found, adding '{}' as a root", parent, node.name);
            return self.add_root(node);
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        key
    }

    /// Remove a node and its whole subtree, returning the removed node
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        let parent = self.nodes.get(key)?.parent;
        match parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&c| c != key);
                }
            }
            None => self.roots.retain(|&r| r != key),
        }

        let mut stack = vec![key];
        let mut removed = None;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend_from_slice(&node.children);
                if current == key {
                    removed = Some(node);
                }
            }
        }
        removed
    }

    /// Move every node of `other` into this graph under a new root group
    ///
    /// Returns the key of the new group. Node keys of `other` are not valid
    /// in this graph afterwards.
    pub fn graft(&mut self, other: Self, name: impl Into<String>) -> NodeKey {
        let Self { mut nodes, roots, environment } = other;
        if self.environment.is_none() {
            self.environment = environment;
        }

        let group = self.add_root(Node::group(name));
        let mut stack: Vec<(NodeKey, NodeKey)> = roots.into_iter().rev().map(|r| (r, group)).collect();
        while let Some((old_key, new_parent)) = stack.pop() {
            let Some(mut node) = nodes.remove(old_key) else {
                continue;
            };
            let children = std::mem::take(&mut node.children);
            node.flags.insert(NodeFlags::WORLD_DIRTY);
            let new_key = self.add_child(new_parent, node);
            stack.extend(children.into_iter().rev().map(|c| (c, new_key)));
        }
        group
    }

    /// Immutable node access
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutable node access
    ///
    /// Callers changing the transform should follow up with [`Self::mark_dirty`].
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Whether `key` refers to a live node
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Top-level nodes in insertion order
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in storage order
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    /// Iterate over all light nodes
    pub fn lights(&self) -> impl Iterator<Item = (NodeKey, &LightSpec)> {
        self.nodes.iter().filter_map(|(key, node)| node.as_light().map(|l| (key, l)))
    }

    /// Number of light nodes
    pub fn light_count(&self) -> usize {
        self.lights().count()
    }

    /// Number of mesh nodes
    pub fn mesh_count(&self) -> usize {
        self.nodes.values().filter(|n| n.as_mesh().is_some()).count()
    }

    /// Flag `key` and all of its descendants as needing a world update
    pub fn mark_dirty(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.flags.insert(NodeFlags::WORLD_DIRTY);
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// Compute the world matrix of `key` from its ancestors
    ///
    /// Ignores the cache, so it is correct even while nodes are dirty.
    pub fn world_matrix(&self, key: NodeKey) -> Option<Mat4> {
        let mut node = self.nodes.get(key)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            matrix = node.transform.to_matrix() * matrix;
        }
        Some(matrix)
    }

    /// Refresh cached world matrices of dirty subtrees and clear their flags
    ///
    /// Returns the number of nodes that were refreshed.
    pub fn update_world_transforms(&mut self) -> usize {
        let mut refreshed = 0;
        let mut stack: Vec<(NodeKey, Mat4, bool)> =
            self.roots.iter().map(|&r| (r, Mat4::identity(), false)).collect();

        while let Some((key, parent_world, parent_dirty)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            let dirty = parent_dirty || node.flags.contains(NodeFlags::WORLD_DIRTY);
            if dirty {
                node.world = parent_world * node.transform.to_matrix();
                node.flags.remove(NodeFlags::WORLD_DIRTY);
                refreshed += 1;
            }
            let world = node.world;
            stack.extend(node.children.iter().map(|&c| (c, world, dirty)));
        }
        refreshed
    }

    /// Environment texture used for reflections, if one has been supplied
    pub fn environment(&self) -> Option<&EnvironmentHandle> {
        self.environment.as_ref()
    }

    /// Attach a finished environment texture handle
    pub fn set_environment(&mut self, environment: EnvironmentHandle) {
        log::info!("Environment map set to '{}'", environment.name());
        self.environment = Some(environment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_add_and_remove_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::group("root"));
        let child = graph.add_child(root, Node::group("child"));
        graph.add_child(child, Node::mesh("leaf", triangle()));
        let other = graph.add_root(Node::group("other"));
        assert_eq!(graph.len(), 4);

        let removed = graph.remove_node(root).map(|n| n.name);
        assert_eq!(removed.as_deref(), Some("root"));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.roots(), &[other]);
        assert!(!graph.contains(child));
    }

    #[test]
    fn test_remove_child_unlinks_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::group("root"));
        let child = graph.add_child(root, Node::group("child"));

        graph.remove_node(child);
        assert!(graph.get(root).is_some_and(|n| n.children().is_empty()));
    }

    #[test]
    fn test_world_matrix_composes_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(
            Node::group("root").with_transform(Transform::from_uniform_scale(2.0)),
        );
        let child = graph.add_child(
            root,
            Node::group("child").with_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0))),
        );

        let world = graph.world_matrix(child).unwrap();
        let p = world.transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_update_world_transforms_clears_dirty_flags() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::group("root"));
        let child = graph.add_child(root, Node::mesh("mesh", triangle()));

        assert_eq!(graph.update_world_transforms(), 2);
        assert!(!graph.get(child).unwrap().is_world_dirty());
        assert_eq!(graph.update_world_transforms(), 0);

        graph.get_mut(root).unwrap().transform.position = Vec3::new(0.0, 3.0, 0.0);
        graph.mark_dirty(root);
        assert!(graph.get(child).unwrap().is_world_dirty());
        assert_eq!(graph.update_world_transforms(), 2);

        let p = graph.get(child).unwrap().cached_world_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_graft_preserves_hierarchy() {
        let mut asset = SceneGraph::new();
        let group = asset.add_root(Node::group("setting"));
        asset.add_child(group, Node::mesh("band", triangle()));
        asset.add_root(Node::mesh("stone", triangle()));

        let mut scene = SceneGraph::new();
        let grafted = scene.graft(asset, "asset");

        assert_eq!(scene.len(), 4);
        assert_eq!(scene.roots(), &[grafted]);
        let top = scene.get(grafted).unwrap();
        assert_eq!(top.children().len(), 2);
        let first = scene.get(top.children()[0]).unwrap();
        assert_eq!(first.name, "setting");
        assert_eq!(first.children().len(), 1);
        assert_eq!(scene.mesh_count(), 2);
    }
}
