//! OBJ file loader for 3D models
//!
//! Reads positions and faces only; normals, texture coordinates and
//! materials are the render backend's business. Each `o`/`g` statement
//! starts a new mesh node under a root group named after the source.

use std::collections::HashMap;
use std::path::Path;

use crate::assets::loader::{AssetLoader, AssetSource, LoadError, ProgressSink};
use crate::foundation::math::Point3;
use crate::scene::{MeshData, Node, SceneGraph};

/// Bytes parsed between two progress reports
const PROGRESS_CHUNK: usize = 64 * 1024;

/// Mesh being accumulated for the current object
#[derive(Default)]
struct ObjectBuilder {
    name: String,
    positions: Vec<Point3>,
    indices: Vec<u32>,
    remap: HashMap<usize, u32>,
}

impl ObjectBuilder {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn vertex(&mut self, global: usize, positions: &[Point3]) -> u32 {
        if let Some(&local) = self.remap.get(&global) {
            return local;
        }
        self.positions.push(positions[global]);
        let local = (self.positions.len() - 1) as u32;
        self.remap.insert(global, local);
        local
    }
}

/// Wavefront OBJ loader
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file into a scene graph
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<SceneGraph, LoadError> {
        let source = AssetSource::path(path.as_ref());
        Self.load(&source, &ProgressSink::disabled())
    }

    /// Parse OBJ text into a scene graph rooted at a group called `name`
    pub fn parse_obj(name: &str, text: &str, progress: &ProgressSink) -> Result<SceneGraph, LoadError> {
        let total = text.len() as u64;
        let mut positions: Vec<Point3> = Vec::new();
        let mut objects: Vec<ObjectBuilder> = Vec::new();
        let mut current = ObjectBuilder::named(name);
        let mut since_report = 0;
        let mut consumed = 0;

        for (line_number, raw) in text.lines().enumerate() {
            consumed += raw.len() + 1;
            since_report += raw.len() + 1;
            if since_report >= PROGRESS_CHUNK {
                progress.check_cancelled()?;
                progress.report(consumed.min(text.len()) as u64, Some(total));
                since_report = 0;
            }

            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };

            match keyword {
                "v" => {
                    let coords: Vec<&str> = parts.take(3).collect();
                    if coords.len() < 3 {
                        return Err(parse_error(line_number, "vertex needs three coordinates"));
                    }
                    let mut xyz = [0.0f32; 3];
                    for (slot, value) in xyz.iter_mut().zip(&coords) {
                        *slot = value
                            .parse::<f32>()
                            .ok()
                            .filter(|v| v.is_finite())
                            .ok_or_else(|| parse_error(line_number, &format!("invalid coordinate '{value}'")))?;
                    }
                    positions.push(Point3::new(xyz[0], xyz[1], xyz[2]));
                }
                "f" => {
                    let mut face = Vec::new();
                    for corner in parts {
                        let global = resolve_index(corner, positions.len())
                            .ok_or_else(|| parse_error(line_number, &format!("invalid face index '{corner}'")))?;
                        face.push(current.vertex(global, &positions));
                    }
                    if face.len() < 3 {
                        return Err(parse_error(line_number, "face needs at least three vertices"));
                    }
                    // Fan triangulation
                    for i in 1..face.len() - 1 {
                        current.indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                "o" | "g" => {
                    let object_name = parts.next().unwrap_or(name);
                    let finished = std::mem::replace(&mut current, ObjectBuilder::named(object_name));
                    if !finished.indices.is_empty() {
                        objects.push(finished);
                    }
                }
                _ => {
                    // Normals, texture coordinates, materials and smoothing groups
                }
            }
        }
        if !current.indices.is_empty() {
            objects.push(current);
        }

        if positions.is_empty() {
            return Err(LoadError::InvalidFormat("No vertices found in OBJ file".to_string()));
        }

        let mut graph = SceneGraph::new();
        let root = graph.add_root(Node::group(name));
        if objects.is_empty() {
            // Point cloud: keep the vertices so the asset still has bounds
            log::warn!("OBJ '{}' has {} vertices but no faces", name, positions.len());
            graph.add_child(root, Node::mesh(name, MeshData::new(positions, Vec::new())));
        } else {
            for object in objects {
                graph.add_child(root, Node::mesh(object.name, MeshData::new(object.positions, object.indices)));
            }
        }

        progress.report(total, Some(total));
        log::debug!("Parsed OBJ '{}': {} meshes", name, graph.mesh_count());
        Ok(graph)
    }
}

impl AssetLoader for ObjLoader {
    fn load(&mut self, source: &AssetSource, progress: &ProgressSink) -> Result<SceneGraph, LoadError> {
        let bytes = source.read_bytes()?;
        let text = std::str::from_utf8(&bytes).map_err(|e| LoadError::Parse(format!("OBJ is not UTF-8: {e}")))?;
        Self::parse_obj(&source.name(), text, progress)
    }
}

/// Resolve a face corner (`v`, `v/vt`, `v//vn`, `v/vt/vn`) to a 0-based position index
///
/// Negative indices count back from the most recent vertex.
fn resolve_index(corner: &str, vertex_count: usize) -> Option<usize> {
    let index: i64 = corner.split('/').next()?.parse().ok()?;
    let count = i64::try_from(vertex_count).ok()?;
    let resolved = match index {
        0 => return None,
        i if i > 0 => i - 1,
        i => count + i,
    };
    usize::try_from(resolved).ok().filter(|&i| i < vertex_count)
}

fn parse_error(line_number: usize, message: &str) -> LoadError {
    LoadError::Parse(format!("line {}: {}", line_number + 1, message))
}
