//! Render backend that draws nothing and logs what it would have drawn

use jewel_engine::render::{CameraState, LightKind, RenderBackend, RenderError};
use jewel_engine::scene::SceneGraph;

/// Per-frame scene statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Mesh nodes in the scene
    pub meshes: usize,
    /// Light nodes in the scene
    pub lights: usize,
    /// Lights rendering into shadow maps
    pub shadow_casters: usize,
}

/// Logging render backend for running the viewer without a window
#[derive(Debug)]
pub struct HeadlessRenderer {
    frames: u64,
    log_every: u64,
    last_stats: FrameStats,
}

impl HeadlessRenderer {
    /// Log a summary every `log_every` frames (at least 1)
    pub fn new(log_every: u64) -> Self {
        Self {
            frames: 0,
            log_every: log_every.max(1),
            last_stats: FrameStats::default(),
        }
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Statistics of the most recent frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

impl RenderBackend for HeadlessRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: Option<&CameraState>) -> Result<(), RenderError> {
        let Some(camera) = camera else {
            return Err(RenderError::RenderingFailed("no camera attached".to_string()));
        };

        let lights = scene.lights().map(|(_, light)| light);
        let (mut count, mut shadow_casters, mut ambient) = (0, 0, 0);
        for light in lights {
            count += 1;
            shadow_casters += usize::from(light.casts_shadow);
            ambient += usize::from(light.kind == LightKind::Ambient);
        }
        self.last_stats = FrameStats {
            meshes: scene.mesh_count(),
            lights: count,
            shadow_casters,
        };
        self.frames += 1;

        if self.frames % self.log_every == 0 || self.frames == 1 {
            log::info!(
                "Frame {}: {} meshes, {} lights ({} ambient, {} shadowed), camera at {:.2?}",
                self.frames,
                self.last_stats.meshes,
                count,
                ambient,
                shadow_casters,
                camera.position
            );
        }
        Ok(())
    }
}
