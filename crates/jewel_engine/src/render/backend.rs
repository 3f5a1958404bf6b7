//! Backend abstraction traits for the render loop
//!
//! The viewer core never rasterizes anything itself. Applications plug in a
//! [`RenderBackend`] that draws the scene graph, [`Controls`] that own the
//! camera, and a [`FrameScheduler`] that decides when the next frame starts.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::render::camera::CameraState;
use crate::scene::SceneGraph;

/// Rendering errors surfaced by a [`RenderBackend`]
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    ///
    /// Indicates failure while drawing or presenting a frame.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Draws a scene graph
pub trait RenderBackend {
    /// Render one frame of `scene` from `camera`
    ///
    /// `camera` is `None` when the controls have not produced a camera yet.
    fn render(&mut self, scene: &SceneGraph, camera: Option<&CameraState>) -> Result<(), RenderError>;
}

/// Camera controls (orbit, fly, scripted, ...)
pub trait Controls {
    /// Advance damping, inertia and auto-rotation by `delta_time` seconds
    fn update(&mut self, delta_time: f32);

    /// Current camera, if one is attached
    fn camera_state(&self) -> Option<CameraState>;
}

/// Decides when the next frame begins
pub trait FrameScheduler {
    /// Block until the next frame should start
    fn wait_for_next_frame(&mut self);
}

/// Sleep-based frame pacer with an optional FPS cap
#[derive(Debug)]
pub struct FramePacer {
    frame_duration: Option<Duration>,
    next_frame: Option<Instant>,
}

impl FramePacer {
    /// Pace frames at `target_fps`, or not at all when `None` or zero
    pub fn new(target_fps: Option<u32>) -> Self {
        let frame_duration = target_fps
            .filter(|&fps| fps > 0)
            .map(|fps| Duration::from_nanos(1_000_000_000 / u64::from(fps)));
        Self {
            frame_duration,
            next_frame: None,
        }
    }

    /// Pacer that never waits
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Target duration of one frame, `None` when unlimited
    pub fn frame_duration(&self) -> Option<Duration> {
        self.frame_duration
    }
}

impl FrameScheduler for FramePacer {
    fn wait_for_next_frame(&mut self) {
        let Some(frame_duration) = self.frame_duration else {
            return;
        };
        let now = Instant::now();
        let deadline = self.next_frame.unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        // Fell behind by more than a frame: restart the cadence instead of bursting
        let base = if now > deadline + frame_duration { now } else { deadline };
        self.next_frame = Some(base + frame_duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_pacer_never_sleeps() {
        let mut pacer = FramePacer::unlimited();
        assert!(pacer.frame_duration().is_none());

        let start = Instant::now();
        for _ in 0..1000 {
            pacer.wait_for_next_frame();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_zero_fps_is_unlimited() {
        assert!(FramePacer::new(Some(0)).frame_duration().is_none());
    }

    #[test]
    fn test_pacer_enforces_frame_duration() {
        let mut pacer = FramePacer::new(Some(100));
        assert_eq!(pacer.frame_duration(), Some(Duration::from_millis(10)));

        let start = Instant::now();
        for _ in 0..4 {
            pacer.wait_for_next_frame();
        }
        // First call starts the cadence, the next three wait a frame each
        assert!(start.elapsed() >= Duration::from_millis(25));
    }
}
