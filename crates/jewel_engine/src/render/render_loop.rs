//! # Render Loop
//!
//! Cooperative frame driver. Each tick runs the per-frame work in a fixed
//! order:
//!
//! 1. move the camera-following key light (if one is tracked)
//! 2. advance the camera controls
//! 3. refresh dirty world transforms and render
//!
//! The loop stays `Idle` until an asset has been prepared and
//! [`RenderLoopController::start`] is called. A [`StopHandle`] can be cloned
//! out and triggered from anywhere; the loop checks it before scheduling
//! another frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::foundation::time::Timer;
use crate::render::backend::{Controls, FrameScheduler, RenderBackend, RenderError};
use crate::render::lighting::CameraFollowLight;
use crate::scene::SceneGraph;

/// Lifecycle state of the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No asset ready yet; ticks do nothing
    Idle,
    /// Frames are being produced
    Running,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The loop is idle and did no work
    Idle,
    /// A frame was rendered and another one should be scheduled
    Scheduled,
    /// The stop flag is set; no further frames will be scheduled
    Stopped,
}

/// Thread-safe handle stopping a render loop
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the loop to stop after the current frame
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Everything one frame touches, borrowed from the owner for the tick
pub struct FrameContext<'a> {
    /// Scene to update and draw
    pub scene: &'a mut SceneGraph,
    /// Active camera controls
    pub controls: &'a mut dyn Controls,
    /// Render backend
    pub renderer: &'a mut dyn RenderBackend,
}

impl<'a> FrameContext<'a> {
    /// Bundle the frame collaborators
    pub fn new(scene: &'a mut SceneGraph, controls: &'a mut dyn Controls, renderer: &'a mut dyn RenderBackend) -> Self {
        Self { scene, controls, renderer }
    }
}

/// Drives frames while running
#[derive(Debug)]
pub struct RenderLoopController {
    state: LoopState,
    stop: StopHandle,
    follow: Option<CameraFollowLight>,
    timer: Timer,
}

impl Default for RenderLoopController {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoopController {
    /// Create an idle controller
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            stop: StopHandle::default(),
            follow: None,
            timer: Timer::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frame clock
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Handle that stops this loop from any thread
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Track `follow` in every tick, replacing any previous tracked light
    pub fn set_follow_light(&mut self, follow: Option<CameraFollowLight>) {
        self.follow = follow;
    }

    /// The currently tracked light
    pub fn follow_light(&self) -> Option<&CameraFollowLight> {
        self.follow.as_ref()
    }

    /// Transition Idle to Running; no-op when already running
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        if self.is_stopped() {
            log::warn!("Render loop start requested after stop; frames will not be scheduled");
        }
        self.state = LoopState::Running;
        self.timer.reset();
        log::info!("Render loop started");
    }

    /// Stop scheduling frames
    pub fn stop(&mut self) {
        self.stop.stop();
    }

    /// Run one frame
    ///
    /// Renderer failures are returned unchanged; the loop stays `Running` so
    /// the caller decides whether to retry or stop.
    pub fn tick(&mut self, frame: &mut FrameContext<'_>) -> Result<TickOutcome, RenderError> {
        if self.state == LoopState::Idle {
            return Ok(TickOutcome::Idle);
        }
        if self.is_stopped() {
            return Ok(TickOutcome::Stopped);
        }

        let delta_time = self.timer.update();

        if let Some(follow) = &self.follow {
            follow.update(frame.scene, frame.controls.camera_state().as_ref());
        }
        frame.controls.update(delta_time);

        frame.scene.update_world_transforms();
        let camera = frame.controls.camera_state();
        frame.renderer.render(frame.scene, camera.as_ref())?;

        log::trace!("Frame {} rendered in {:.4}s", self.timer.frame_count(), delta_time);

        if self.is_stopped() {
            Ok(TickOutcome::Stopped)
        } else {
            Ok(TickOutcome::Scheduled)
        }
    }

    /// Tick until stopped, waiting on `scheduler` between frames
    ///
    /// Returns immediately when the loop is idle. Returns the number of
    /// frames rendered by this call.
    pub fn run(&mut self, frame: &mut FrameContext<'_>, scheduler: &mut dyn FrameScheduler) -> Result<u64, RenderError> {
        let first_frame = self.timer.frame_count();
        loop {
            match self.tick(frame)? {
                TickOutcome::Scheduled => scheduler.wait_for_next_frame(),
                TickOutcome::Idle => {
                    log::debug!("Render loop is idle, nothing to run");
                    return Ok(0);
                }
                TickOutcome::Stopped => break,
            }
        }

        let frames = self.timer.frame_count() - first_frame;
        log::info!(
            "Render loop stopped after {} frames ({:.1} fps average)",
            frames,
            self.timer.average_fps()
        );
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::camera::CameraState;
    use crate::render::lighting::LightSpec;
    use crate::render::FramePacer;
    use crate::scene::{Node, NodeKey};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Journal {
        events: Vec<&'static str>,
        light_positions: Vec<Vec3>,
        camera_positions: Vec<Vec3>,
    }

    /// Controls that slide the camera one unit along +X per update
    struct SlidingControls {
        journal: Rc<RefCell<Journal>>,
        camera: Option<CameraState>,
    }

    impl Controls for SlidingControls {
        fn update(&mut self, _delta_time: f32) {
            self.journal.borrow_mut().events.push("controls");
            if let Some(camera) = &mut self.camera {
                camera.position.x += 1.0;
            }
        }

        fn camera_state(&self) -> Option<CameraState> {
            self.camera
        }
    }

    struct RecordingRenderer {
        journal: Rc<RefCell<Journal>>,
        key: Option<NodeKey>,
        fail: bool,
    }

    impl RenderBackend for RecordingRenderer {
        fn render(&mut self, scene: &SceneGraph, camera: Option<&CameraState>) -> Result<(), RenderError> {
            let mut journal = self.journal.borrow_mut();
            journal.events.push("render");
            if let Some(light) = self.key.and_then(|k| scene.get(k)).and_then(Node::as_light) {
                journal.light_positions.push(light.position);
            }
            if let Some(camera) = camera {
                journal.camera_positions.push(camera.position);
            }
            if self.fail {
                Err(RenderError::RenderingFailed("device lost".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct StopAfter {
        remaining: u32,
        stop: StopHandle,
    }

    impl FrameScheduler for StopAfter {
        fn wait_for_next_frame(&mut self) {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.stop.stop();
            }
        }
    }

    fn fixture() -> (SceneGraph, SlidingControls, RecordingRenderer, Rc<RefCell<Journal>>) {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let controls = SlidingControls {
            journal: journal.clone(),
            camera: Some(CameraState::new(Vec3::zeros(), Vec3::new(-1.0, 0.0, 0.0))),
        };
        let renderer = RecordingRenderer {
            journal: journal.clone(),
            key: None,
            fail: false,
        };
        (SceneGraph::new(), controls, renderer, journal)
    }

    fn render_count(journal: &Rc<RefCell<Journal>>) -> usize {
        journal.borrow().events.iter().filter(|&&e| e == "render").count()
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let (mut scene, mut controls, mut renderer, journal) = fixture();
        let mut controller = RenderLoopController::new();
        let mut frame = FrameContext::new(&mut scene, &mut controls, &mut renderer);

        assert_eq!(controller.tick(&mut frame).unwrap(), TickOutcome::Idle);
        assert_eq!(controller.run(&mut frame, &mut FramePacer::unlimited()).unwrap(), 0);
        assert!(journal.borrow().events.is_empty());
        assert_eq!(controller.state(), LoopState::Idle);
    }

    #[test]
    fn test_tick_order_follow_controls_render() {
        let (mut scene, mut controls, mut renderer, journal) = fixture();
        let key = scene.add_root(Node::light(
            "key",
            LightSpec::directional(Vec3::new(0.0, 10.0, 0.0), Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), 8.0),
        ));
        renderer.key = Some(key);

        let mut controller = RenderLoopController::new();
        controller.set_follow_light(Some(CameraFollowLight::new(key)));
        controller.start();
        controller.start();
        assert_eq!(controller.state(), LoopState::Running);

        let mut frame = FrameContext::new(&mut scene, &mut controls, &mut renderer);
        for _ in 0..2 {
            assert_eq!(controller.tick(&mut frame).unwrap(), TickOutcome::Scheduled);
        }

        let journal = journal.borrow();
        assert_eq!(journal.events, vec!["controls", "render", "controls", "render"]);
        // The light follows the camera as it was before the controls moved it,
        // and the renderer sees the camera after the controls moved it.
        assert_eq!(journal.light_positions, vec![Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)]);
        assert_eq!(journal.camera_positions, vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
        assert!(!scene.get(key).unwrap().is_world_dirty());
        assert_eq!(controller.timer().frame_count(), 2);
    }

    #[test]
    fn test_stop_prevents_further_ticks() {
        let (mut scene, mut controls, mut renderer, journal) = fixture();
        let mut controller = RenderLoopController::new();
        controller.start();

        let stop = controller.stop_handle();
        let mut scheduler = StopAfter { remaining: 3, stop: stop.clone() };
        let mut frame = FrameContext::new(&mut scene, &mut controls, &mut renderer);
        let frames = controller.run(&mut frame, &mut scheduler).unwrap();

        assert_eq!(frames, 3);
        assert!(stop.is_stopped());
        assert_eq!(render_count(&journal), 3);

        assert_eq!(controller.tick(&mut frame).unwrap(), TickOutcome::Stopped);
        assert_eq!(render_count(&journal), 3);
    }

    #[test]
    fn test_stop_during_frame_reports_stopped() {
        let (mut scene, mut controls, mut renderer, journal) = fixture();
        let mut controller = RenderLoopController::new();
        controller.start();
        controller.stop();

        let mut frame = FrameContext::new(&mut scene, &mut controls, &mut renderer);
        assert_eq!(controller.run(&mut frame, &mut FramePacer::unlimited()).unwrap(), 0);
        assert_eq!(render_count(&journal), 0);
    }

    #[test]
    fn test_render_error_is_propagated() {
        let (mut scene, mut controls, mut renderer, _journal) = fixture();
        renderer.fail = true;
        let mut controller = RenderLoopController::new();
        controller.start();

        let mut frame = FrameContext::new(&mut scene, &mut controls, &mut renderer);
        let result = controller.run(&mut frame, &mut FramePacer::unlimited());
        assert!(matches!(result, Err(RenderError::RenderingFailed(_))));
        assert_eq!(controller.state(), LoopState::Running);
    }
}
