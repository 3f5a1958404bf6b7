//! # Viewer
//!
//! The single owner of the scene graph. It takes loaded assets, fits them
//! into the normalized viewing volume, lights them with a rig sized to the
//! result and only then lets the render loop run.
//!
//! ```text
//! LoadTask ──> graft ──> AssetNormalizer ──> BoundsAnalyzer ──> LightingRigGenerator
//!                                                                      │
//!                         RenderLoopController <── replace_rig <───────┘
//! ```
//!
//! Loading again replaces the previous asset and its rig. A failed load
//! leaves whatever was shown before untouched.

use thiserror::Error;

use crate::assets::{AssetLoader, AssetNormalizer, AssetSource, LoadError, LoadTask, NormalizationResult};
use crate::config::{ConfigError, ViewerSettings};
use crate::foundation::math::Vec3;
use crate::render::{
    CameraFollowLight, Controls, FrameContext, FrameScheduler, LightSpec, LightingRig, LightingRigGenerator,
    LoopState, RenderBackend, RenderError, RenderLoopController, ShadowSettings, StopHandle, TickOutcome,
};
use crate::scene::{BoundsAnalyzer, EnvironmentHandle, Node, NodeKey, SceneGraph, AABB};

/// Name of the group every loaded asset is grafted under
pub const ASSET_ROOT_NAME: &str = "asset";

/// Viewer errors
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Loading an asset failed
    #[error("Asset load failed: {0}")]
    Load(#[from] LoadError),

    /// The render backend failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Scene owner and frame driver
#[derive(Debug)]
pub struct Viewer {
    settings: ViewerSettings,
    scene: SceneGraph,
    generator: LightingRigGenerator,
    render_loop: RenderLoopController,
    asset_root: Option<NodeKey>,
    rig: Option<LightingRig>,
    key_light: Option<NodeKey>,
    pending: Option<LoadTask>,
    last_normalization: Option<NormalizationResult>,
}

impl Viewer {
    /// Create a viewer with an empty scene and an idle render loop
    pub fn new(settings: ViewerSettings) -> Result<Self, ViewerError> {
        settings.validate()?;

        let mut scene = SceneGraph::new();
        let mut render_loop = RenderLoopController::new();

        let key_light = settings.key_light.enabled.then(|| {
            let key = &settings.key_light;
            let light = LightSpec::directional(
                Vec3::from(settings.camera.position),
                Vec3::zeros(),
                Vec3::from(key.color),
                key.intensity,
            )
            .with_shadow(ShadowSettings {
                frustum_half_extent: key.shadow_half_extent,
                ..ShadowSettings::default()
            });
            scene.add_root(Node::light("key_light", light))
        });
        render_loop.set_follow_light(key_light.map(CameraFollowLight::new));

        Ok(Self {
            generator: LightingRigGenerator::new(settings.rig.clone()),
            settings,
            scene,
            render_loop,
            asset_root: None,
            rig: None,
            key_light,
            pending: None,
            last_normalization: None,
        })
    }

    /// Start loading `source` in the background
    ///
    /// A load already in flight is cancelled and its result discarded.
    pub fn begin_load<L: AssetLoader>(&mut self, loader: L, source: AssetSource) -> Result<(), ViewerError> {
        if let Some(previous) = self.pending.take() {
            log::warn!("Cancelling pending load of '{}'", previous.name());
            previous.cancel();
        }
        self.pending = Some(LoadTask::spawn(loader, source)?);
        Ok(())
    }

    /// Whether a background load is in flight
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Check the background load and apply its result
    ///
    /// Returns `Ok(Some(_))` when a new asset was installed this call.
    pub fn poll_load(&mut self) -> Result<Option<NormalizationResult>, ViewerError> {
        let Some(task) = self.pending.as_mut() else {
            return Ok(None);
        };
        let Some(result) = task.poll() else {
            return Ok(None);
        };
        self.pending = None;

        match result {
            Ok(graph) => Ok(Some(self.on_asset_loaded(graph))),
            Err(error) => Err(self.on_load_failed(error)),
        }
    }

    /// Load `source` on a worker and wait for it
    pub fn load_blocking<L: AssetLoader>(&mut self, loader: L, source: AssetSource) -> Result<NormalizationResult, ViewerError> {
        match LoadTask::spawn(loader, source)?.wait() {
            Ok(graph) => Ok(self.on_asset_loaded(graph)),
            Err(error) => Err(self.on_load_failed(error)),
        }
    }

    /// Install a loaded asset: replace the old one, normalize, relight, start
    pub fn on_asset_loaded(&mut self, asset: SceneGraph) -> NormalizationResult {
        if let Some(old) = self.asset_root.take() {
            self.scene.remove_node(old);
        }
        let root = self.scene.graft(asset, ASSET_ROOT_NAME);
        self.asset_root = Some(root);

        let normalization = AssetNormalizer::normalize(&mut self.scene, root, self.settings.normalize.desired_size);
        let bounds = BoundsAnalyzer::compute_subtree_bounds(&self.scene, root)
            .unwrap_or_else(|| AABB::from_point(Vec3::zeros()));

        let rig = self.generator.generate_rig(&bounds);
        self.rig = Some(LightingRigGenerator::replace_rig(&mut self.scene, self.rig.take(), rig));
        self.last_normalization = Some(normalization);

        if self.render_loop.state() == LoopState::Idle {
            self.render_loop.start();
        }
        normalization
    }

    /// Report a failed load; the current asset and loop state are kept
    pub fn on_load_failed(&mut self, error: LoadError) -> ViewerError {
        log::error!("Asset failed to load: {}", error);
        if self.asset_root.is_some() {
            log::info!("Keeping the previously loaded asset");
        }
        ViewerError::Load(error)
    }

    /// Attach a finished environment map to the scene
    pub fn set_environment(&mut self, environment: EnvironmentHandle) {
        self.scene.set_environment(environment);
    }

    /// Poll loading, then run one frame
    pub fn tick(&mut self, controls: &mut dyn Controls, renderer: &mut dyn RenderBackend) -> Result<TickOutcome, ViewerError> {
        self.poll_load()?;
        let mut frame = FrameContext::new(&mut self.scene, controls, renderer);
        Ok(self.render_loop.tick(&mut frame)?)
    }

    /// Run frames until stopped
    ///
    /// Returns immediately with zero frames when no asset is loaded.
    pub fn run(
        &mut self,
        controls: &mut dyn Controls,
        renderer: &mut dyn RenderBackend,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<u64, ViewerError> {
        self.poll_load()?;
        let mut frame = FrameContext::new(&mut self.scene, controls, renderer);
        Ok(self.render_loop.run(&mut frame, scheduler)?)
    }

    /// Handle stopping the render loop from any thread
    pub fn stop_handle(&self) -> StopHandle {
        self.render_loop.stop_handle()
    }

    /// Render loop state
    pub fn state(&self) -> LoopState {
        self.render_loop.state()
    }

    /// The owned scene graph
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Root node of the current asset
    pub fn asset_root(&self) -> Option<NodeKey> {
        self.asset_root
    }

    /// Rig lighting the current asset
    pub fn rig(&self) -> Option<&LightingRig> {
        self.rig.as_ref()
    }

    /// The camera-following key light, when enabled
    pub fn key_light(&self) -> Option<NodeKey> {
        self.key_light
    }

    /// Normalization applied to the current asset
    pub fn last_normalization(&self) -> Option<NormalizationResult> {
        self.last_normalization
    }

    /// Active settings
    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Render loop frame statistics
    pub fn render_loop(&self) -> &RenderLoopController {
        &self.render_loop
    }
}
