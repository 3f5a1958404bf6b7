//! Headless jewelry viewer
//!
//! Loads an OBJ model, normalizes and lights it, then runs the render loop
//! against a logging backend with auto-rotating orbit controls for a fixed
//! number of frames.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};
use jewel_engine::assets::{AssetSource, ObjLoader};
use jewel_engine::config::{Config, ViewerSettings};
use jewel_engine::foundation::logging;
use jewel_engine::render::{FramePacer, FrameScheduler, StopHandle};
use jewel_engine::scene::{EnvironmentHandle, EnvironmentMapping};
use jewel_engine::Viewer;

mod headless_renderer;
mod orbit_controls;

use headless_renderer::HeadlessRenderer;
use orbit_controls::OrbitControls;

const DEFAULT_FRAMES: &str = "300";
const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// Paces frames and stops the loop once the frame budget is spent
struct FrameBudget {
    pacer: FramePacer,
    remaining: u64,
    stop: StopHandle,
}

impl FrameScheduler for FrameBudget {
    fn wait_for_next_frame(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            log::debug!("Frame budget spent, stopping");
            self.stop.stop();
            return;
        }
        self.pacer.wait_for_next_frame();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("jewel_viewer")
        .about("Normalizes, lights and renders a jewelry model without a window")
        .arg(
            Arg::new("model")
                .value_name("FILE")
                .help("OBJ model to load")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Viewer settings (.toml or .ron)"),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to render")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value(DEFAULT_FRAMES),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("FPS")
                .help("Frame rate cap, overrides the config file")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("environment")
                .short('e')
                .long("environment")
                .value_name("HDR")
                .help("Equirectangular environment map to reflect"),
        )
        .arg(
            Arg::new("no-rotate")
                .long("no-rotate")
                .help("Keep the camera still")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let mut settings = match matches.get_one::<String>("config") {
        Some(path) => ViewerSettings::load_from_file(path)?,
        None => ViewerSettings::default(),
    };
    if let Some(&fps) = matches.get_one::<u32>("fps") {
        settings.render_loop.target_fps = Some(fps);
    }

    logging::init_with_level(&settings.logging.level);
    log::info!("Starting jewel viewer");
    for line in settings.instructions.lines() {
        log::info!("  {}", line);
    }

    let camera_settings = settings.camera.clone();
    let target_fps = settings.render_loop.target_fps;
    let mut viewer = Viewer::new(settings)?;

    if let Some(environment) = matches.get_one::<String>("environment") {
        viewer.set_environment(EnvironmentHandle::new(
            environment.as_str(),
            EnvironmentMapping::EquirectangularReflection,
        ));
    }

    let model = matches
        .get_one::<String>("model")
        .map(PathBuf::from)
        .ok_or("model path is required")?;
    let normalization = viewer.load_blocking(ObjLoader, AssetSource::path(&model))?;
    log::info!(
        "Model '{}' scaled by {:.4} and shifted by {:?}",
        model.display(),
        normalization.scale_factor,
        normalization.center_offset
    );

    let mut controls = OrbitControls::from_settings(&camera_settings, DEFAULT_ASPECT);
    if !matches.get_flag("no-rotate") {
        controls = controls.with_auto_rotate(2.0);
    }
    let mut renderer = HeadlessRenderer::new(60);
    let mut scheduler = FrameBudget {
        pacer: FramePacer::new(target_fps),
        remaining: matches.get_one::<u64>("frames").copied().unwrap_or(1),
        stop: viewer.stop_handle(),
    };

    let frames = viewer.run(&mut controls, &mut renderer, &mut scheduler)?;
    let stats = renderer.last_stats();
    log::info!(
        "Rendered {} frames ({:.1} fps): {} meshes, {} lights, {} shadow casters",
        frames,
        viewer.render_loop().timer().average_fps(),
        stats.meshes,
        stats.lights,
        stats.shadow_casters
    );

    Ok(())
}
