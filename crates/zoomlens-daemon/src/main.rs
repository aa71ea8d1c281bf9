//! Zoomlens Daemon - demo host for the zoom system
//!
//! Builds a simulated world holding a single zoom camera, runs the tick
//! loop, and delivers zoom factors typed on stdin to the controller from a
//! separate task.

mod config;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use zoomlens_sim::{SceneCamera, SimScene, WorldGraph, ZoomSystem};

#[derive(Parser, Debug)]
#[command(name = "zoomlens")]
#[command(about = "Camera zoom controller demo on a simulated world")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "zoomlens.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run for this many seconds, then exit (0 = until stdin closes)
    #[arg(short, long, default_value_t = 0)]
    duration_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Zoomlens v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;

    // Build the simulated world around the configured camera.
    let mut world = WorldGraph::new();
    world.spawn_world(&config.camera.world);
    let model = world.spawn_model(&config.camera.model);
    let sensor = world.spawn_camera(
        model,
        &config.camera.sensor,
        config.zoom.reference_hfov,
        config.camera.focal_length,
    );

    // A setup failure leaves the host without zoom control, nothing worse.
    let mut system = match ZoomSystem::new(sensor, &world, config.zoom.clone()) {
        Ok(system) => system,
        Err(err) => {
            error!(%err, "zoom system failed to initialize");
            return Ok(());
        }
    };

    let mut scene = SimScene::new();
    let scene_camera = scene.add_camera(system.camera_name(), config.zoom.reference_hfov);
    scene.set_ready(true);

    info!(
        topic = %system.topic(),
        max_zoom = config.zoom.max_zoom,
        slew_rate = config.zoom.slew_rate,
        "enter zoom factors on stdin, one per line"
    );

    // Command producer: runs concurrently with the tick loop and only ever
    // touches the latch.
    let latch = system.command_latch();
    let stdin_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim().parse::<f64>() {
                Ok(value) => latch.submit(value),
                Err(_) => warn!(line = %line.trim(), "not a zoom factor, ignored"),
            }
        }
    });

    // Tick loop.
    let period = Duration::from_secs_f64(1.0 / f64::from(config.tick.rate_hz.max(1)));
    let mut interval = tokio::time::interval(period);
    let started = Instant::now();
    let mut last = Instant::now();
    loop {
        interval.tick().await;
        let now = Instant::now();
        let dt = now - last;
        last = now;

        system.update(dt, &mut world, &scene);
        if let Some(camera) = world.camera_mut(sensor) {
            if camera.take_changed() {
                info!(
                    hfov = camera.hfov,
                    focal_length = camera.focal_length,
                    zoom = system.zoom_factor(camera.hfov),
                    "camera updated"
                );
            }
        }

        if args.duration_secs > 0 && started.elapsed().as_secs() >= args.duration_secs {
            break;
        }
        if args.duration_secs == 0 && stdin_task.is_finished() {
            break;
        }
    }

    info!(hfov = scene_camera.horizontal_fov(), "shutting down");
    Ok(())
}
