//! Tick-driven zoom system: command polling, goal resolution, slew, publish.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use zoomlens_core::{CommandLatch, ConfigError, LensState, ZoomConfig, ZoomController, MIN_ZOOM};

use crate::scene::{RenderScene, SceneCamera, SceneError};
use crate::world::{EntityId, WorldGraph};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("zoom system must be attached to a camera sensor")]
    NotACameraSensor,
    #[error("camera sensor has no name")]
    UnnamedSensor,
    #[error("camera sensor has no parent model")]
    NoParentModel,
    #[error("world not found")]
    NoWorld,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Render-link lifecycle. The scene camera is acquired lazily, released on
/// teardown, and re-acquired on a later tick.
enum RenderLink {
    Unacquired,
    Active(Arc<dyn SceneCamera>),
    TornDown,
}

/// Per-camera zoom system, advanced once per simulation tick.
///
/// Construction validates the attachment point; a constructed system never
/// fails at tick time. Commands arrive through the shared [`CommandLatch`]
/// from any thread; everything else is owned by the tick context.
pub struct ZoomSystem {
    latch: Arc<CommandLatch>,
    controller: ZoomController,
    sensor: EntityId,
    /// Scoped render-scene name, `<model>::<sensor>`.
    camera_name: String,
    topic: String,
    link: RenderLink,
    acquire_warned: bool,
}

impl ZoomSystem {
    /// Validate the attachment point and build the system.
    ///
    /// The sensor must be a camera with a name, a parent model, and a world
    /// to live in. Any missing prerequisite aborts setup; the host is
    /// expected to log the error and carry on without zoom control.
    pub fn new(
        sensor: EntityId,
        world: &WorldGraph,
        config: ZoomConfig,
    ) -> Result<Self, SetupError> {
        if !world.is_camera_sensor(sensor) {
            return Err(SetupError::NotACameraSensor);
        }
        let sensor_name = world
            .sensor_name(sensor)
            .filter(|name| !name.is_empty())
            .ok_or(SetupError::UnnamedSensor)?
            .to_string();
        let model = world.parent_model(sensor).ok_or(SetupError::NoParentModel)?;
        let model_name = world
            .model_name(model)
            .ok_or(SetupError::NoParentModel)?
            .to_string();
        world.world().ok_or(SetupError::NoWorld)?;

        let controller = ZoomController::new(&config)?;
        let topic = config
            .topic
            .clone()
            .unwrap_or_else(|| format!("{model_name}/{sensor_name}/zoom-command"));
        let camera_name = format!("{model_name}::{sensor_name}");
        debug!(camera = %camera_name, topic = %topic, "zoom system attached");

        Ok(Self {
            latch: Arc::new(CommandLatch::new(MIN_ZOOM)),
            controller,
            sensor,
            camera_name,
            topic,
            link: RenderLink::Unacquired,
            acquire_warned: false,
        })
    }

    /// Producer-side handle for delivering zoom commands from other threads.
    pub fn command_latch(&self) -> Arc<CommandLatch> {
        self.latch.clone()
    }

    /// Handle a zoom command delivered on the command topic.
    pub fn on_command(&self, value: f64) {
        self.latch.submit(value);
    }

    /// Topic this system expects zoom commands on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Scoped name of the render-scene camera.
    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    /// Field of view the controller is currently converging toward.
    pub fn goal_hfov(&self) -> f64 {
        self.controller.goal_hfov()
    }

    /// Effective zoom factor for a given field of view.
    pub fn zoom_factor(&self, hfov: f64) -> f64 {
        self.controller.zoom_factor(hfov)
    }

    /// Release the scene camera in response to a render teardown signal.
    ///
    /// The configuration stays valid; the handle is re-acquired on a later
    /// tick and control resumes toward the standing goal.
    pub fn on_render_teardown(&mut self) {
        debug!(camera = %self.camera_name, "render link torn down");
        self.link = RenderLink::TornDown;
        self.acquire_warned = false;
    }

    /// Run one simulation tick.
    ///
    /// Always returns normally. A tick that cannot make progress (no render
    /// camera yet, no pending work, degenerate `dt`) does nothing.
    pub fn update(&mut self, dt: Duration, world: &mut WorldGraph, scene: &dyn RenderScene) {
        match &self.link {
            RenderLink::TornDown => {
                self.link = RenderLink::Unacquired;
                return;
            }
            RenderLink::Unacquired => {
                // The first control pass runs on the tick after acquisition.
                self.acquire(scene);
                return;
            }
            RenderLink::Active(_) => {}
        }

        // Only resolve the goal once each time the command changes.
        if let Some(requested) = self.latch.take() {
            self.controller.resolve_goal(requested);
        }

        let Some(camera) = world.camera_mut(self.sensor) else {
            return;
        };
        let lens = LensState::new(camera.hfov, camera.focal_length);
        let Some(next) = self.controller.step(dt, lens) else {
            return;
        };

        // Publish to the world model.
        camera.hfov = next.hfov;
        camera.focal_length = next.focal_length;
        camera.mark_changed();

        // Publish to the rendering camera.
        if let RenderLink::Active(handle) = &self.link {
            handle.set_horizontal_fov(next.hfov);
        }
    }

    fn acquire(&mut self, scene: &dyn RenderScene) {
        match scene.camera(&self.camera_name) {
            Ok(handle) => {
                debug!(camera = %self.camera_name, "render camera acquired");
                self.link = RenderLink::Active(handle);
                self.acquire_warned = false;
            }
            Err(SceneError::NotReady) => {
                if !self.acquire_warned {
                    warn!(camera = %self.camera_name, "render scene not ready, will retry");
                    self.acquire_warned = true;
                }
            }
            Err(err) => {
                if !self.acquire_warned {
                    error!(camera = %self.camera_name, %err, "unable to acquire render camera");
                    self.acquire_warned = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SimCamera, SimScene};
    use crate::world::SensorKind;

    const DT: Duration = Duration::from_millis(20);

    struct Fixture {
        world: WorldGraph,
        scene: SimScene,
        scene_camera: Arc<SimCamera>,
        system: ZoomSystem,
    }

    /// World with one model and camera at the reference FOV, ready scene.
    fn fixture(config: ZoomConfig) -> Fixture {
        let mut world = WorldGraph::new();
        world.spawn_world("test_world");
        let model = world.spawn_model("iris");
        let sensor = world.spawn_camera(model, "zoom_cam", 2.0, 0.05);

        let mut scene = SimScene::new();
        let scene_camera = scene.add_camera("iris::zoom_cam", 2.0);
        scene.set_ready(true);

        let system = ZoomSystem::new(sensor, &world, config).unwrap();
        Fixture {
            world,
            scene,
            scene_camera,
            system,
        }
    }

    fn sensor_of(fix: &Fixture) -> EntityId {
        fix.system.sensor
    }

    #[test]
    fn test_setup_rejects_non_camera_sensor() {
        let mut world = WorldGraph::new();
        world.spawn_world("test_world");
        let model = world.spawn_model("iris");
        let imu = world.spawn_sensor(model, "imu0", SensorKind::Imu);

        assert!(matches!(
            ZoomSystem::new(imu, &world, ZoomConfig::default()),
            Err(SetupError::NotACameraSensor)
        ));
    }

    #[test]
    fn test_setup_rejects_unnamed_sensor() {
        let mut world = WorldGraph::new();
        world.spawn_world("test_world");
        let model = world.spawn_model("iris");
        let cam = world.spawn_camera(model, "", 2.0, 0.05);

        assert!(matches!(
            ZoomSystem::new(cam, &world, ZoomConfig::default()),
            Err(SetupError::UnnamedSensor)
        ));
    }

    #[test]
    fn test_setup_requires_parent_model() {
        let mut world = WorldGraph::new();
        world.spawn_world("test_world");
        let cam = world.spawn_camera(EntityId(999), "zoom_cam", 2.0, 0.05);

        assert!(matches!(
            ZoomSystem::new(cam, &world, ZoomConfig::default()),
            Err(SetupError::NoParentModel)
        ));
    }

    #[test]
    fn test_setup_requires_world() {
        let mut world = WorldGraph::new();
        let model = world.spawn_model("iris");
        let cam = world.spawn_camera(model, "zoom_cam", 2.0, 0.05);

        assert!(matches!(
            ZoomSystem::new(cam, &world, ZoomConfig::default()),
            Err(SetupError::NoWorld)
        ));
    }

    #[test]
    fn test_setup_rejects_bad_config() {
        let mut world = WorldGraph::new();
        world.spawn_world("test_world");
        let model = world.spawn_model("iris");
        let cam = world.spawn_camera(model, "zoom_cam", 2.0, 0.05);

        let config = ZoomConfig {
            max_zoom: 0.0,
            ..ZoomConfig::default()
        };
        assert!(matches!(
            ZoomSystem::new(cam, &world, config),
            Err(SetupError::Config(_))
        ));
    }

    #[test]
    fn test_topic_derivation_and_override() {
        let fix = fixture(ZoomConfig::default());
        assert_eq!(fix.system.topic(), "iris/zoom_cam/zoom-command");
        assert_eq!(fix.system.camera_name(), "iris::zoom_cam");

        let explicit = fixture(ZoomConfig {
            topic: Some("custom/zoom".to_string()),
            ..ZoomConfig::default()
        });
        assert_eq!(explicit.system.topic(), "custom/zoom");
    }

    #[test]
    fn test_instant_zoom_end_to_end() {
        let mut fix = fixture(ZoomConfig::default());
        let sensor = sensor_of(&fix);

        fix.system.on_command(2.0);
        // First tick acquires the render camera, second applies the zoom.
        fix.system.update(DT, &mut fix.world, &fix.scene);
        fix.system.update(DT, &mut fix.world, &fix.scene);

        let camera = fix.world.camera_mut(sensor).unwrap();
        assert!((camera.hfov - 1.0).abs() < 1e-9);
        assert!(camera.take_changed());
        assert!((fix.scene_camera.horizontal_fov() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_command_means_no_writes() {
        let mut fix = fixture(ZoomConfig::default());
        let sensor = sensor_of(&fix);

        for _ in 0..10 {
            fix.system.update(DT, &mut fix.world, &fix.scene);
        }

        let camera = fix.world.camera_mut(sensor).unwrap();
        assert_eq!(camera.hfov, 2.0);
        assert!(!camera.take_changed());
        assert_eq!(fix.scene_camera.horizontal_fov(), 2.0);
    }

    #[test]
    fn test_change_marked_once_per_writing_tick() {
        let mut fix = fixture(ZoomConfig {
            slew_rate: 0.01,
            ..ZoomConfig::default()
        });
        let sensor = sensor_of(&fix);

        fix.system.on_command(2.0);
        fix.system.update(DT, &mut fix.world, &fix.scene); // acquire only
        assert!(!fix.world.camera_mut(sensor).unwrap().take_changed());

        fix.system.update(DT, &mut fix.world, &fix.scene);
        assert!(fix.world.camera_mut(sensor).unwrap().take_changed());
        // Drain the remaining convergence, consuming marks as they appear.
        for _ in 0..5_000 {
            fix.system.update(DT, &mut fix.world, &fix.scene);
            fix.world.camera_mut(sensor).unwrap().take_changed();
        }
        // Converged: a further tick makes no write.
        fix.system.update(DT, &mut fix.world, &fix.scene);
        assert!(!fix.world.camera_mut(sensor).unwrap().take_changed());
        let camera = fix.world.camera_mut(sensor).unwrap();
        assert!((camera.hfov - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_commands_coalesce_to_latest() {
        let mut fix = fixture(ZoomConfig::default());
        let sensor = sensor_of(&fix);

        fix.system.update(DT, &mut fix.world, &fix.scene); // acquire
        fix.system.on_command(3.0);
        fix.system.on_command(5.0);
        fix.system.on_command(4.0);
        fix.system.update(DT, &mut fix.world, &fix.scene);

        let camera = fix.world.camera_mut(sensor).unwrap();
        assert!((camera.hfov - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_waits_for_render_scene() {
        let mut fix = fixture(ZoomConfig::default());
        let sensor = sensor_of(&fix);
        fix.scene.set_ready(false);

        fix.system.on_command(2.0);
        for _ in 0..5 {
            fix.system.update(DT, &mut fix.world, &fix.scene);
        }
        assert_eq!(fix.world.camera_mut(sensor).unwrap().hfov, 2.0);

        fix.scene.set_ready(true);
        fix.system.update(DT, &mut fix.world, &fix.scene); // acquire
        fix.system.update(DT, &mut fix.world, &fix.scene);
        assert!((fix.world.camera_mut(sensor).unwrap().hfov - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_scene_camera_stays_inert() {
        let mut world = WorldGraph::new();
        world.spawn_world("test_world");
        let model = world.spawn_model("iris");
        let sensor = world.spawn_camera(model, "zoom_cam", 2.0, 0.05);

        // Scene is ready but knows no such camera.
        let scene = {
            let mut scene = SimScene::new();
            scene.add_non_camera("iris::other");
            scene.set_ready(true);
            scene
        };

        let mut system = ZoomSystem::new(sensor, &world, ZoomConfig::default()).unwrap();
        system.on_command(2.0);
        for _ in 0..5 {
            system.update(DT, &mut world, &scene);
        }
        assert_eq!(world.camera_mut(sensor).unwrap().hfov, 2.0);
    }

    #[test]
    fn test_teardown_releases_then_reacquires() {
        let mut fix = fixture(ZoomConfig::default());
        let sensor = sensor_of(&fix);

        fix.system.on_command(2.0);
        fix.system.update(DT, &mut fix.world, &fix.scene); // acquire
        fix.system.update(DT, &mut fix.world, &fix.scene);
        assert!((fix.world.camera_mut(sensor).unwrap().hfov - 1.0).abs() < 1e-9);
        fix.world.camera_mut(sensor).unwrap().take_changed();

        fix.system.on_render_teardown();
        fix.system.on_command(4.0);
        fix.system.update(DT, &mut fix.world, &fix.scene); // torn down -> unacquired
        fix.system.update(DT, &mut fix.world, &fix.scene); // re-acquire
        assert!(!fix.world.camera_mut(sensor).unwrap().take_changed());

        fix.system.update(DT, &mut fix.world, &fix.scene);
        let camera = fix.world.camera_mut(sensor).unwrap();
        assert!((camera.hfov - 0.5).abs() < 1e-9);
        assert!((fix.scene_camera.horizontal_fov() - 0.5).abs() < 1e-9);
    }
}
