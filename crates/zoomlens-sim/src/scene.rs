//! Render-scene contracts and an in-memory reference scene.
//!
//! The zoom system never talks to a renderer directly; it acquires an
//! abstract camera handle once the scene reports ready, and re-acquires it
//! after a teardown. [`SimScene`] is the reference implementation used by
//! the tests and the demo daemon.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("render scene is not ready")]
    NotReady,
    #[error("no sensor named [{0}] in the render scene")]
    SensorNotFound(String),
    #[error("sensor [{0}] is not a camera")]
    NotACamera(String),
}

/// Camera handle exposed by the render scene.
///
/// Handles are shared with the renderer, hence interior mutability behind
/// `&self`.
pub trait SceneCamera: Send + Sync {
    /// Apply a new horizontal field of view (radians).
    fn set_horizontal_fov(&self, hfov: f64);

    /// Currently applied horizontal field of view (radians).
    fn horizontal_fov(&self) -> f64;
}

/// Scene-side collaborator supplying camera handles once the renderer is up.
pub trait RenderScene {
    /// Look up the camera handle for `name`.
    ///
    /// Fails cleanly when the scene is not ready, the sensor is unknown, or
    /// the sensor has no camera capability.
    fn camera(&self, name: &str) -> Result<Arc<dyn SceneCamera>, SceneError>;
}

/// Camera registered in a [`SimScene`].
#[derive(Debug, Default)]
pub struct SimCamera {
    hfov: Mutex<f64>,
}

impl SceneCamera for SimCamera {
    fn set_horizontal_fov(&self, hfov: f64) {
        *self.hfov.lock().unwrap() = hfov;
    }

    fn horizontal_fov(&self) -> f64 {
        *self.hfov.lock().unwrap()
    }
}

/// In-memory render scene for tests and the demo daemon.
///
/// Starts not ready, mirroring a renderer that has not finished loading.
#[derive(Default)]
pub struct SimScene {
    ready: AtomicBool,
    /// `None` marks a sensor that exists but has no camera capability.
    sensors: HashMap<String, Option<Arc<SimCamera>>>,
}

impl SimScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a camera under its scoped name and return the handle.
    pub fn add_camera(&mut self, name: &str, hfov: f64) -> Arc<SimCamera> {
        let camera = Arc::new(SimCamera {
            hfov: Mutex::new(hfov),
        });
        self.sensors.insert(name.to_string(), Some(camera.clone()));
        camera
    }

    /// Register a sensor without camera capability.
    pub fn add_non_camera(&mut self, name: &str) {
        self.sensors.insert(name.to_string(), None);
    }

    /// Flip renderer readiness.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl RenderScene for SimScene {
    fn camera(&self, name: &str) -> Result<Arc<dyn SceneCamera>, SceneError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(SceneError::NotReady);
        }
        match self.sensors.get(name) {
            None => Err(SceneError::SensorNotFound(name.to_string())),
            Some(None) => Err(SceneError::NotACamera(name.to_string())),
            Some(Some(camera)) => Ok(camera.clone()),
        }
    }
}
