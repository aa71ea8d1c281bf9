//! Zoomlens Sim - simulation-facing shell for the zoom controller
//!
//! Hosts plug the zoom system into their tick loop: a minimal entity world
//! supplies the camera sensor and its lens attributes, a render scene
//! supplies the camera handle once the renderer is up, and [`ZoomSystem`]
//! runs the per-tick control pass.

pub mod scene;
pub mod system;
pub mod world;

pub use scene::{RenderScene, SceneCamera, SceneError, SimScene};
pub use system::{SetupError, ZoomSystem};
pub use world::{CameraComponent, EntityId, SensorKind, WorldGraph};
