//! Minimal entity world standing in for the simulator's component manager.
//!
//! Only the pieces the zoom system needs are modeled: a world handle, named
//! models, named sensors parented to models, and camera lens attributes
//! with a once-per-tick change mark.

use std::collections::HashMap;

/// Handle to an entity in the world graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// Kind of sensor attached to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Camera,
    Imu,
    Lidar,
}

/// Camera lens attributes mutated by the zoom system.
#[derive(Debug, Clone)]
pub struct CameraComponent {
    /// Horizontal field of view (radians).
    pub hfov: f64,
    /// Lens focal length (meters).
    pub focal_length: f64,
    /// Raised when the zoom system wrote new lens values this tick.
    changed: bool,
}

impl CameraComponent {
    pub fn new(hfov: f64, focal_length: f64) -> Self {
        Self {
            hfov,
            focal_length,
            changed: false,
        }
    }

    /// Observe and clear the change mark.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }
}

#[derive(Debug)]
struct Model {
    name: String,
}

#[derive(Debug)]
struct Sensor {
    name: String,
    kind: SensorKind,
    parent: EntityId,
    camera: Option<CameraComponent>,
}

/// Entity graph for one simulated world.
#[derive(Debug, Default)]
pub struct WorldGraph {
    next_id: u64,
    world: Option<(EntityId, String)>,
    models: HashMap<EntityId, Model>,
    sensors: HashMap<EntityId, Sensor>,
}

impl WorldGraph {
    /// Create an empty graph. A usable graph also needs a world entity, see
    /// [`spawn_world`](Self::spawn_world).
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    /// Create the world entity. At most one world per graph; a second call
    /// replaces the first.
    pub fn spawn_world(&mut self, name: &str) -> EntityId {
        let id = self.allocate();
        self.world = Some((id, name.to_string()));
        id
    }

    /// Add a named model.
    pub fn spawn_model(&mut self, name: &str) -> EntityId {
        let id = self.allocate();
        self.models.insert(
            id,
            Model {
                name: name.to_string(),
            },
        );
        id
    }

    /// Add a non-camera sensor under `parent`.
    pub fn spawn_sensor(&mut self, parent: EntityId, name: &str, kind: SensorKind) -> EntityId {
        let id = self.allocate();
        self.sensors.insert(
            id,
            Sensor {
                name: name.to_string(),
                kind,
                parent,
                camera: None,
            },
        );
        id
    }

    /// Add a camera sensor under `parent` with initial lens attributes.
    pub fn spawn_camera(
        &mut self,
        parent: EntityId,
        name: &str,
        hfov: f64,
        focal_length: f64,
    ) -> EntityId {
        let id = self.allocate();
        self.sensors.insert(
            id,
            Sensor {
                name: name.to_string(),
                kind: SensorKind::Camera,
                parent,
                camera: Some(CameraComponent::new(hfov, focal_length)),
            },
        );
        id
    }

    /// The world entity, if one was spawned.
    pub fn world(&self) -> Option<EntityId> {
        self.world.as_ref().map(|(id, _)| *id)
    }

    /// True when `id` is a sensor of camera kind.
    pub fn is_camera_sensor(&self, id: EntityId) -> bool {
        self.sensors
            .get(&id)
            .is_some_and(|s| s.kind == SensorKind::Camera)
    }

    /// Display name of a sensor.
    pub fn sensor_name(&self, id: EntityId) -> Option<&str> {
        self.sensors.get(&id).map(|s| s.name.as_str())
    }

    /// Parent model of a sensor. `None` when the sensor is missing or its
    /// parent is not a model in this graph.
    pub fn parent_model(&self, id: EntityId) -> Option<EntityId> {
        let parent = self.sensors.get(&id)?.parent;
        self.models.contains_key(&parent).then_some(parent)
    }

    /// Display name of a model.
    pub fn model_name(&self, id: EntityId) -> Option<&str> {
        self.models.get(&id).map(|m| m.name.as_str())
    }

    /// Camera lens attributes of a sensor.
    pub fn camera(&self, id: EntityId) -> Option<&CameraComponent> {
        self.sensors.get(&id)?.camera.as_ref()
    }

    /// Mutable camera lens attributes of a sensor.
    pub fn camera_mut(&mut self, id: EntityId) -> Option<&mut CameraComponent> {
        self.sensors.get_mut(&id)?.camera.as_mut()
    }
}
