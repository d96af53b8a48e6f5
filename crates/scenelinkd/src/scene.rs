//! In-memory demo scene and the operations that drive it.
//!
//! The scene stands in for a real host application so the binary has
//! something to automate. It is only touched from the privileged context,
//! but the registry is `Sync`, so the state still sits behind a mutex.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::registry::{FnOperation, InputSchema, OperationError, OperationRegistry, RegistryError};

/// Actor classes `spawn_actor` knows how to create.
pub const SPAWNABLE_CLASSES: [&str; 5] = [
    "PointLight",
    "SpotLight",
    "DirectionalLight",
    "StaticMeshActor",
    "CameraActor",
];

/// A placed object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Unique name.
    pub name: String,
    /// Class the actor was spawned from.
    pub class: String,
    /// World position.
    pub location: [f64; 3],
    /// Pitch, yaw, roll in degrees.
    pub rotation: [f64; 3],
    /// Per-axis scale.
    pub scale: [f64; 3],
}

impl Actor {
    fn new(name: String, class: &str, location: [f64; 3]) -> Self {
        Self {
            name,
            class: class.to_owned(),
            location,
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

/// Mutable scene contents.
#[derive(Debug, Default)]
pub struct SceneState {
    project: String,
    actors: Vec<Actor>,
    next_suffix: u64,
}

impl SceneState {
    /// Empty scene belonging to `project`.
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    /// Scene pre-populated with a light and a camera.
    #[must_use]
    pub fn demo() -> Self {
        let mut scene = Self::new("DemoProject");
        scene.spawn("DirectionalLight", [0.0, 0.0, 500.0]);
        scene.spawn("CameraActor", [-400.0, 0.0, 200.0]);
        scene
    }

    /// Actors in spawn order.
    #[must_use]
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Looks up an actor by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.name == name)
    }

    /// Adds an actor of `class` and returns its generated name.
    pub fn spawn(&mut self, class: &str, location: [f64; 3]) -> String {
        let name = format!("{class}_{}", self.next_suffix);
        self.next_suffix += 1;
        self.actors.push(Actor::new(name.clone(), class, location));
        name
    }

    /// Removes the named actor, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Actor> {
        let index = self.actors.iter().position(|actor| actor.name == name)?;
        Some(self.actors.remove(index))
    }

    /// Renames an actor.
    ///
    /// # Errors
    ///
    /// Fails when `from` is unknown or `to` is already taken.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), OperationError> {
        if from != to && self.find(to).is_some() {
            return Err(OperationError::failed(format!(
                "Actor '{to}' already exists"
            )));
        }
        let actor = self
            .actors
            .iter_mut()
            .find(|actor| actor.name == from)
            .ok_or_else(|| not_found(from))?;
        to.clone_into(&mut actor.name);
        Ok(())
    }
}

/// Shared handle to a [`SceneState`].
#[derive(Debug, Clone, Default)]
pub struct Scene(Arc<Mutex<SceneState>>);

impl Scene {
    /// Wraps `state`.
    #[must_use]
    pub fn new(state: SceneState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// Locks the scene. A panic inside an operation leaves the state usable.
    pub fn lock(&self) -> MutexGuard<'_, SceneState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(name: &str) -> OperationError {
    OperationError::failed(format!("Actor '{name}' not found"))
}

fn format_triple(values: [f64; 3]) -> String {
    format!("({:.1}, {:.1}, {:.1})", values[0], values[1], values[2])
}

/// Builds the registry of scene operations over `scene`.
///
/// # Errors
///
/// Returns [`RegistryError`] if two operations share a name.
pub fn scene_registry(scene: &Scene) -> Result<OperationRegistry, RegistryError> {
    OperationRegistry::builder()
        .register(get_actor_list(scene.clone()))?
        .register(spawn_actor(scene.clone()))?
        .register(delete_actor(scene.clone()))?
        .register(get_actor_properties(scene.clone()))?
        .register(rename_actor(scene.clone()))?
        .register(get_project_info(scene.clone()))
        .map(crate::registry::RegistryBuilder::build)
}

fn get_actor_list(scene: Scene) -> FnOperation {
    FnOperation::new(
        "get_actor_list",
        "Get list of all actors in the level",
        InputSchema::object(),
        move |_| {
            let lines: Vec<String> = scene
                .lock()
                .actors()
                .iter()
                .map(|actor| format!("{} ({})", actor.name, actor.class))
                .collect();
            Ok(format!("Found {} actors:\n{}", lines.len(), lines.join("\n")))
        },
    )
}

fn spawn_actor(scene: Scene) -> FnOperation {
    FnOperation::new(
        "spawn_actor",
        "Spawn actor (PointLight, SpotLight, DirectionalLight, StaticMeshActor, CameraActor)",
        InputSchema::object()
            .required("class_name", "string", "Actor class name")
            .property("x", "number", "X location")
            .property("y", "number", "Y location")
            .property("z", "number", "Z location"),
        move |arguments| {
            let class = arguments.required_str("class_name")?;
            if !SPAWNABLE_CLASSES.contains(&class) {
                return Err(OperationError::invalid(
                    "class_name",
                    format!(
                        "Unknown class '{class}'. Supported: {}",
                        SPAWNABLE_CLASSES.join(", ")
                    ),
                ));
            }
            let location = [
                arguments.optional_f64("x")?.unwrap_or_default(),
                arguments.optional_f64("y")?.unwrap_or_default(),
                arguments.optional_f64("z")?.unwrap_or_default(),
            ];
            let name = scene.lock().spawn(class, location);
            Ok(format!(
                "Spawned {class} at {} - Name: {name}",
                format_triple(location)
            ))
        },
    )
}

fn delete_actor(scene: Scene) -> FnOperation {
    FnOperation::new(
        "delete_actor",
        "Delete an actor by name",
        InputSchema::object().required("actor_name", "string", "Actor name"),
        move |arguments| {
            let name = arguments.required_str("actor_name")?;
            let removed = scene.lock().remove(name).ok_or_else(|| not_found(name))?;
            Ok(format!("Deleted actor: {}", removed.name))
        },
    )
}

fn get_actor_properties(scene: Scene) -> FnOperation {
    FnOperation::new(
        "get_actor_properties",
        "Get actor location, rotation, scale",
        InputSchema::object().required("actor_name", "string", "Actor name"),
        move |arguments| {
            let name = arguments.required_str("actor_name")?;
            let state = scene.lock();
            let actor = state.find(name).ok_or_else(|| not_found(name))?;
            let [pitch, yaw, roll] = actor.rotation;
            let [sx, sy, sz] = actor.scale;
            Ok(format!(
                "Actor: {}\nLocation: {}\nRotation: (Pitch={pitch:.1}, Yaw={yaw:.1}, Roll={roll:.1})\nScale: ({sx:.2}, {sy:.2}, {sz:.2})",
                actor.name,
                format_triple(actor.location),
            ))
        },
    )
}

fn rename_actor(scene: Scene) -> FnOperation {
    FnOperation::new(
        "rename_actor",
        "Rename an actor",
        InputSchema::object()
            .required("actor_name", "string", "Current actor name")
            .required("new_name", "string", "New actor name"),
        move |arguments| {
            let from = arguments.required_str("actor_name")?;
            let to = arguments.required_str("new_name")?;
            if to.is_empty() {
                return Err(OperationError::invalid("new_name", "must not be empty"));
            }
            scene.lock().rename(from, to)?;
            Ok(format!("Renamed '{from}' to '{to}'"))
        },
    )
}

fn get_project_info(scene: Scene) -> FnOperation {
    FnOperation::new(
        "get_project_info",
        "Get project name and server version",
        InputSchema::object(),
        move |_| {
            let state = scene.lock();
            Ok(format!(
                "Project: {}\nActors: {}\nServer Version: {}",
                state.project,
                state.actors().len(),
                env!("CARGO_PKG_VERSION"),
            ))
        },
    )
}
