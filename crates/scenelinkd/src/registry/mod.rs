//! Name-indexed table of invocable operations.
//!
//! The registry is assembled once at start-up from a declarative list and is
//! read-only afterwards, so it is shared between the network thread (for
//! discovery) and the privileged context (for invocation) behind an `Arc`.

mod arguments;
mod errors;
mod schema;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scenelink_protocol::OperationDescriptor;

pub use self::arguments::Arguments;
pub use self::errors::{OperationError, RegistryError};
pub use self::schema::InputSchema;

/// A named, schema-described unit of host work.
pub trait Operation: Send + Sync {
    /// Discovery record advertised by `tools/list`.
    fn descriptor(&self) -> &OperationDescriptor;

    /// Runs the operation on the privileged context.
    ///
    /// # Errors
    ///
    /// Returns an [`OperationError`] describing why the operation could not
    /// complete. The bridge renders it as `Error: <message>`.
    fn invoke(&self, arguments: &Arguments) -> Result<String, OperationError>;
}

type Invoker = dyn Fn(&Arguments) -> Result<String, OperationError> + Send + Sync;

/// Operation backed by a closure.
pub struct FnOperation {
    descriptor: OperationDescriptor,
    invoker: Box<Invoker>,
}

impl FnOperation {
    /// Builds an operation from its discovery record and body.
    #[must_use]
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: InputSchema,
        invoker: F,
    ) -> Self
    where
        F: Fn(&Arguments) -> Result<String, OperationError> + Send + Sync + 'static,
    {
        Self {
            descriptor: OperationDescriptor {
                name: name.into(),
                description: description.into(),
                input_schema: schema.build(),
            },
            invoker: Box::new(invoker),
        }
    }
}

impl fmt::Debug for FnOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FnOperation")
            .field("name", &self.descriptor.name)
            .finish_non_exhaustive()
    }
}

impl Operation for FnOperation {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn invoke(&self, arguments: &Arguments) -> Result<String, OperationError> {
        (self.invoker)(arguments)
    }
}

/// Immutable operation table, enumerated in registration order.
#[derive(Default)]
pub struct OperationRegistry {
    operations: Vec<Arc<dyn Operation>>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    /// Starts an empty registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up an operation by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Operation>> {
        self.index
            .get(name)
            .and_then(|position| self.operations.get(*position))
    }

    /// Descriptors of every operation, in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<OperationDescriptor> {
        self.operations
            .iter()
            .map(|operation| operation.descriptor().clone())
            .collect()
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries(
                self.operations
                    .iter()
                    .map(|operation| operation.descriptor().name.as_str()),
            )
            .finish()
    }
}

/// Collects operations before freezing them into an [`OperationRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    registry: OperationRegistry,
}

impl RegistryBuilder {
    /// Adds an operation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOperation`] when the name is taken
    /// and [`RegistryError::EmptyName`] when it is blank.
    pub fn register<O>(mut self, operation: O) -> Result<Self, RegistryError>
    where
        O: Operation + 'static,
    {
        let name = operation.descriptor().name.clone();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.registry.index.contains_key(&name) {
            return Err(RegistryError::DuplicateOperation { name });
        }
        let position = self.registry.operations.len();
        self.registry.operations.push(Arc::new(operation));
        self.registry.index.insert(name, position);
        Ok(self)
    }

    /// Freezes the table.
    #[must_use]
    pub fn build(self) -> OperationRegistry {
        self.registry
    }
}
