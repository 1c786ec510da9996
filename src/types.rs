//! Core types and configuration for connector seeding.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A connector record: string keys mapped to arbitrary JSON values.
pub type Record = Map<String, Value>;

/// Registry that the definitions are fetched from by default.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://connectors.airbyte.com/files/registries/v0/oss_registry.json";

/// Default output path of the definitions file.
pub const DEFAULT_DEFINITIONS_OUTPUT: &str = "../definitions.json";

/// Default input and output paths of the task schema.
pub const DEFAULT_TASKS_INPUT: &str = "./tasks.json";
pub const DEFAULT_TASKS_OUTPUT: &str = "../tasks.json";

/// Field name marking secrets in the registry, and its replacement.
pub const SECRET_TOKEN: &str = "airbyte_secret";
pub const CREDENTIAL_TOKEN: &str = "credential_field";

/// Constants attached to every output record.
pub const CONNECTOR_TYPE: &str = "CONNECTOR_TYPE_DATA";
pub const VENDOR: &str = "Airbyte";
pub const WRITE_TASK: &str = "TASK_WRITE_DESTINATION";

/// Registry document shape. Only the destinations are used.
#[derive(Debug, Clone, Deserialize)]
pub struct Registry {
    pub destinations: Vec<Record>,
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shape of the generated definitions file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One output record per destination.
    #[default]
    PerConnector,
    /// A single record whose connection specification is a `oneOf`
    /// over every destination's specification.
    Envelope,
}

/// Options for generating the definitions file.
#[derive(Debug, Clone)]
pub struct DefinitionsOptions {
    /// Registry source: URL or local file path.
    pub registry: String,
    /// Output file, fully overwritten.
    pub output: PathBuf,
    pub layout: Layout,
    /// Token replaced throughout the serialized output.
    pub secret_token: String,
    pub credential_token: String,
}

impl Default for DefinitionsOptions {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY_URL.to_string(),
            output: PathBuf::from(DEFAULT_DEFINITIONS_OUTPUT),
            layout: Layout::default(),
            secret_token: SECRET_TOKEN.to_string(),
            credential_token: CREDENTIAL_TOKEN.to_string(),
        }
    }
}

impl DefinitionsOptions {
    /// Create options with the default registry, output and tokens.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = registry.into();
        self
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Options for rendering the task schema.
#[derive(Debug, Clone)]
pub struct TasksOptions {
    /// Schema file whose `$ref` pointers are resolved relative to its directory.
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for TasksOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_TASKS_INPUT),
            output: PathBuf::from(DEFAULT_TASKS_OUTPUT),
        }
    }
}

impl TasksOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}
