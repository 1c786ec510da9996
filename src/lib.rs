//! Connector Seed
//!
//! Offline generation of connector definition files from a connector registry.
//!
//! Two runs are provided:
//!
//! - **definitions**: fetch the registry, reshape every destination record
//!   into a connector definition, and write them with sorted keys.
//! - **tasks**: dereference every `$ref` in a local task schema and write the
//!   inlined result.
//!
//! # Example
//!
//! ```
//! use connector_seed::{reshape_record, Record};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "destinationDefinitionId": "25c5221d-dce2-4163-ade9-739ef790f503",
//!     "name": "Postgres",
//!     "dockerRepository": "airbyte/destination-postgres",
//!     "dockerImageTag": "0.4.0",
//!     "documentationUrl": "https://docs.airbyte.com/integrations/destinations/postgres",
//!     "spec": { "connectionSpecification": { "type": "object" } }
//! });
//! let raw: Record = serde_json::from_value(raw).unwrap();
//!
//! let definition = reshape_record(0, raw).unwrap();
//! assert_eq!(definition["id"], "airbyte-destination-postgres");
//! assert_eq!(definition["title"], "Airbyte Postgres");
//! assert_eq!(definition["vendor_attributes"]["dockerImageTag"], "0.4.0");
//! assert!(definition.get("dockerRepository").is_none());
//! ```
//!
//! # Field Actions
//!
//! | Action | Effect |
//! |--------|--------|
//! | `Rename` | Move the value to a new key in the same scope |
//! | `Relocate` | Move the value into `vendor_attributes` |
//! | `Delete` | Drop the value |
//!
//! Absent fields are skipped unless the rule marks them as required.

mod deref;
mod envelope;
mod error;
mod fetch;
mod pipeline;
mod reshape;
mod types;
mod writer;

pub use deref::{dereference, dereference_file, navigate_fragment};
pub use envelope::{build_envelope, derive_title, inject_discriminator, DISCRIMINATOR};
pub use error::{LoadError, RefError, ReshapeError, SeedError, WriteError};
pub use fetch::{fetch_registry, is_url, load_json, load_json_auto, load_json_str};
pub use pipeline::{generate_definitions, render_definitions, render_tasks, render_tasks_text};
pub use reshape::{
    derive_id, reshape_all, reshape_record, Action, FieldRule, IfAbsent, Scope, FIELD_RULES,
    VENDOR_ATTRIBUTES,
};
pub use types::{
    DefinitionsOptions, Layout, Record, Registry, TasksOptions, CREDENTIAL_TOKEN,
    DEFAULT_DEFINITIONS_OUTPUT, DEFAULT_REGISTRY_URL, DEFAULT_TASKS_INPUT, DEFAULT_TASKS_OUTPUT,
    SECRET_TOKEN,
};
pub use writer::{sort_keys, substitute_token, to_pretty_json, write_atomic};

#[cfg(feature = "remote")]
pub use fetch::load_json_url;
