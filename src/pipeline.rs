//! End-to-end runs: fetch, transform, write.

use serde_json::Value;
use tracing::info;

use crate::deref::dereference_file;
use crate::envelope::build_envelope;
use crate::error::SeedError;
use crate::fetch::fetch_registry;
use crate::reshape::reshape_all;
use crate::types::{DefinitionsOptions, Layout, Record, TasksOptions};
use crate::writer::{sort_keys, substitute_token, to_pretty_json, write_atomic};

/// Turn raw destination records into the definitions document.
///
/// Pure: the same records and options always give the same text.
pub fn render_definitions(
    records: Vec<Record>,
    options: &DefinitionsOptions,
) -> Result<String, SeedError> {
    let reshaped = reshape_all(records)?;
    let definitions: Vec<Value> = match options.layout {
        Layout::PerConnector => reshaped.into_iter().map(Value::Object).collect(),
        Layout::Envelope => vec![Value::Object(build_envelope(reshaped)?)],
    };

    let text = to_pretty_json(&sort_keys(&Value::Array(definitions)))?;
    Ok(substitute_token(
        &text,
        &options.secret_token,
        &options.credential_token,
    ))
}

/// Fetch the registry, render the definitions and overwrite the output file.
///
/// Returns the number of destinations processed.
pub fn generate_definitions(options: &DefinitionsOptions) -> Result<usize, SeedError> {
    let records = fetch_registry(&options.registry)?;
    let count = records.len();
    let text = render_definitions(records, options)?;
    write_atomic(&options.output, &text)?;
    info!(destinations = count, layout = ?options.layout, "generated definitions");
    Ok(count)
}

/// Dereference a task schema file and return the text to write, newline-terminated.
pub fn render_tasks_text(options: &TasksOptions) -> Result<String, SeedError> {
    let resolved = dereference_file(&options.input)?;
    let mut text = to_pretty_json(&resolved)?;
    text.push('\n');
    Ok(text)
}

/// Dereference the task schema and overwrite the output file.
pub fn render_tasks(options: &TasksOptions) -> Result<(), SeedError> {
    let text = render_tasks_text(options)?;
    write_atomic(&options.output, &text)?;
    info!(input = %options.input.display(), "rendered tasks");
    Ok(())
}
