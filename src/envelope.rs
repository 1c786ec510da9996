//! Single-record definitions: every destination's connection specification
//! folded into one `oneOf` schema, discriminated by a `destination` property.

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::ReshapeError;
use crate::reshape::VENDOR_ATTRIBUTES;
use crate::types::{json_type_name, Record, CONNECTOR_TYPE, VENDOR, WRITE_TASK};

/// Discriminator property injected into every connection specification.
pub const DISCRIMINATOR: &str = "destination";

/// Prefix removed from a connector `id` when deriving its title.
pub const TITLE_STRIP_PREFIX: &str = "airbyte-destination-";

pub const ENVELOPE_UID: &str = "975678a2-5117-48a4-a135-019619dee18e";
pub const ENVELOPE_ID: &str = "airbyte-destination";
pub const ENVELOPE_TITLE: &str = "Airbyte Destination";
pub const ENVELOPE_DOCUMENTATION_URL: &str = "https://docs.airbyte.com/integrations/destinations";
const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Derive a display title from a connector id.
///
/// `airbyte-destination-postgres` becomes `Postgres`: the prefix is
/// stripped, ASCII punctuation dropped, and the result capitalized.
pub fn derive_title(id: &str) -> String {
    let stem = id.strip_prefix(TITLE_STRIP_PREFIX).unwrap_or(id);
    let mut chars = stem.chars().filter(|c| !c.is_ascii_punctuation());

    let mut title = String::with_capacity(stem.len());
    if let Some(first) = chars.next() {
        title.extend(first.to_uppercase());
    }
    for c in chars {
        title.extend(c.to_lowercase());
    }
    title
}

/// Add a constant `destination` property to a connection specification and
/// make sure `required` lists it exactly once.
pub fn inject_discriminator(spec: &mut Record, id: &str) {
    let properties = spec
        .entry("properties")
        .or_insert_with(|| Value::Object(Record::new()));
    if !properties.is_object() {
        *properties = Value::Object(Record::new());
    }
    if let Value::Object(properties) = properties {
        properties.insert(
            DISCRIMINATOR.to_string(),
            json!({
                "type": "string",
                "const": id,
                "title": "Destination",
            }),
        );
    }

    let mut required: Vec<Value> = match spec.remove("required") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|item| item.as_str() != Some(DISCRIMINATOR))
            .collect(),
        _ => Vec::new(),
    };
    required.push(json!(DISCRIMINATOR));
    spec.insert("required".to_string(), Value::Array(required));
}

/// Fold reshaped records into a single definition.
///
/// Each record's `spec.resource_specification` gets the discriminator and a
/// derived title, then lands in the envelope's `oneOf` in input order. The
/// records' vendor attributes are kept under
/// `vendor_attributes.destinations.<id>`.
///
/// # Errors
///
/// `ReshapeError` if a record lacks a string `id` or an object
/// `spec.resource_specification`, and `ReshapeError::DuplicateId` when two
/// records share an id.
pub fn build_envelope(records: Vec<Record>) -> Result<Record, ReshapeError> {
    let mut one_of = Vec::with_capacity(records.len());
    let mut destinations = Record::new();
    let mut seen = HashSet::new();

    for (index, mut record) in records.into_iter().enumerate() {
        let id = match record.get("id") {
            Some(Value::String(id)) => id.clone(),
            other => return Err(shape_error(index, "id", "string", other)),
        };
        if !seen.insert(id.clone()) {
            return Err(ReshapeError::DuplicateId { index, id });
        }

        let mut spec = take_resource_specification(index, &mut record)?;
        inject_discriminator(&mut spec, &id);
        spec.insert("title".to_string(), Value::String(derive_title(&id)));
        one_of.push(Value::Object(spec));

        if let Some(vendor) = record.remove(VENDOR_ATTRIBUTES) {
            destinations.insert(id.clone(), vendor);
        }
        debug!(index, %id, "folded destination into envelope");
    }

    let mut vendor = Record::new();
    vendor.insert("destinations".to_string(), Value::Object(destinations));

    let mut envelope = Record::new();
    envelope.insert("uid".to_string(), json!(ENVELOPE_UID));
    envelope.insert("id".to_string(), json!(ENVELOPE_ID));
    envelope.insert("title".to_string(), json!(ENVELOPE_TITLE));
    envelope.insert(
        "documentation_url".to_string(),
        json!(ENVELOPE_DOCUMENTATION_URL),
    );
    envelope.insert("icon_url".to_string(), json!(""));
    envelope.insert(
        "spec".to_string(),
        json!({
            "resource_specification": {
                "$schema": DRAFT_07,
                "title": format!("{} Spec", ENVELOPE_TITLE),
                "type": "object",
                "oneOf": one_of,
            }
        }),
    );
    envelope.insert(VENDOR_ATTRIBUTES.to_string(), Value::Object(vendor));
    envelope.insert("type".to_string(), json!(CONNECTOR_TYPE));
    envelope.insert("vendor".to_string(), json!(VENDOR));
    envelope.insert("available_tasks".to_string(), json!([WRITE_TASK]));
    Ok(envelope)
}

fn take_resource_specification(index: usize, record: &mut Record) -> Result<Record, ReshapeError> {
    let spec = match record.get_mut("spec") {
        Some(Value::Object(spec)) => spec,
        other => return Err(shape_error(index, "spec", "object", other.map(|v| &*v))),
    };
    match spec.remove("resource_specification") {
        Some(Value::Object(resource)) => Ok(resource),
        other => Err(shape_error(
            index,
            "spec.resource_specification",
            "object",
            other.as_ref(),
        )),
    }
}

fn shape_error(
    index: usize,
    field: &str,
    expected: &'static str,
    found: Option<&Value>,
) -> ReshapeError {
    match found {
        None => ReshapeError::MissingField {
            index,
            field: field.to_string(),
        },
        Some(value) => ReshapeError::UnexpectedType {
            index,
            field: field.to_string(),
            expected,
            actual: json_type_name(value).to_string(),
        },
    }
}
