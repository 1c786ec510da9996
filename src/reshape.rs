//! Reshaping of registry destination records into connector definitions.
//!
//! Each record goes through three stages:
//!
//! 1. `id` and `title` are synthesized from `dockerRepository` and `name`.
//! 2. [`FIELD_RULES`] is applied in order. A rule renames a field in place,
//!    relocates it into `vendor_attributes`, or deletes it.
//! 3. The constant fields `type`, `vendor` and `available_tasks` are attached.
//!
//! Fields that no rule mentions pass through unchanged.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::ReshapeError;
use crate::types::{json_type_name, Record, CONNECTOR_TYPE, VENDOR, WRITE_TASK};

/// Prefix of every synthesized connector `id`.
pub const ID_PREFIX: &str = "airbyte-";

/// Prefix of every synthesized display `title`.
pub const TITLE_PREFIX: &str = "Airbyte ";

/// Name of the bag collecting registry-only metadata.
pub const VENDOR_ATTRIBUTES: &str = "vendor_attributes";

/// Which map a rule looks its field up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The top level of the record.
    Record,
    /// The record's `spec` object.
    Spec,
}

impl Scope {
    fn path(self, field: &str) -> String {
        match self {
            Scope::Record => field.to_string(),
            Scope::Spec => format!("spec.{}", field),
        }
    }
}

/// What happens to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the value to another key in the same scope.
    Rename(&'static str),
    /// Move the value into `vendor_attributes` (or `vendor_attributes.spec`
    /// for the spec scope), keeping its name.
    Relocate,
    /// Drop the value.
    Delete,
}

/// What happens when the field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfAbsent {
    /// The record is rejected with `ReshapeError::MissingField`.
    Fail,
    /// Nothing happens.
    Skip,
    /// The action is applied to an empty string.
    EmptyString,
    /// The action is applied to an empty object.
    EmptyObject,
}

/// A single entry of the field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub scope: Scope,
    pub field: &'static str,
    pub action: Action,
    pub if_absent: IfAbsent,
}

const fn rule(scope: Scope, field: &'static str, action: Action, if_absent: IfAbsent) -> FieldRule {
    FieldRule {
        scope,
        field,
        action,
        if_absent,
    }
}

use Action::{Delete, Relocate, Rename};
use IfAbsent::{EmptyObject, EmptyString, Fail, Skip};
use Scope::{Record as Top, Spec};

/// Field table applied to every destination record, in order.
pub const FIELD_RULES: &[FieldRule] = &[
    rule(Top, "destinationDefinitionId", Rename("uid"), Fail),
    rule(Top, "documentationUrl", Rename("documentation_url"), Fail),
    rule(Top, "iconUrl", Rename("icon_url"), EmptyString),
    rule(Top, "dockerRepository", Relocate, Fail),
    rule(Top, "dockerImageTag", Relocate, Fail),
    rule(Top, "releaseStage", Relocate, Skip),
    rule(Top, "tags", Relocate, Skip),
    rule(Top, "license", Relocate, Skip),
    rule(Top, "githubIssueLabel", Relocate, Skip),
    rule(Top, "sourceType", Relocate, Skip),
    rule(Top, "resourceRequirements", Relocate, EmptyObject),
    rule(Top, "normalizationConfig", Relocate, Skip),
    rule(Top, "supportsDbt", Relocate, Skip),
    rule(Top, "ab_internal", Relocate, Skip),
    rule(Top, "name", Delete, Skip),
    rule(Spec, "connectionSpecification", Rename("resource_specification"), Fail),
    rule(Spec, "documentationUrl", Delete, Skip),
    rule(Spec, "supported_destination_sync_modes", Relocate, Skip),
    rule(Spec, "supportsIncremental", Relocate, Skip),
    rule(Spec, "supportsNormalization", Relocate, Skip),
    rule(Spec, "supportsDBT", Relocate, Skip),
    rule(Spec, "authSpecification", Relocate, Skip),
    rule(Spec, "advanced_auth", Relocate, Skip),
    rule(Spec, "supportsNamespaces", Relocate, Skip),
    rule(Spec, "protocol_version", Relocate, Skip),
    rule(Spec, "$schema", Relocate, Skip),
];

/// Build a connector `id` from a docker repository such as
/// `airbyte/destination-postgres`.
///
/// Returns `None` when the repository has no `/`.
pub fn derive_id(docker_repository: &str) -> Option<String> {
    let image = docker_repository.split('/').nth(1)?;
    Some(format!("{}{}", ID_PREFIX, image))
}

/// Reshape one registry record. `index` is only used in error messages.
///
/// # Errors
///
/// `ReshapeError::MissingField` when an identity field is absent, and
/// `ReshapeError::UnexpectedType` when one has the wrong JSON type.
pub fn reshape_record(index: usize, mut record: Record) -> Result<Record, ReshapeError> {
    let repository = required_str(index, &record, "dockerRepository")?;
    let id = derive_id(repository).ok_or_else(|| ReshapeError::UnexpectedType {
        index,
        field: "dockerRepository".to_string(),
        expected: "an <owner>/<image> path",
        actual: format!("{:?}", repository),
    })?;
    let title = format!("{}{}", TITLE_PREFIX, required_str(index, &record, "name")?);

    let mut spec = match record.remove("spec") {
        Some(Value::Object(spec)) => spec,
        Some(other) => {
            return Err(ReshapeError::UnexpectedType {
                index,
                field: "spec".to_string(),
                expected: "object",
                actual: json_type_name(&other).to_string(),
            })
        }
        None => {
            return Err(ReshapeError::MissingField {
                index,
                field: "spec".to_string(),
            })
        }
    };

    let mut vendor = Record::new();
    let mut vendor_spec = Record::new();
    for rule in FIELD_RULES {
        let (source, target) = match rule.scope {
            Scope::Record => (&mut record, &mut vendor),
            Scope::Spec => (&mut spec, &mut vendor_spec),
        };
        apply_rule(index, rule, source, target)?;
    }
    vendor.insert("spec".to_string(), Value::Object(vendor_spec));

    debug!(index, %id, "reshaped destination");
    record.insert("id".to_string(), Value::String(id));
    record.insert("title".to_string(), Value::String(title));
    record.insert("spec".to_string(), Value::Object(spec));
    record.insert(VENDOR_ATTRIBUTES.to_string(), Value::Object(vendor));
    record.insert("type".to_string(), json!(CONNECTOR_TYPE));
    record.insert("vendor".to_string(), json!(VENDOR));
    record.insert("available_tasks".to_string(), json!([WRITE_TASK]));

    Ok(record)
}

/// Reshape every record, stopping at the first failure.
pub fn reshape_all(records: Vec<Record>) -> Result<Vec<Record>, ReshapeError> {
    let reshaped = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| reshape_record(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    let keys: BTreeSet<&str> = reshaped
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();
    debug!(?keys, "output record keys");

    Ok(reshaped)
}

fn apply_rule(
    index: usize,
    rule: &FieldRule,
    source: &mut Record,
    vendor: &mut Record,
) -> Result<(), ReshapeError> {
    let value = match source.remove(rule.field) {
        Some(value) => value,
        None => match rule.if_absent {
            IfAbsent::Fail => {
                return Err(ReshapeError::MissingField {
                    index,
                    field: rule.scope.path(rule.field),
                })
            }
            IfAbsent::Skip => return Ok(()),
            IfAbsent::EmptyString => Value::String(String::new()),
            IfAbsent::EmptyObject => Value::Object(Record::new()),
        },
    };

    match rule.action {
        Action::Rename(to) => {
            source.insert(to.to_string(), value);
        }
        Action::Relocate => {
            vendor.insert(rule.field.to_string(), value);
        }
        Action::Delete => {}
    }
    Ok(())
}

fn required_str<'a>(index: usize, record: &'a Record, field: &str) -> Result<&'a str, ReshapeError> {
    match record.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ReshapeError::UnexpectedType {
            index,
            field: field.to_string(),
            expected: "string",
            actual: json_type_name(other).to_string(),
        }),
        None => Err(ReshapeError::MissingField {
            index,
            field: field.to_string(),
        }),
    }
}
