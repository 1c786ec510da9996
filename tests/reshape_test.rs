//! Integration tests for reshaping registry destinations.

use connector_seed::{
    build_envelope, derive_title, render_definitions, reshape_all, reshape_record, Action,
    DefinitionsOptions, Layout, Record, ReshapeError, Scope, FIELD_RULES, VENDOR_ATTRIBUTES,
};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    serde_json::from_value(value).unwrap()
}

/// A destination carrying every field the rule table knows about.
fn full_destination() -> Value {
    json!({
        "destinationDefinitionId": "25c5221d-dce2-4163-ade9-739ef790f503",
        "name": "Postgres",
        "dockerRepository": "airbyte/destination-postgres",
        "dockerImageTag": "0.4.0",
        "documentationUrl": "https://docs.airbyte.com/integrations/destinations/postgres",
        "iconUrl": "https://connectors.airbyte.com/files/postgresql.svg",
        "releaseStage": "alpha",
        "tags": ["language:java"],
        "license": "ELv2",
        "githubIssueLabel": "destination-postgres",
        "sourceType": "database",
        "resourceRequirements": { "jobSpecific": [] },
        "normalizationConfig": { "supported": true },
        "supportsDbt": true,
        "ab_internal": { "sl": 100 },
        "public": true,
        "spec": {
            "documentationUrl": "https://docs.airbyte.com/integrations/destinations/postgres",
            "supportsIncremental": true,
            "supportsNormalization": true,
            "supportsDBT": true,
            "supported_destination_sync_modes": ["overwrite", "append"],
            "authSpecification": {},
            "advanced_auth": {},
            "supportsNamespaces": true,
            "protocol_version": "0.2.0",
            "$schema": "http://json-schema.org/draft-07/schema#",
            "connectionSpecification": {
                "type": "object",
                "required": ["host"],
                "properties": {
                    "host": { "type": "string" },
                    "password": { "type": "string", "airbyte_secret": true }
                }
            }
        }
    })
}

fn minimal_destination(image: &str) -> Value {
    json!({
        "destinationDefinitionId": format!("uid-{}", image),
        "name": image,
        "dockerRepository": format!("airbyte/destination-{}", image),
        "dockerImageTag": "0.1.0",
        "documentationUrl": "https://docs.airbyte.com",
        "spec": { "connectionSpecification": { "type": "object" } }
    })
}

mod rule_table {
    use super::*;

    #[test]
    fn relocated_fields_leave_the_top_level() {
        let out = reshape_record(0, record(full_destination())).unwrap();
        let vendor = out[VENDOR_ATTRIBUTES].as_object().unwrap();

        for rule in FIELD_RULES.iter().filter(|r| r.action == Action::Relocate) {
            match rule.scope {
                Scope::Record => {
                    assert!(out.get(rule.field).is_none(), "{} at top level", rule.field);
                    assert!(vendor.contains_key(rule.field), "{} not relocated", rule.field);
                }
                Scope::Spec => {
                    assert!(out["spec"].get(rule.field).is_none());
                    assert!(vendor["spec"].get(rule.field).is_some());
                }
            }
        }
    }

    #[test]
    fn deleted_fields_are_gone_everywhere() {
        let out = reshape_record(0, record(full_destination())).unwrap();

        for rule in FIELD_RULES.iter().filter(|r| r.action == Action::Delete) {
            assert!(out.get(rule.field).is_none());
            assert!(out["spec"].get(rule.field).is_none());
            assert!(out[VENDOR_ATTRIBUTES].get(rule.field).is_none());
        }
    }

    #[test]
    fn renamed_fields_move() {
        let out = reshape_record(0, record(full_destination())).unwrap();

        assert_eq!(out["uid"], "25c5221d-dce2-4163-ade9-739ef790f503");
        assert_eq!(
            out["documentation_url"],
            "https://docs.airbyte.com/integrations/destinations/postgres"
        );
        assert_eq!(
            out["icon_url"],
            "https://connectors.airbyte.com/files/postgresql.svg"
        );
        assert_eq!(out["spec"]["resource_specification"]["required"], json!(["host"]));
        assert!(out.get("destinationDefinitionId").is_none());
        assert!(out.get("documentationUrl").is_none());
        assert!(out.get("iconUrl").is_none());
        assert!(out["spec"].get("connectionSpecification").is_none());
    }

    #[test]
    fn constants_are_attached() {
        let out = reshape_record(0, record(full_destination())).unwrap();

        assert_eq!(out["type"], "CONNECTOR_TYPE_DATA");
        assert_eq!(out["vendor"], "Airbyte");
        assert_eq!(out["available_tasks"], json!(["TASK_WRITE_DESTINATION"]));
        assert_eq!(out["public"], true);
    }

    #[test]
    fn absent_optional_fields_are_not_errors() {
        let out = reshape_record(0, record(minimal_destination("postgres"))).unwrap();
        let vendor = out[VENDOR_ATTRIBUTES].as_object().unwrap();

        assert!(vendor.get("releaseStage").is_none());
        assert_eq!(vendor["resourceRequirements"], json!({}));
        assert_eq!(vendor["spec"], json!({}));
    }
}

mod synthesis {
    use super::*;

    #[test]
    fn id_from_docker_repository() {
        let out = reshape_record(0, record(full_destination())).unwrap();
        assert_eq!(out["id"], "airbyte-destination-postgres");
    }

    #[test]
    fn title_from_name() {
        let out = reshape_record(0, record(full_destination())).unwrap();
        assert_eq!(out["title"], "Airbyte Postgres");
    }

    #[test]
    fn display_title_from_id() {
        assert_eq!(derive_title("airbyte-destination-postgres"), "Postgres");
    }
}

mod failures {
    use super::*;

    #[test]
    fn missing_definition_id() {
        let mut input = minimal_destination("postgres");
        input.as_object_mut().unwrap().remove("destinationDefinitionId");

        let err = reshape_all(vec![
            record(minimal_destination("s3")),
            record(input),
        ])
        .unwrap_err();
        match err {
            ReshapeError::MissingField { index, field } => {
                assert_eq!(index, 1);
                assert_eq!(field, "destinationDefinitionId");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn name_must_be_string() {
        let mut input = minimal_destination("postgres");
        input["name"] = json!(42);

        let err = reshape_record(0, record(input)).unwrap_err();
        assert!(matches!(
            err,
            ReshapeError::UnexpectedType { expected: "string", .. }
        ));
    }
}

mod envelope {
    use super::*;

    #[test]
    fn one_of_matches_input_count() {
        let inputs = ["postgres", "s3", "bigquery"]
            .iter()
            .map(|image| record(minimal_destination(image)))
            .collect();
        let reshaped = reshape_all(inputs).unwrap();
        let envelope = build_envelope(reshaped).unwrap();

        let one_of = envelope["spec"]["resource_specification"]["oneOf"]
            .as_array()
            .unwrap();
        assert_eq!(one_of.len(), 3);

        for entry in one_of {
            let required = entry["required"].as_array().unwrap();
            let count = required.iter().filter(|r| *r == "destination").count();
            assert_eq!(count, 1);
        }
        assert_eq!(one_of[2]["title"], "Bigquery");
        assert_eq!(
            one_of[0]["properties"]["destination"]["const"],
            "airbyte-destination-postgres"
        );
    }

    #[test]
    fn existing_required_entries_survive() {
        let reshaped = reshape_all(vec![record(full_destination())]).unwrap();
        let envelope = build_envelope(reshaped).unwrap();
        let entry = &envelope["spec"]["resource_specification"]["oneOf"][0];

        assert_eq!(entry["required"], json!(["host", "destination"]));
        assert!(entry["properties"].get("password").is_some());
    }

    #[test]
    fn vendor_attributes_kept_per_destination() {
        let reshaped = reshape_all(vec![record(full_destination())]).unwrap();
        let envelope = build_envelope(reshaped).unwrap();

        assert_eq!(envelope["id"], "airbyte-destination");
        assert_eq!(
            envelope[VENDOR_ATTRIBUTES]["destinations"]["airbyte-destination-postgres"]
                ["dockerImageTag"],
            "0.4.0"
        );
    }

    #[test]
    fn repeated_repository_fails_in_envelope_layout() {
        let inputs = vec![
            record(minimal_destination("postgres")),
            record(minimal_destination("s3")),
            record(minimal_destination("postgres")),
        ];
        let options = DefinitionsOptions::new().layout(Layout::Envelope);
        let err = render_definitions(inputs, &options).unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(err
            .to_string()
            .contains("destination #2: duplicate connector id airbyte-destination-postgres"));
    }

    #[test]
    fn empty_registry_gives_empty_one_of() {
        let envelope = build_envelope(Vec::new()).unwrap();
        assert_eq!(envelope["spec"]["resource_specification"]["oneOf"], json!([]));
    }
}

mod output {
    use super::*;

    #[test]
    fn output_keys_are_sorted() {
        let text = render_definitions(vec![record(full_destination())], &DefinitionsOptions::new())
            .unwrap();

        let available = text.find("\"available_tasks\"").unwrap();
        let vendor = text.find("\"vendor\":").unwrap();
        let vendor_attributes = text.find("\"vendor_attributes\"").unwrap();
        assert!(available < vendor);
        assert!(vendor < vendor_attributes);
        assert!(text.starts_with("[\n  {\n    \"available_tasks\": [\n"));
    }

    #[test]
    fn same_input_same_bytes() {
        let inputs = || vec![record(full_destination()), record(minimal_destination("s3"))];
        for layout in [Layout::PerConnector, Layout::Envelope] {
            let options = DefinitionsOptions::new().layout(layout);
            let first = render_definitions(inputs(), &options).unwrap();
            let second = render_definitions(inputs(), &options).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn secret_marker_is_renamed() {
        let text = render_definitions(vec![record(full_destination())], &DefinitionsOptions::new())
            .unwrap();

        assert!(!text.contains("airbyte_secret"));
        assert_eq!(text.matches("\"credential_field\": true").count(), 1);
    }
}
