use super::{ExpectedStatus, ScenarioClass, ScenarioSynthesizer};
use crate::categorize::{Categorizer, Priority};
use crate::config::{default_config, ScenarioSettings};
use crate::endpoint::{Endpoint, HttpMethod, Param, ParamLocation, PrimitiveType};
use crate::schema::{SchemaNode, SchemaRegistry};
use serde_json::json;
use std::collections::BTreeMap;

fn name_active() -> SchemaNode {
    SchemaNode::Object {
        props: BTreeMap::from([
            ("active".to_string(), SchemaNode::scalar(PrimitiveType::Boolean)),
            ("name".to_string(), SchemaNode::scalar(PrimitiveType::String)),
        ]),
        required: vec!["name".to_string()],
    }
}

fn classes(endpoint: Endpoint, registry: &SchemaRegistry) -> Vec<ScenarioClass> {
    let config = default_config();
    let categorized = Categorizer::new(&config).apply(endpoint);
    ScenarioSynthesizer::new(&config.scenarios, registry)
        .synthesize(&categorized)
        .scenarios
        .scenarios
        .iter()
        .map(|scenario| scenario.class)
        .collect()
}

#[test]
fn post_without_schema_skips_schema_classes() {
    let registry = SchemaRegistry::default();
    let got = classes(Endpoint::new(HttpMethod::Post, "/domains"), &registry);
    assert_eq!(
        got,
        [
            ScenarioClass::Success,
            ScenarioClass::Security,
            ScenarioClass::Security,
            ScenarioClass::RateLimit,
            ScenarioClass::Performance,
        ]
    );

    let got = classes(
        Endpoint::new(HttpMethod::Post, "/domains/{id}/records"),
        &registry,
    );
    assert!(got.contains(&ScenarioClass::NotFound));
    assert!(!got.contains(&ScenarioClass::Validation));
    assert!(!got.contains(&ScenarioClass::Boundary));
}

#[test]
fn classes_follow_fixed_order() {
    let mut endpoint = Endpoint::new(HttpMethod::Put, "/domains/{domain_id}");
    endpoint.request_schema = Some(name_active());
    endpoint.query_params.push(Param {
        name: "fields".to_string(),
        location: ParamLocation::Query,
        inferred_type: PrimitiveType::String,
        required: false,
    });
    let got = classes(endpoint, &SchemaRegistry::default());
    let mut sorted = got.clone();
    sorted.sort();
    assert_eq!(got, sorted);
    assert_eq!(got.first(), Some(&ScenarioClass::Success));
    assert_eq!(got.last(), Some(&ScenarioClass::Performance));
    // empty, invalid types, missing required field
    assert_eq!(got.iter().filter(|c| **c == ScenarioClass::Validation).count(), 3);
    // two oversized lengths, large arrays, unicode, null fields, oversized query
    assert_eq!(got.iter().filter(|c| **c == ScenarioClass::Boundary).count(), 6);
}

#[test]
fn scenario_details_for_body_endpoint() {
    let config = default_config();
    let mut endpoint = Endpoint::new(HttpMethod::Post, "/domains/:domain_id/records");
    endpoint.request_schema = Some(name_active());
    let categorized = Categorizer::new(&config).apply(endpoint);
    let registry = SchemaRegistry::default();
    let output = ScenarioSynthesizer::new(&config.scenarios, &registry).synthesize(&categorized);
    let scenarios = &output.scenarios.scenarios;
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.scenarios.key.to_string(), "POST /domains/{param}/records");

    let success = &scenarios[0];
    assert_eq!(success.name, "POST /domains/{domain_id}/records - success");
    assert_eq!(success.expected_status, ExpectedStatus::Code(201));
    assert_eq!(success.priority, categorized.priority);
    assert_eq!(
        success.payload,
        Some(json!({"active": true, "name": "name_example"}))
    );
    assert_eq!(
        success.headers.get("Authorization").map(String::as_str),
        Some("Token {{token}}")
    );

    let missing = scenarios
        .iter()
        .find(|s| s.name.ends_with("missing required field name"))
        .expect("missing-field scenario");
    assert_eq!(missing.payload, Some(json!({"active": true})));
    assert_eq!(missing.expected_status, ExpectedStatus::AnyOf(vec![400, 422]));

    let no_auth = scenarios
        .iter()
        .find(|s| s.name.ends_with("no auth"))
        .expect("no-auth scenario");
    assert!(no_auth.headers.is_empty());
    assert_eq!(no_auth.priority, Priority::High);
    assert_eq!(no_auth.expected_status, ExpectedStatus::Code(401));

    let not_found = scenarios
        .iter()
        .find(|s| s.class == ScenarioClass::NotFound)
        .expect("not-found scenario");
    assert_eq!(not_found.path, "/domains/99999999/records");
    assert_eq!(not_found.expected_status, ExpectedStatus::AnyOf(vec![404, 403]));

    let rate_limit = scenarios
        .iter()
        .find(|s| s.class == ScenarioClass::RateLimit)
        .expect("rate-limit scenario");
    assert_eq!(rate_limit.burst_requests, Some(50));
    assert_eq!(
        rate_limit.expected_status,
        ExpectedStatus::AnyOf(vec![201, 429])
    );
}

#[test]
fn delete_and_get_ignore_body_schema() {
    let config = default_config();
    let mut endpoint = Endpoint::new(HttpMethod::Delete, "/domains/{id}");
    endpoint.request_schema = Some(name_active());
    let categorized = Categorizer::new(&config).apply(endpoint);
    let registry = SchemaRegistry::default();
    let output = ScenarioSynthesizer::new(&config.scenarios, &registry).synthesize(&categorized);
    let success = &output.scenarios.scenarios[0];
    assert_eq!(success.payload, None);
    assert_eq!(success.expected_status, ExpectedStatus::AnyOf(vec![200, 202, 204]));
    assert!(output
        .scenarios
        .scenarios
        .iter()
        .all(|s| s.class != ScenarioClass::Validation));
}

#[test]
fn required_query_params_are_filled() {
    let config = default_config();
    let mut endpoint = Endpoint::new(HttpMethod::Get, "/dns/zones");
    endpoint.query_params.push(Param {
        name: "page".to_string(),
        location: ParamLocation::Query,
        inferred_type: PrimitiveType::Integer,
        required: true,
    });
    let categorized = Categorizer::new(&config).apply(endpoint);
    let registry = SchemaRegistry::default();
    let output = ScenarioSynthesizer::new(&config.scenarios, &registry).synthesize(&categorized);
    let success = &output.scenarios.scenarios[0];
    assert_eq!(success.query_params.get("page"), Some(&json!(1)));
    let oversized = output
        .scenarios
        .scenarios
        .iter()
        .find(|s| s.name.ends_with("oversized query string"))
        .expect("oversized query scenario");
    assert_eq!(
        oversized.query_params["page"].as_str().map(str::len),
        Some(1000)
    );
}

#[test]
fn cyclic_schema_terminates_with_placeholder() {
    let settings = ScenarioSettings::default();
    let mut registry = SchemaRegistry::default();
    registry.insert(
        "Node",
        SchemaNode::Object {
            props: BTreeMap::from([(
                "next".to_string(),
                SchemaNode::Ref {
                    id: "Node".to_string(),
                },
            )]),
            required: vec!["next".to_string()],
        },
    );
    let config = default_config();
    let mut endpoint = Endpoint::new(HttpMethod::Post, "/nodes");
    endpoint.request_schema = Some(SchemaNode::Ref {
        id: "Node".to_string(),
    });
    let categorized = Categorizer::new(&config).apply(endpoint);
    let output = ScenarioSynthesizer::new(&settings, &registry).synthesize(&categorized);
    assert_eq!(
        output.scenarios.scenarios[0].payload,
        Some(json!({"next": "<ref:Node>"}))
    );
    assert!(!output.diagnostics.is_empty());
}

#[test]
fn synthesis_is_deterministic() {
    let config = default_config();
    let mut endpoint = Endpoint::new(HttpMethod::Patch, "/edge_applications/{id}");
    endpoint.request_schema = Some(name_active());
    let categorized = Categorizer::new(&config).apply(endpoint);
    let registry = SchemaRegistry::default();
    let synthesizer = ScenarioSynthesizer::new(&config.scenarios, &registry);
    let first = synthesizer.synthesize(&categorized);
    let second = synthesizer.synthesize(&categorized);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.scenarios).expect("serialize"),
        serde_json::to_string(&second.scenarios).expect("serialize")
    );
}

#[test]
fn inherited_required_field_gets_missing_field_scenario() {
    let config = default_config();
    let mut registry = SchemaRegistry::default();
    registry.insert("Base", name_active());
    let mut endpoint = Endpoint::new(HttpMethod::Post, "/edge_applications");
    endpoint.request_schema = Some(SchemaNode::AllOf {
        members: vec![
            SchemaNode::Ref {
                id: "Base".to_string(),
            },
            SchemaNode::Object {
                props: BTreeMap::from([(
                    "delivery".to_string(),
                    SchemaNode::scalar(PrimitiveType::Boolean),
                )]),
                required: Vec::new(),
            },
        ],
    });
    let categorized = Categorizer::new(&config).apply(endpoint);
    let output = ScenarioSynthesizer::new(&config.scenarios, &registry).synthesize(&categorized);
    let scenarios = &output.scenarios.scenarios;
    assert_eq!(
        scenarios[0].payload,
        Some(json!({"active": true, "delivery": true, "name": "name_example"}))
    );
    let missing = scenarios
        .iter()
        .find(|s| s.name.ends_with("missing required field name"))
        .expect("missing required field scenario");
    assert_eq!(missing.class, ScenarioClass::Validation);
    assert_eq!(
        missing.payload,
        Some(json!({"active": true, "delivery": true}))
    );
}
