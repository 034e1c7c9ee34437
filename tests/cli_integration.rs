mod common;

use common::{Workspace, CORPUS_TEST, OPENAPI_SPEC};
use serde_json::Value;

fn workspace() -> Workspace {
    let ws = Workspace::new();
    ws.write("openapi.json", OPENAPI_SPEC);
    ws.write("cypress/e2e/edge.cy.js", CORPUS_TEST);
    ws.write("cypress/e2e/notes.md", "cy.request('GET', '/domains')");
    ws
}

fn category<'a>(report: &'a Value, name: &str) -> &'a Value {
    report["per_category"]
        .as_array()
        .and_then(|cats| cats.iter().find(|c| c["category"] == name))
        .unwrap_or_else(|| panic!("category {name} missing"))
}

#[test]
fn init_writes_default_config_and_refuses_overwrite() {
    let ws = Workspace::new();
    let first = ws.run(&["init", "--out", "apicov.json"]);
    assert!(first.success, "{}", first.stderr);
    let text = std::fs::read_to_string(ws.root().join("apicov.json")).expect("read config");
    let config: Value = serde_json::from_str(&text).expect("config JSON");
    assert_eq!(config["schema_version"], 1);
    assert_eq!(config["default_category"], "general");

    let second = ws.run(&["init", "--out", "apicov.json"]);
    assert!(!second.success);
    assert!(second.stderr.contains("--force"));
    assert!(ws.run(&["init", "--out", "apicov.json", "--force"]).success);
}

#[test]
fn endpoints_are_categorized_and_prioritized() {
    let ws = workspace();
    let out = ws.run(&["endpoints", "--spec", "openapi.json"]).json();
    assert_eq!(out["spec_format"], "open_api");
    let endpoints = out["endpoints"].as_array().expect("endpoints");
    assert_eq!(endpoints.len(), 5);
    let list = endpoints
        .iter()
        .find(|e| e["method"] == "GET" && e["normalized_path"] == "/edge_applications")
        .expect("list endpoint");
    assert_eq!(list["category"], "edge_application");
    assert_eq!(list["priority"], "high");
    let create_domain = endpoints
        .iter()
        .find(|e| e["normalized_path"] == "/domains")
        .expect("domain endpoint");
    assert_eq!(create_domain["category"], "domains");
}

#[test]
fn coverage_json_matches_corpus_literals() {
    let ws = workspace();
    let out = ws
        .run(&[
            "coverage",
            "--spec",
            "openapi.json",
            "--corpus",
            "cypress",
            "--json",
        ])
        .json();
    let edge = category(&out, "edge_application");
    assert_eq!(edge["endpoint_count"], 4);
    assert_eq!(edge["covered_count"], 2);
    assert_eq!(edge["percentage"], 50);
    let covered: Vec<&str> = edge["covered"]
        .as_array()
        .expect("covered")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(covered.contains(&"GET /edge_applications/{param}"));
    assert!(covered.contains(&"GET /edge_applications"));

    // notes.md is outside corpus_extensions, so POST /domains stays missing.
    assert_eq!(category(&out, "domains")["percentage"], 0);
    assert_eq!(out["global"]["extra"][0], "DELETE /legacy/{param}");
    assert_eq!(out["metrics"]["corpus_files"], 1);

    let percentages = out["per_category"].as_array().expect("categories");
    for cat in percentages {
        let pct = cat["percentage"].as_u64().expect("percentage");
        assert!(pct <= 100);
        let missing = cat["missing"].as_array().expect("missing").len();
        if cat["endpoint_count"].as_u64() != Some(0) {
            assert_eq!(pct == 100, missing == 0);
        }
    }
}

#[test]
fn coverage_text_summary_lists_gaps() {
    let ws = workspace();
    let out = ws.run(&["coverage", "--spec", "openapi.json", "--corpus", "cypress"]);
    assert!(out.success, "{}", out.stderr);
    assert!(out.stdout.contains("edge_application"));
    assert!(out.stdout.contains("missing:"));
    assert!(out.stdout.contains("POST /domains"));
}

#[test]
fn scenarios_filtered_by_endpoint() {
    let ws = workspace();
    let out = ws
        .run(&[
            "scenarios",
            "--spec",
            "openapi.json",
            "--endpoint",
            "POST /edge_applications",
        ])
        .json();
    let sets = out["scenarios"].as_array().expect("scenario sets");
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0]["key"], "POST /edge_applications");
    let scenarios = sets[0]["scenarios"].as_array().expect("scenarios");
    assert_eq!(scenarios[0]["class"], "success");
    assert_eq!(scenarios[0]["expected_status"], 201);
    assert_eq!(
        scenarios[0]["payload"],
        serde_json::json!({"active": true, "name": "name_example"})
    );
    assert!(scenarios.iter().any(|s| s["class"] == "validation"));
    assert!(scenarios.iter().all(|s| s["class"] != "not_found"));

    let none = ws.run(&[
        "scenarios",
        "--spec",
        "openapi.json",
        "--endpoint",
        "PUT /nowhere",
    ]);
    assert!(!none.success);
}

#[test]
fn post_without_schema_still_gets_security_scenarios() {
    let ws = workspace();
    let out = ws
        .run(&[
            "scenarios",
            "--spec",
            "openapi.json",
            "--category",
            "domains",
        ])
        .json();
    let scenarios = out["scenarios"][0]["scenarios"]
        .as_array()
        .expect("scenarios");
    let classes: Vec<&str> = scenarios
        .iter()
        .filter_map(|s| s["class"].as_str())
        .collect();
    assert_eq!(
        classes,
        ["success", "security", "security", "rate_limit", "performance"]
    );
}

#[test]
fn report_is_deterministic_and_complete() {
    let ws = workspace();
    let args = [
        "report",
        "--spec",
        "openapi.json",
        "--corpus",
        "cypress",
    ];
    let first = ws.run(&args);
    let second = ws.run(&args);
    assert!(first.success, "{}", first.stderr);
    assert_eq!(first.stdout, second.stdout);

    let report = first.json();
    assert_eq!(report["meta"]["tool_name"], "apicov");
    assert_eq!(report["meta"]["spec_sha256"].as_str().map(str::len), Some(64));
    assert_eq!(report["totals"]["endpoints"], 5);
    assert_eq!(report["totals"]["covered"], 2);
    assert_eq!(report["totals"]["missing"], 3);
    assert_eq!(report["totals"]["extra"], 1);
    assert_eq!(report["global"]["percentage"], 40);
    assert_eq!(
        report["per_endpoint_scenario_counts"]
            .as_object()
            .map(|m| m.len()),
        Some(5)
    );
    assert!(report["totals"]["scenarios_by_class"]["security"].as_u64() >= Some(10));
}

#[test]
fn yaml_collection_spec_is_accepted() {
    let ws = Workspace::new();
    ws.write(
        "collection.yaml",
        r#"
info:
  name: fixture
item:
  - name: Domains
    item:
      - name: List domains
        request:
          method: GET
          url: "{{baseUrl}}/domains"
      - name: Get domain
        request:
          method: GET
          url: "{{baseUrl}}/domains/:domain_id"
"#,
    );
    ws.write("tests/domains.spec.ts", "cy.request('/domains/42')");
    let report = ws
        .run(&[
            "report",
            "--spec",
            "collection.yaml",
            "--corpus",
            "tests",
        ])
        .json();
    assert_eq!(report["meta"]["spec_format"], "collection");
    assert_eq!(report["totals"]["endpoints"], 2);
    assert_eq!(report["totals"]["covered"], 1);
    assert_eq!(category(&report, "domains")["percentage"], 50);
}

#[test]
fn scalar_spec_fails_with_context() {
    let ws = Workspace::new();
    ws.write("spec.json", "42");
    let out = ws.run(&["endpoints", "--spec", "spec.json"]);
    assert!(!out.success);
    assert!(out.stderr.contains("invalid input shape"));
}
