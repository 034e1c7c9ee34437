//! Scenario descriptor types.
//!
//! Descriptors are plain data: built once per run, serialized, never mutated.
use crate::categorize::Priority;
use crate::endpoint::{EndpointKey, HttpMethod};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scenario classes in emission order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioClass {
    Success,
    Validation,
    Security,
    Boundary,
    NotFound,
    RateLimit,
    Performance,
}

/// A single status code or a set of acceptable ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedStatus {
    Code(u16),
    AnyOf(Vec<u16>),
}

impl ExpectedStatus {
    pub fn codes(&self) -> Vec<u16> {
        match self {
            Self::Code(code) => vec![*code],
            Self::AnyOf(codes) => codes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    pub name: String,
    pub class: ScenarioClass,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query_params: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub expected_status: ExpectedStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency_ms: Option<u64>,
}

/// Ordered scenario list for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointScenarios {
    pub key: EndpointKey,
    pub category: String,
    pub scenarios: Vec<ScenarioDescriptor>,
}

impl EndpointScenarios {
    pub fn count_by_class(&self) -> BTreeMap<ScenarioClass, usize> {
        let mut counts = BTreeMap::new();
        for scenario in &self.scenarios {
            *counts.entry(scenario.class).or_insert(0) += 1;
        }
        counts
    }
}
