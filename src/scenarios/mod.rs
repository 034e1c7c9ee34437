//! Per-endpoint scenario synthesis.
//!
//! Each endpoint gets an ordered list: success, validation, security,
//! boundary, not_found, rate_limit, performance. Schema-dependent classes
//! (validation, boundary bodies) are omitted when the endpoint carries no
//! request schema; the rest are always produced.
mod types;

pub use types::*;

use crate::categorize::{CategorizedEndpoint, Priority};
use crate::config::ScenarioSettings;
use crate::diagnostics::Diagnostic;
use crate::endpoint::{HttpMethod, Param, PrimitiveType};
use crate::path::fill_template;
use crate::payload::{PayloadSynthesizer, PayloadVariant};
use crate::schema::{SchemaNode, SchemaRegistry};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const VALIDATION_STATUSES: [u16; 2] = [400, 422];
const NOT_FOUND_STATUSES: [u16; 2] = [404, 403];
const RATE_LIMITED: u16 = 429;

/// Scenarios plus whatever the payload walk reported along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutput {
    pub scenarios: EndpointScenarios,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ScenarioSynthesizer<'a> {
    settings: &'a ScenarioSettings,
    payloads: PayloadSynthesizer<'a>,
}

/// Accumulates descriptors for one endpoint.
struct Builder<'e> {
    endpoint: &'e CategorizedEndpoint,
    auth: BTreeMap<String, String>,
    scenarios: Vec<ScenarioDescriptor>,
    diagnostics: Vec<Diagnostic>,
}

impl Builder<'_> {
    fn push(
        &mut self,
        class: ScenarioClass,
        label: &str,
        priority: Priority,
        expected_status: ExpectedStatus,
    ) -> &mut ScenarioDescriptor {
        let endpoint = &self.endpoint.endpoint;
        self.scenarios.push(ScenarioDescriptor {
            name: format!("{} {} - {label}", endpoint.method, endpoint.template_path),
            class,
            method: endpoint.method,
            path: endpoint.template_path.clone(),
            payload: None,
            query_params: BTreeMap::new(),
            headers: self.auth.clone(),
            expected_status,
            priority,
            burst_requests: None,
            max_latency_ms: None,
        });
        let last = self.scenarios.len() - 1;
        &mut self.scenarios[last]
    }
}

impl<'a> ScenarioSynthesizer<'a> {
    pub fn new(settings: &'a ScenarioSettings, registry: &'a SchemaRegistry) -> Self {
        Self {
            settings,
            payloads: PayloadSynthesizer::new(registry),
        }
    }

    pub fn synthesize(&self, endpoint: &CategorizedEndpoint) -> SynthesisOutput {
        let mut builder = Builder {
            endpoint,
            auth: BTreeMap::from([(
                self.settings.auth_header.clone(),
                self.settings.auth_placeholder.clone(),
            )]),
            scenarios: Vec::new(),
            diagnostics: Vec::new(),
        };
        let method = endpoint.endpoint.method;
        let body_schema = endpoint
            .endpoint
            .request_schema
            .as_ref()
            .filter(|_| method.has_body());
        let success_status = success_status(method);
        let complete =
            body_schema.map(|schema| self.payload(&mut builder, schema, PayloadVariant::Complete));
        let required_query = required_query_params(&endpoint.endpoint.query_params);

        let success = builder.push(
            ScenarioClass::Success,
            "success",
            endpoint.priority,
            success_status.clone(),
        );
        success.payload = complete.clone();
        success.query_params = required_query.clone();

        if let Some(schema) = body_schema {
            self.validation(&mut builder, schema, complete.as_ref());
        }

        let no_auth = builder.push(
            ScenarioClass::Security,
            "no auth",
            Priority::High,
            ExpectedStatus::Code(401),
        );
        no_auth.headers.clear();
        no_auth.payload = complete.clone();
        no_auth.query_params = required_query.clone();
        let invalid_token = builder.push(
            ScenarioClass::Security,
            "invalid token",
            Priority::High,
            ExpectedStatus::AnyOf(vec![401, 403]),
        );
        invalid_token.headers = BTreeMap::from([(
            self.settings.auth_header.clone(),
            self.settings.invalid_token.clone(),
        )]);
        invalid_token.payload = complete.clone();
        invalid_token.query_params = required_query.clone();

        if let Some(schema) = body_schema {
            self.boundary_bodies(&mut builder, schema);
        }
        if !endpoint.endpoint.query_params.is_empty() {
            self.oversized_query(&mut builder, complete.as_ref());
        }

        if !endpoint.endpoint.path_params.is_empty() {
            let path = fill_template(
                &endpoint.endpoint.template_path,
                &self.settings.not_found_id,
            );
            let not_found = builder.push(
                ScenarioClass::NotFound,
                "unknown id",
                Priority::Medium,
                ExpectedStatus::AnyOf(NOT_FOUND_STATUSES.to_vec()),
            );
            not_found.path = path;
            not_found.payload = complete.clone();
            not_found.query_params = required_query.clone();
        }

        let mut limited = success_status.codes();
        limited.push(RATE_LIMITED);
        let label = format!("burst of {} requests", self.settings.burst_requests);
        let rate_limit = builder.push(
            ScenarioClass::RateLimit,
            &label,
            Priority::Low,
            ExpectedStatus::AnyOf(limited),
        );
        rate_limit.payload = complete.clone();
        rate_limit.query_params = required_query.clone();
        rate_limit.burst_requests = Some(self.settings.burst_requests);

        let label = format!("latency under {}ms", self.settings.max_latency_ms);
        let performance = builder.push(
            ScenarioClass::Performance,
            &label,
            Priority::Low,
            success_status,
        );
        performance.payload = complete;
        performance.query_params = required_query;
        performance.max_latency_ms = Some(self.settings.max_latency_ms);

        SynthesisOutput {
            scenarios: EndpointScenarios {
                key: endpoint.endpoint.key(),
                category: endpoint.category.clone(),
                scenarios: builder.scenarios,
            },
            diagnostics: builder.diagnostics,
        }
    }

    fn payload(
        &self,
        builder: &mut Builder<'_>,
        schema: &SchemaNode,
        variant: PayloadVariant,
    ) -> Value {
        let synthesized = self.payloads.synthesize(schema, variant);
        builder.diagnostics.extend(synthesized.diagnostics);
        synthesized.value
    }

    fn validation(
        &self,
        builder: &mut Builder<'_>,
        schema: &SchemaNode,
        complete: Option<&Value>,
    ) {
        let invalid = || ExpectedStatus::AnyOf(VALIDATION_STATUSES.to_vec());
        let empty = self.payload(builder, schema, PayloadVariant::Empty);
        builder
            .push(ScenarioClass::Validation, "empty body", Priority::Medium, invalid())
            .payload = Some(empty);

        let wrong_types = self.payload(builder, schema, PayloadVariant::InvalidTypes);
        builder
            .push(
                ScenarioClass::Validation,
                "invalid types",
                Priority::Medium,
                invalid(),
            )
            .payload = Some(wrong_types);

        let Some(field) = self.payloads.required_fields(schema).into_iter().next() else {
            return;
        };
        let Some(Value::Object(complete)) = complete else {
            return;
        };
        let mut without = complete.clone();
        without.remove(&field);
        let label = format!("missing required field {field}");
        builder
            .push(ScenarioClass::Validation, &label, Priority::Medium, invalid())
            .payload = Some(Value::Object(without));
    }

    fn boundary_bodies(&self, builder: &mut Builder<'_>, schema: &SchemaNode) {
        let mut variants: Vec<(String, PayloadVariant)> = self
            .settings
            .oversized_lengths
            .iter()
            .map(|len| {
                (
                    format!("oversized strings ({len})"),
                    PayloadVariant::Oversized(*len),
                )
            })
            .collect();
        variants.push((
            format!("large arrays ({})", self.settings.large_array_len),
            PayloadVariant::LargeArray(self.settings.large_array_len),
        ));
        variants.push(("unicode strings".to_string(), PayloadVariant::Unicode));
        variants.push(("null optional fields".to_string(), PayloadVariant::NullFilled));

        for (label, variant) in variants {
            let payload = self.payload(builder, schema, variant);
            let status = self.boundary_status();
            builder
                .push(ScenarioClass::Boundary, &label, Priority::Low, status)
                .payload = Some(payload);
        }
    }

    fn oversized_query(&self, builder: &mut Builder<'_>, complete: Option<&Value>) {
        let len = self.settings.oversized_lengths.iter().copied().max().unwrap_or(0);
        let query: BTreeMap<String, Value> = builder
            .endpoint
            .endpoint
            .query_params
            .iter()
            .map(|param| (param.name.clone(), Value::String("x".repeat(len))))
            .collect();
        let status = self.boundary_status();
        let scenario = builder.push(
            ScenarioClass::Boundary,
            "oversized query string",
            Priority::Low,
            status,
        );
        scenario.query_params = query;
        scenario.payload = complete.cloned();
    }

    fn boundary_status(&self) -> ExpectedStatus {
        ExpectedStatus::AnyOf(self.settings.boundary_statuses.clone())
    }
}

pub fn success_status(method: HttpMethod) -> ExpectedStatus {
    match method {
        HttpMethod::Post => ExpectedStatus::Code(201),
        HttpMethod::Delete => ExpectedStatus::AnyOf(vec![200, 202, 204]),
        HttpMethod::Options => ExpectedStatus::AnyOf(vec![200, 204]),
        HttpMethod::Get | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Head => {
            ExpectedStatus::Code(200)
        }
    }
}

fn required_query_params(params: &[Param]) -> BTreeMap<String, Value> {
    params
        .iter()
        .filter(|param| param.required)
        .map(|param| (param.name.clone(), query_example(param.inferred_type)))
        .collect()
}

fn query_example(ty: PrimitiveType) -> Value {
    match ty {
        PrimitiveType::Integer | PrimitiveType::Number => json!(1),
        PrimitiveType::Boolean => json!(true),
        _ => json!("example"),
    }
}

#[cfg(test)]
mod tests;
