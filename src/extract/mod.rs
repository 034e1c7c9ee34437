//! Endpoint extraction from API description trees.
//!
//! Two shapes are understood: an OpenAPI/Swagger document (`paths` map) and a
//! Postman-style collection (nested `item` arrays). Leaves that cannot be
//! parsed are skipped with a diagnostic; only a root that is not a tree at
//! all fails the run.
mod collection;
mod openapi;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::endpoint::Endpoint;
use crate::error::AnalysisError;
use crate::schema::SchemaRegistry;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecFormat {
    OpenApi,
    Collection,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub format: SpecFormat,
    pub endpoints: Vec<Endpoint>,
    pub registry: SchemaRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    fn empty(format: SpecFormat) -> Self {
        Self {
            format,
            endpoints: Vec::new(),
            registry: SchemaRegistry::default(),
            diagnostics: Vec::new(),
        }
    }
}

/// Walk a spec document into a flat endpoint list.
pub fn extract_endpoints(doc: &Value) -> Result<Extraction, AnalysisError> {
    match doc {
        Value::Object(root) if root.contains_key("paths") => Ok(openapi::extract(root)),
        Value::Object(root) if root.contains_key("item") => match root.get("item") {
            Some(items) => Ok(collection::extract(items)),
            None => Ok(Extraction::empty(SpecFormat::Collection)),
        },
        Value::Array(_) => Ok(collection::extract(doc)),
        Value::Object(_) => {
            let mut extraction = Extraction::empty(SpecFormat::Unknown);
            extraction.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedSpecNode,
                "$",
                "document has neither `paths` nor `item`; no endpoints extracted",
            ));
            tracing::warn!("spec document has neither `paths` nor `item`");
            Ok(extraction)
        }
        other => Err(AnalysisError::InvalidInputShape(format!(
            "expected an object or array at the document root, found {}",
            value_kind(other)
        ))),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Record a skipped leaf and keep walking.
pub(crate) fn skip_node(
    diagnostics: &mut Vec<Diagnostic>,
    subject: impl Into<String>,
    reason: impl Into<String>,
) {
    let subject = subject.into();
    let reason = reason.into();
    tracing::warn!(node = %subject, %reason, "skipping malformed spec node");
    diagnostics.push(Diagnostic::new(
        DiagnosticKind::MalformedSpecNode,
        subject,
        reason,
    ));
}

/// URLs with whitespace inside or nothing left after trimming are not usable.
pub(crate) fn is_parsable_url(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && !trimmed.chars().any(char::is_whitespace)
}
