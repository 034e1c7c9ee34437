//! Normalized endpoint records.
//!
//! An [`Endpoint`] is built once by the extractor and never mutated; every
//! later stage keys it by [`EndpointKey`].
use crate::path;
use crate::schema::SchemaNode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Methods whose requests carry a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl PrimitiveType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "integer" | "int" | "int32" | "int64" => Some(Self::Integer),
            "number" | "float" | "double" => Some(Self::Number),
            "boolean" | "bool" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn of_value(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(number) if number.is_i64() || number.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub location: ParamLocation,
    pub inferred_type: PrimitiveType,
    pub required: bool,
}

impl Param {
    pub fn path(name: impl Into<String>, inferred_type: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            location: ParamLocation::Path,
            inferred_type,
            required: true,
        }
    }
}

/// Identity of an endpoint: method plus canonical path.
///
/// Serialized as `"GET /domains/{param}"` so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EndpointKey {
    pub method: HttpMethod,
    pub path: String,
}

impl EndpointKey {
    /// Build a key, normalizing `raw_path` on the way in.
    pub fn new(method: HttpMethod, raw_path: &str) -> Self {
        Self {
            method,
            path: path::normalize(raw_path),
        }
    }

    /// Parse `"<METHOD> <path>"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (method, path) = raw.trim().split_once(char::is_whitespace)?;
        let method = HttpMethod::parse(method)?;
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        Some(Self::new(method, path))
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl From<EndpointKey> for String {
    fn from(key: EndpointKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for EndpointKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid endpoint key {value:?}"))
    }
}

/// One (method, path) operation from the API surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub raw_path: String,
    pub normalized_path: String,
    /// Path with parameters spelled `{name}`, for runners that substitute values.
    pub template_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl Endpoint {
    /// Minimal endpoint for `method raw_path`; extractors fill in the rest.
    pub fn new(method: HttpMethod, raw_path: &str) -> Self {
        let (template_path, names) = path::template_params(raw_path);
        Self {
            method,
            raw_path: raw_path.to_string(),
            normalized_path: path::normalize(raw_path),
            template_path,
            path_params: names
                .into_iter()
                .map(|name| Param::path(name, PrimitiveType::String))
                .collect(),
            query_params: Vec::new(),
            header_params: Vec::new(),
            request_schema: None,
            tags: Vec::new(),
            source_category: None,
            name: None,
            deprecated: false,
        }
    }

    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            method: self.method,
            path: self.normalized_path.clone(),
        }
    }

    /// Human label used for keyword bonuses: the declared name, else the path.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.normalized_path)
    }
}
