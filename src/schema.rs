//! Request schema model.
//!
//! [`SchemaNode`] is built either from an OpenAPI schema object or inferred
//! from a raw JSON example. Named schemas stay behind [`SchemaNode::Ref`] and
//! are looked up in a [`SchemaRegistry`] during synthesis, which is where
//! cycles are caught.
use crate::endpoint::PrimitiveType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    Object {
        props: BTreeMap<String, SchemaNode>,
        /// Required property names in declaration order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
    },
    Array {
        item: Box<SchemaNode>,
    },
    Scalar {
        #[serde(rename = "type")]
        ty: PrimitiveType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enum_values: Vec<Value>,
    },
    Ref {
        id: String,
    },
    /// `allOf` whose members reach other named schemas; merged during
    /// synthesis once the registry is available.
    AllOf {
        members: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    pub fn scalar(ty: PrimitiveType) -> Self {
        Self::Scalar {
            ty,
            example: None,
            format: None,
            enum_values: Vec::new(),
        }
    }
}

/// Named schemas from `components.schemas` (or Swagger 2 `definitions`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SchemaNode>,
}

impl SchemaRegistry {
    pub fn get(&self, id: &str) -> Option<&SchemaNode> {
        self.schemas.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, node: SchemaNode) {
        self.schemas.insert(id.into(), node);
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Collect named schemas from an OpenAPI 3 or Swagger 2 document root.
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let mut registry = Self::default();
        let sources = [
            doc.get("components")
                .and_then(|components| components.get("schemas")),
            doc.get("definitions"),
        ];
        for schemas in sources.into_iter().flatten() {
            let Some(schemas) = schemas.as_object() else {
                continue;
            };
            for (name, schema) in schemas {
                registry.insert(name.clone(), schema_from_openapi(schema));
            }
        }
        registry
    }
}

/// Convert an OpenAPI schema object into a [`SchemaNode`].
///
/// `$ref`s become [`SchemaNode::Ref`]; `oneOf`/`anyOf` take their first
/// alternative; `allOf` merges its inline object members, or stays an
/// [`SchemaNode::AllOf`] when a member is a reference.
pub fn schema_from_openapi(value: &Value) -> SchemaNode {
    let Some(obj) = value.as_object() else {
        return SchemaNode::scalar(PrimitiveType::String);
    };
    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        return SchemaNode::Ref {
            id: ref_id(reference),
        };
    }
    for key in ["oneOf", "anyOf"] {
        if let Some(first) = obj
            .get(key)
            .and_then(Value::as_array)
            .and_then(|alts| alts.first())
        {
            return schema_from_openapi(first);
        }
    }
    if let Some(members) = obj.get("allOf").and_then(Value::as_array) {
        return merge_all_of(members);
    }

    match declared_type(obj) {
        Some(PrimitiveType::Object) => object_from_openapi(obj),
        Some(PrimitiveType::Array) => SchemaNode::Array {
            item: Box::new(
                obj.get("items")
                    .map(schema_from_openapi)
                    .unwrap_or_else(|| SchemaNode::scalar(PrimitiveType::String)),
            ),
        },
        Some(ty) => scalar_from_openapi(obj, ty),
        None if obj.contains_key("properties") => object_from_openapi(obj),
        None if obj.contains_key("items") => SchemaNode::Array {
            item: Box::new(obj.get("items").map(schema_from_openapi).unwrap_or_else(|| {
                SchemaNode::scalar(PrimitiveType::String)
            })),
        },
        None => {
            let ty = obj
                .get("example")
                .or_else(|| obj.get("enum").and_then(|values| values.get(0)))
                .map(PrimitiveType::of_value)
                .unwrap_or(PrimitiveType::String);
            scalar_from_openapi(obj, ty)
        }
    }
}

/// Infer a schema from a raw JSON example. Every present key is required.
pub fn schema_from_example(value: &Value) -> SchemaNode {
    match value {
        Value::Object(map) => SchemaNode::Object {
            props: map
                .iter()
                .map(|(key, child)| (key.clone(), schema_from_example(child)))
                .collect(),
            required: map.keys().cloned().collect(),
        },
        Value::Array(items) => SchemaNode::Array {
            item: Box::new(
                items
                    .first()
                    .map(schema_from_example)
                    .unwrap_or_else(|| SchemaNode::scalar(PrimitiveType::String)),
            ),
        },
        scalar => SchemaNode::Scalar {
            ty: PrimitiveType::of_value(scalar),
            example: Some(scalar.clone()),
            format: None,
            enum_values: Vec::new(),
        },
    }
}

/// `#/components/schemas/Domain` -> `Domain`; other pointers are kept whole.
pub fn ref_id(reference: &str) -> String {
    reference
        .strip_prefix(COMPONENT_SCHEMA_PREFIX)
        .or_else(|| reference.strip_prefix(DEFINITIONS_PREFIX))
        .unwrap_or(reference)
        .to_string()
}

fn declared_type(obj: &Map<String, Value>) -> Option<PrimitiveType> {
    match obj.get("type")? {
        Value::String(raw) => PrimitiveType::parse(raw),
        // OpenAPI 3.1 allows `["string", "null"]`.
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .filter_map(PrimitiveType::parse)
            .find(|ty| *ty != PrimitiveType::Null),
        _ => None,
    }
}

fn object_from_openapi(obj: &Map<String, Value>) -> SchemaNode {
    let props = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), schema_from_openapi(schema)))
                .collect()
        })
        .unwrap_or_default();
    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    SchemaNode::Object { props, required }
}

fn scalar_from_openapi(obj: &Map<String, Value>, ty: PrimitiveType) -> SchemaNode {
    let example = obj
        .get("example")
        .or_else(|| {
            obj.get("examples")
                .and_then(Value::as_array)
                .and_then(|examples| examples.first())
        })
        .or_else(|| obj.get("default"))
        .filter(|value| !value.is_null())
        .cloned();
    SchemaNode::Scalar {
        ty,
        example,
        format: obj
            .get("format")
            .and_then(Value::as_str)
            .map(str::to_string),
        enum_values: obj
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn merge_all_of(members: &[Value]) -> SchemaNode {
    let converted: Vec<SchemaNode> = members.iter().map(schema_from_openapi).collect();
    if converted
        .iter()
        .any(|node| matches!(node, SchemaNode::Ref { .. } | SchemaNode::AllOf { .. }))
    {
        return SchemaNode::AllOf { members: converted };
    }
    let mut merged_props = BTreeMap::new();
    let mut merged_required: Vec<String> = Vec::new();
    let mut saw_object = false;
    for node in &converted {
        if let SchemaNode::Object { props, required } = node {
            saw_object = true;
            merged_props.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
            for name in required {
                if !merged_required.contains(name) {
                    merged_required.push(name.clone());
                }
            }
        }
    }
    if saw_object {
        return SchemaNode::Object {
            props: merged_props,
            required: merged_required,
        };
    }
    converted
        .into_iter()
        .next()
        .unwrap_or_else(|| SchemaNode::scalar(PrimitiveType::String))
}
