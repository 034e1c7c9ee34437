//! Concrete payload variants from a request schema.
//!
//! Every variant is a pure function of the schema, the registry and the
//! variant parameters: no clocks, no randomness, so two runs produce
//! byte-identical JSON.
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::endpoint::PrimitiveType;
use crate::schema::{SchemaNode, SchemaRegistry};
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;

const UNICODE_SAMPLE: &str = "Ünïcødé テスト 测试 🚀 ñandú";
const OVERSIZED_CHAR: char = 'x';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVariant {
    /// Required fields only, each with the smallest valid value.
    Minimal,
    /// Every field with a representative value; explicit examples win.
    Complete,
    /// Every scalar swapped for an incompatible primitive type.
    InvalidTypes,
    /// Complete, with every string repeated to the given length.
    Oversized(usize),
    /// Complete, with each outermost array holding the given number of items.
    /// Nested arrays keep a single item.
    LargeArray(usize),
    Unicode,
    /// Required fields filled, optional fields explicitly null.
    NullFilled,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub value: Value,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct PayloadSynthesizer<'a> {
    registry: &'a SchemaRegistry,
}

struct Walk {
    variant: PayloadVariant,
    /// Ref ids currently being expanded, innermost last.
    visiting: Vec<String>,
    /// Arrays currently being expanded.
    array_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Walk {
    fn new(variant: PayloadVariant) -> Self {
        Self {
            variant,
            visiting: Vec::new(),
            array_depth: 0,
            diagnostics: Vec::new(),
        }
    }
}

/// Object fields gathered from every `allOf` member.
#[derive(Default)]
struct MergedObject {
    props: BTreeMap<String, SchemaNode>,
    required: Vec<String>,
    /// Ref ids expanded to reach the members.
    via: Vec<String>,
    saw_object: bool,
}

impl<'a> PayloadSynthesizer<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn synthesize(&self, schema: &SchemaNode, variant: PayloadVariant) -> Synthesized {
        let mut walk = Walk::new(variant);
        let value = if variant == PayloadVariant::Empty {
            self.empty_value(schema, &mut walk)
        } else {
            self.build(schema, None, &mut walk)
        };
        Synthesized {
            value,
            diagnostics: walk.diagnostics,
        }
    }

    /// Required field names of the resolved root object.
    pub fn required_fields(&self, schema: &SchemaNode) -> Vec<String> {
        match self.resolve_shallow(schema) {
            Some(SchemaNode::Object { required, .. }) => required.clone(),
            Some(SchemaNode::AllOf { members }) => {
                let mut walk = Walk::new(PayloadVariant::Complete);
                self.merge_all_of(members, &mut walk)
                    .map(|merged| merged.required)
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    fn resolve_shallow<'s>(&'s self, schema: &'s SchemaNode) -> Option<&'s SchemaNode> {
        let mut current = schema;
        let mut seen: Vec<&str> = Vec::new();
        while let SchemaNode::Ref { id } = current {
            if seen.contains(&id.as_str()) {
                return None;
            }
            seen.push(id);
            current = self.registry.get(id)?;
        }
        Some(current)
    }

    fn empty_value(&self, schema: &SchemaNode, walk: &mut Walk) -> Value {
        match self.resolve_shallow(schema) {
            Some(SchemaNode::Object { .. }) => Value::Object(Map::new()),
            Some(SchemaNode::Array { .. }) => Value::Array(Vec::new()),
            Some(SchemaNode::Scalar { ty, .. }) => empty_scalar(*ty),
            Some(SchemaNode::AllOf { members })
                if self
                    .merge_all_of(members, &mut Walk::new(walk.variant))
                    .is_some() =>
            {
                Value::Object(Map::new())
            }
            Some(SchemaNode::Ref { .. } | SchemaNode::AllOf { .. }) | None => {
                // Route through build so the cycle/missing diagnostic is recorded.
                self.build(schema, None, walk)
            }
        }
    }

    fn build(&self, node: &SchemaNode, field: Option<&str>, walk: &mut Walk) -> Value {
        match node {
            SchemaNode::Ref { id } => self.build_ref(id, field, walk),
            SchemaNode::Object { props, required } => {
                let mut out = Map::new();
                for (name, child) in props {
                    let is_required = required.iter().any(|r| r == name);
                    match walk.variant {
                        PayloadVariant::Minimal if !is_required => continue,
                        PayloadVariant::NullFilled if !is_required => {
                            out.insert(name.clone(), Value::Null);
                            continue;
                        }
                        _ => {}
                    }
                    out.insert(name.clone(), self.build(child, Some(name), walk));
                }
                Value::Object(out)
            }
            SchemaNode::Array { item } => {
                let count = match walk.variant {
                    PayloadVariant::LargeArray(count) if walk.array_depth == 0 => count,
                    _ => 1,
                };
                walk.array_depth += 1;
                let element = self.build(item, field, walk);
                walk.array_depth -= 1;
                Value::Array(vec![element; count])
            }
            SchemaNode::AllOf { members } => self.build_all_of(members, field, walk),
            SchemaNode::Scalar {
                ty,
                example,
                format,
                enum_values,
            } => scalar_value(
                walk.variant,
                *ty,
                example.as_ref(),
                format.as_deref(),
                enum_values,
                field,
            ),
        }
    }

    fn build_ref(&self, id: &str, field: Option<&str>, walk: &mut Walk) -> Value {
        let Some(target) = self.enter_ref(id, walk) else {
            return ref_placeholder(id);
        };
        walk.visiting.push(id.to_string());
        let value = self.build(target, field, walk);
        walk.visiting.pop();
        value
    }

    /// Registry target of `id`, or `None` (with a diagnostic) when following
    /// it would loop or it is not defined.
    fn enter_ref(&self, id: &str, walk: &mut Walk) -> Option<&'a SchemaNode> {
        if walk.visiting.iter().any(|visiting| visiting == id) {
            let chain = format!("{} -> {id}", walk.visiting.join(" -> "));
            walk.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnresolvableSchemaCycle,
                id,
                format!("schema cycle {chain}; substituted placeholder"),
            ));
            return None;
        }
        let target = self.registry.get(id);
        if target.is_none() {
            walk.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnresolvedSchemaRef,
                id,
                "schema reference not defined; substituted placeholder",
            ));
        }
        target
    }

    fn build_all_of(
        &self,
        members: &[SchemaNode],
        field: Option<&str>,
        walk: &mut Walk,
    ) -> Value {
        let Some(merged) = self.merge_all_of(members, walk) else {
            return match members.first() {
                Some(first) => self.build(first, field, walk),
                None => Value::Object(Map::new()),
            };
        };
        let depth = walk.visiting.len();
        walk.visiting.extend(merged.via);
        let object = SchemaNode::Object {
            props: merged.props,
            required: merged.required,
        };
        let value = self.build(&object, field, walk);
        walk.visiting.truncate(depth);
        value
    }

    /// Merge the object members of an `allOf`, following refs. `None` when no
    /// member resolves to an object; diagnostics from the attempt are dropped
    /// so the caller's fallback reports them once.
    fn merge_all_of(&self, members: &[SchemaNode], walk: &mut Walk) -> Option<MergedObject> {
        let reported = walk.diagnostics.len();
        let mut merged = MergedObject::default();
        self.collect_members(members, walk, &mut merged);
        if !merged.saw_object {
            walk.diagnostics.truncate(reported);
            return None;
        }
        Some(merged)
    }

    fn collect_members(
        &self,
        members: &[SchemaNode],
        walk: &mut Walk,
        merged: &mut MergedObject,
    ) {
        for member in members {
            match member {
                SchemaNode::Object { props, required } => {
                    merged.saw_object = true;
                    merged
                        .props
                        .extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                    for name in required {
                        if !merged.required.contains(name) {
                            merged.required.push(name.clone());
                        }
                    }
                }
                SchemaNode::AllOf { members } => self.collect_members(members, walk, merged),
                SchemaNode::Ref { id } => {
                    let Some(target) = self.enter_ref(id, walk) else {
                        continue;
                    };
                    walk.visiting.push(id.clone());
                    if !merged.via.contains(id) {
                        merged.via.push(id.clone());
                    }
                    self.collect_members(std::slice::from_ref(target), walk, merged);
                    walk.visiting.pop();
                }
                SchemaNode::Array { .. } | SchemaNode::Scalar { .. } => {}
            }
        }
    }
}

fn ref_placeholder(id: &str) -> Value {
    Value::String(format!("<ref:{id}>"))
}

fn empty_scalar(ty: PrimitiveType) -> Value {
    match ty {
        PrimitiveType::String => json!(""),
        PrimitiveType::Integer | PrimitiveType::Number => json!(0),
        PrimitiveType::Boolean => json!(false),
        PrimitiveType::Object => json!({}),
        PrimitiveType::Array => json!([]),
        PrimitiveType::Null => Value::Null,
    }
}

fn scalar_value(
    variant: PayloadVariant,
    ty: PrimitiveType,
    example: Option<&Value>,
    format: Option<&str>,
    enum_values: &[Value],
    field: Option<&str>,
) -> Value {
    match variant {
        PayloadVariant::InvalidTypes => return incompatible_value(ty),
        PayloadVariant::Oversized(len) if ty == PrimitiveType::String => {
            return Value::String(OVERSIZED_CHAR.to_string().repeat(len));
        }
        PayloadVariant::Unicode if ty == PrimitiveType::String => {
            return Value::String(UNICODE_SAMPLE.to_string());
        }
        _ => {}
    }
    if let Some(example) = example {
        return example.clone();
    }
    if let Some(first) = enum_values.first() {
        return first.clone();
    }
    if let Some(sample) = format.and_then(format_sample) {
        return Value::String(sample.to_string());
    }
    if variant == PayloadVariant::Minimal {
        return minimal_scalar(ty);
    }
    representative_scalar(ty, field)
}

fn minimal_scalar(ty: PrimitiveType) -> Value {
    match ty {
        PrimitiveType::String => json!("a"),
        PrimitiveType::Integer => json!(0),
        PrimitiveType::Number => json!(0),
        PrimitiveType::Boolean => json!(false),
        PrimitiveType::Object => json!({}),
        PrimitiveType::Array => json!([]),
        PrimitiveType::Null => Value::Null,
    }
}

fn representative_scalar(ty: PrimitiveType, field: Option<&str>) -> Value {
    match ty {
        PrimitiveType::String => match field {
            Some(name) => Value::String(format!("{name}_example")),
            None => json!("example"),
        },
        PrimitiveType::Integer => json!(1),
        PrimitiveType::Number => Number::from_f64(1.5).map_or(json!(1), Value::Number),
        PrimitiveType::Boolean => json!(true),
        PrimitiveType::Object => json!({}),
        PrimitiveType::Array => json!([]),
        PrimitiveType::Null => Value::Null,
    }
}

/// string -> number, number -> string, boolean -> string.
fn incompatible_value(ty: PrimitiveType) -> Value {
    match ty {
        PrimitiveType::String => json!(12345),
        PrimitiveType::Integer | PrimitiveType::Number => json!("not-a-number"),
        PrimitiveType::Boolean => json!("not-a-boolean"),
        PrimitiveType::Object | PrimitiveType::Array => json!("not-a-structure"),
        PrimitiveType::Null => json!(true),
    }
}

fn format_sample(format: &str) -> Option<&'static str> {
    let sample = match format {
        "email" => "user@example.com",
        "uuid" => "00000000-0000-4000-8000-000000000000",
        "date-time" => "2024-01-01T00:00:00Z",
        "date" => "2024-01-01",
        "uri" | "url" => "https://example.com",
        "hostname" => "example.com",
        "ipv4" => "192.0.2.1",
        "ipv6" => "2001:db8::1",
        _ => return None,
    };
    Some(sample)
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
