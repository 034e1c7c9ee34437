//! OpenAPI 3 / Swagger 2 `paths` walker.
use super::{is_parsable_url, skip_node, Extraction, SpecFormat};
use crate::endpoint::{Endpoint, HttpMethod, Param, ParamLocation, PrimitiveType};
use crate::schema::{schema_from_example, schema_from_openapi, SchemaNode, SchemaRegistry};
use serde_json::{Map, Value};

/// Path-item keys that are not operations.
const PATH_ITEM_KEYS: &[&str] = &["parameters", "summary", "description", "servers", "$ref"];
const MAX_REF_HOPS: usize = 8;

pub(super) fn extract(root: &Map<String, Value>) -> Extraction {
    let mut extraction = Extraction::empty(SpecFormat::OpenApi);
    extraction.registry = SchemaRegistry::from_document(root);
    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
        skip_node(&mut extraction.diagnostics, "paths", "`paths` is not an object");
        return extraction;
    };

    for (raw_path, item) in paths {
        let subject = format!("paths.{raw_path}");
        if !is_parsable_url(raw_path) {
            skip_node(&mut extraction.diagnostics, subject, "unparsable path");
            continue;
        }
        let Some(item) = resolve(root, item).and_then(Value::as_object) else {
            skip_node(&mut extraction.diagnostics, subject, "path item is not an object");
            continue;
        };
        let shared = declared_params(root, item.get("parameters"));
        for (key, operation) in item {
            if PATH_ITEM_KEYS.contains(&key.as_str()) || key.starts_with("x-") {
                continue;
            }
            let Some(method) = HttpMethod::parse(key) else {
                skip_node(
                    &mut extraction.diagnostics,
                    format!("{subject}.{key}"),
                    format!("unsupported method `{key}`"),
                );
                continue;
            };
            let Some(operation) = operation.as_object() else {
                skip_node(
                    &mut extraction.diagnostics,
                    format!("{subject}.{key}"),
                    "operation is not an object",
                );
                continue;
            };
            extraction
                .endpoints
                .push(build_endpoint(root, raw_path, method, operation, &shared));
        }
    }
    extraction
}

fn build_endpoint(
    root: &Map<String, Value>,
    raw_path: &str,
    method: HttpMethod,
    operation: &Map<String, Value>,
    shared: &[Param],
) -> Endpoint {
    let mut endpoint = Endpoint::new(method, raw_path);
    let mut params = shared.to_vec();
    for param in declared_params(root, operation.get("parameters")) {
        match params
            .iter_mut()
            .find(|existing| existing.name == param.name && existing.location == param.location)
        {
            Some(existing) => *existing = param,
            None => params.push(param),
        }
    }

    for path_param in &mut endpoint.path_params {
        if let Some(declared) = params.iter().find(|param| {
            param.location == ParamLocation::Path && param.name == path_param.name
        }) {
            path_param.inferred_type = declared.inferred_type;
        }
    }
    endpoint.query_params = params
        .iter()
        .filter(|param| param.location == ParamLocation::Query)
        .cloned()
        .collect();
    endpoint.header_params = params
        .iter()
        .filter(|param| param.location == ParamLocation::Header)
        .cloned()
        .collect();
    endpoint.request_schema = request_schema(root, operation);
    endpoint.tags = operation
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    endpoint.name = ["summary", "operationId"]
        .iter()
        .filter_map(|key| operation.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string);
    endpoint.deprecated = operation
        .get("deprecated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    endpoint.source_category = grouping_name(raw_path);
    endpoint
}

fn declared_params(root: &Map<String, Value>, list: Option<&Value>) -> Vec<Param> {
    let Some(list) = list.and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|value| declared_param(root, value))
        .collect()
}

fn declared_param(root: &Map<String, Value>, value: &Value) -> Option<Param> {
    let obj = resolve(root, value)?.as_object()?;
    let name = obj.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let location = match obj.get("in")?.as_str()? {
        "path" => ParamLocation::Path,
        "query" => ParamLocation::Query,
        "header" => ParamLocation::Header,
        _ => return None,
    };
    let inferred_type = obj
        .get("schema")
        .and_then(|schema| schema.get("type"))
        .or_else(|| obj.get("type"))
        .and_then(Value::as_str)
        .and_then(PrimitiveType::parse)
        .unwrap_or(PrimitiveType::String);
    let required = location == ParamLocation::Path
        || obj.get("required").and_then(Value::as_bool).unwrap_or(false);
    Some(Param {
        name: name.to_string(),
        location,
        inferred_type,
        required,
    })
}

fn request_schema(root: &Map<String, Value>, operation: &Map<String, Value>) -> Option<SchemaNode> {
    if let Some(body) = operation
        .get("requestBody")
        .and_then(|body| resolve(root, body))
    {
        let content = body.get("content")?.as_object()?;
        let media = content
            .get("application/json")
            .or_else(|| {
                content
                    .iter()
                    .find(|(media_type, _)| media_type.contains("json"))
                    .map(|(_, media)| media)
            })
            .or_else(|| content.values().next())?;
        if let Some(schema) = media.get("schema") {
            return Some(schema_from_openapi(schema));
        }
        let example = media.get("example").or_else(|| {
            media
                .get("examples")
                .and_then(Value::as_object)
                .and_then(|examples| examples.values().next())
                .and_then(|example| example.get("value"))
        })?;
        return Some(schema_from_example(example));
    }

    // Swagger 2 keeps the body among the parameters.
    operation
        .get("parameters")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|param| resolve(root, param))
        .find(|param| param.get("in").and_then(Value::as_str) == Some("body"))
        .and_then(|param| param.get("schema"))
        .map(schema_from_openapi)
}

/// Follow local `$ref` pointers (`#/components/parameters/Id`, ...).
fn resolve<'a>(root: &'a Map<String, Value>, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_HOPS {
        let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
            return Some(current);
        };
        current = lookup_pointer(root, reference)?;
    }
    None
}

fn lookup_pointer<'a>(root: &'a Map<String, Value>, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix("#/")?;
    let mut segments = pointer
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"));
    let first = segments.next()?;
    let mut current = root.get(&first)?;
    for segment in segments {
        current = current.get(&segment)?;
    }
    Some(current)
}

/// First literal segment of the path, skipping `api` and version prefixes.
fn grouping_name(raw_path: &str) -> Option<String> {
    raw_path
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .find(|segment| {
            !segment.contains(['{', ':'])
                && !segment.eq_ignore_ascii_case("api")
                && !is_version_segment(segment)
        })
        .map(str::to_string)
}

fn is_version_segment(segment: &str) -> bool {
    let Some(rest) = segment
        .strip_prefix('v')
        .or_else(|| segment.strip_prefix('V'))
    else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
}
