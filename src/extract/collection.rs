//! Postman-style collection walker.
//!
//! Folders nest through `item`; a leaf carries a `request` that is either a
//! bare URL string or an object with `method`, `url`, `header` and `body`.
use super::{is_parsable_url, skip_node, value_kind, Extraction, SpecFormat};
use crate::endpoint::{Endpoint, HttpMethod, Param, ParamLocation, PrimitiveType};
use crate::schema::schema_from_example;
use serde_json::{Map, Value};

pub(super) fn extract(items: &Value) -> Extraction {
    let mut extraction = Extraction::empty(SpecFormat::Collection);
    let mut folders = Vec::new();
    walk(items, "item", &mut folders, &mut extraction);
    extraction
}

fn walk(items: &Value, subject: &str, folders: &mut Vec<String>, extraction: &mut Extraction) {
    let Some(items) = items.as_array() else {
        skip_node(
            &mut extraction.diagnostics,
            subject,
            format!("`item` is a {}, not an array", value_kind(items)),
        );
        return;
    };
    for (idx, node) in items.iter().enumerate() {
        let node_subject = format!("{subject}[{idx}]");
        let Some(obj) = node.as_object() else {
            skip_node(&mut extraction.diagnostics, node_subject, "item is not an object");
            continue;
        };
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty());

        if let Some(children) = obj.get("item") {
            let named = name.is_some();
            if let Some(name) = name {
                folders.push(name.to_string());
            }
            walk(children, &format!("{node_subject}.item"), folders, extraction);
            if named {
                folders.pop();
            }
            continue;
        }

        let Some(request) = obj.get("request") else {
            skip_node(
                &mut extraction.diagnostics,
                node_subject,
                "item has neither `item` nor `request`",
            );
            continue;
        };
        match leaf_endpoint(request, name, folders) {
            Ok(endpoint) => extraction.endpoints.push(endpoint),
            Err(reason) => skip_node(&mut extraction.diagnostics, node_subject, reason),
        }
    }
}

fn leaf_endpoint(
    request: &Value,
    name: Option<&str>,
    folders: &[String],
) -> Result<Endpoint, String> {
    let (method, request_obj, url) = match request {
        Value::String(url) => (HttpMethod::Get, None, request_url_text(url)?),
        Value::Object(req) => {
            let raw_method = req
                .get("method")
                .and_then(Value::as_str)
                .ok_or("request has no method")?;
            let method = HttpMethod::parse(raw_method)
                .ok_or_else(|| format!("unsupported method `{raw_method}`"))?;
            let url = req.get("url").ok_or("request has no url")?;
            (method, Some(req), request_url(url)?)
        }
        other => return Err(format!("request is a {}", value_kind(other))),
    };

    let mut endpoint = Endpoint::new(method, &url.text);
    endpoint.name = name.map(str::to_string);
    endpoint.source_category = folders.last().cloned();
    endpoint.query_params = url.query;
    for param in &mut endpoint.path_params {
        if let Some(example) = url.variables.get(&param.name) {
            param.inferred_type = infer_text_type(example);
        }
    }
    if let Some(req) = request_obj {
        endpoint.header_params = header_params(req);
        endpoint.request_schema = raw_json_body(req).map(|body| schema_from_example(&body));
    }
    Ok(endpoint)
}

struct RequestUrl {
    text: String,
    query: Vec<Param>,
    variables: Map<String, Value>,
}

fn request_url_text(raw: &str) -> Result<RequestUrl, String> {
    if !is_parsable_url(raw) {
        return Err(format!("unparsable url {raw:?}"));
    }
    Ok(RequestUrl {
        text: raw.trim().to_string(),
        query: query_from_text(raw),
        variables: Map::new(),
    })
}

fn request_url(url: &Value) -> Result<RequestUrl, String> {
    let obj = match url {
        Value::String(raw) => return request_url_text(raw),
        Value::Object(obj) => obj,
        other => return Err(format!("url is a {}", value_kind(other))),
    };

    let raw = obj
        .get("raw")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|raw| !raw.is_empty());
    let text = match (raw, obj.get("path").and_then(Value::as_array)) {
        (Some(raw), _) => raw.to_string(),
        (None, Some(segments)) => {
            let segments: Vec<&str> = segments
                .iter()
                .filter_map(|segment| {
                    segment
                        .as_str()
                        .or_else(|| segment.get("value").and_then(Value::as_str))
                })
                .collect();
            format!("/{}", segments.join("/"))
        }
        (None, None) => return Err("url has neither `raw` nor `path`".to_string()),
    };
    if !is_parsable_url(&text) {
        return Err(format!("unparsable url {text:?}"));
    }

    let query = match obj.get("query").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .filter(|entry| !entry.get("disabled").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|entry| {
                let key = entry.get("key").and_then(Value::as_str)?;
                let value = entry.get("value").and_then(Value::as_str).unwrap_or("");
                Some(query_param(key, value))
            })
            .collect(),
        None => query_from_text(&text),
    };
    let variables = obj
        .get("variable")
        .and_then(Value::as_array)
        .map(|vars| {
            vars.iter()
                .filter_map(|var| {
                    let key = var.get("key").and_then(Value::as_str)?;
                    Some((key.to_string(), var.get("value").cloned().unwrap_or(Value::Null)))
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(RequestUrl {
        text,
        query,
        variables,
    })
}

fn query_from_text(raw: &str) -> Vec<Param> {
    let Some((_, query)) = raw.split_once('?') else {
        return Vec::new();
    };
    let query = query.split('#').next().unwrap_or("");
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            query_param(key, value)
        })
        .collect()
}

fn query_param(key: &str, value: &str) -> Param {
    Param {
        name: key.to_string(),
        location: ParamLocation::Query,
        inferred_type: infer_text_type(&Value::String(value.to_string())),
        required: false,
    }
}

fn header_params(req: &Map<String, Value>) -> Vec<Param> {
    req.get("header")
        .and_then(Value::as_array)
        .map(|headers| {
            headers
                .iter()
                .filter(|h| !h.get("disabled").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|h| h.get("key").and_then(Value::as_str))
                .map(|key| Param {
                    name: key.to_string(),
                    location: ParamLocation::Header,
                    inferred_type: PrimitiveType::String,
                    required: false,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn raw_json_body(req: &Map<String, Value>) -> Option<Value> {
    let body = req.get("body")?;
    if body.get("mode").and_then(Value::as_str) != Some("raw") {
        return None;
    }
    let raw = body.get("raw")?.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_object() || value.is_array() => Some(value),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "request body is not JSON; no schema inferred");
            None
        }
    }
}

/// Guess a primitive type from a collection example value.
fn infer_text_type(value: &Value) -> PrimitiveType {
    let Some(text) = value.as_str() else {
        return PrimitiveType::of_value(value);
    };
    let text = text.trim();
    if !text.is_empty() && text.parse::<i64>().is_ok() {
        PrimitiveType::Integer
    } else if text.parse::<f64>().is_ok() && text.contains('.') {
        PrimitiveType::Number
    } else if text == "true" || text == "false" {
        PrimitiveType::Boolean
    } else {
        PrimitiveType::String
    }
}
