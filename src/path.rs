//! Canonical path keys.
//!
//! Spec paths, collection URLs and corpus call sites all spell parameters
//! differently (`{id}`, `:id`, `{{id}}`, `${id}`, a literal `999999`). Every
//! one of them collapses to [`PLACEHOLDER`] so that matching only depends on
//! the positional shape of the path.
use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const PLACEHOLDER: &str = "{param}";

fn param_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([\w.\-]+)\s*\}\}|\$\{([^}]*)\}|\{([\w.\-]+)\}")
            .expect("param token regex")
    })
}

fn leading_host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\{\{[^}]*\}\}|\$\{[^}]*\})").expect("host token regex"))
}

fn any_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}/]+\}").expect("template param regex"))
}

/// Canonicalize a path or URL for matching.
///
/// Strips scheme/host/query, collapses slashes, drops the trailing slash and
/// rewrites every parameter-like segment to `{param}`. Idempotent.
pub fn normalize(raw: &str) -> String {
    let segments: Vec<String> = path_portion(raw)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(canonical_segment)
        .collect();
    join_segments(&segments)
}

/// Number of non-empty segments in the canonical form of `raw`.
pub fn segment_count(raw: &str) -> usize {
    let normalized = normalize(raw);
    normalized.split('/').filter(|s| !s.is_empty()).count()
}

/// Two paths match iff their canonical forms are identical and have the same
/// number of segments.
pub fn paths_match(left: &str, right: &str) -> bool {
    normalize(left) == normalize(right) && segment_count(left) == segment_count(right)
}

/// Rewrite parameter tokens to `{name}` and return the names in order of
/// first appearance.
pub fn template_params(raw: &str) -> (String, Vec<String>) {
    let mut names: Vec<String> = Vec::new();
    let mut segments = Vec::new();
    for segment in path_portion(raw).split('/').filter(|s| !s.is_empty()) {
        let braced = match colon_param(segment) {
            Some((name, suffix)) => format!("{{{name}}}{suffix}"),
            None => segment.to_string(),
        };
        let rewritten = param_token_regex().replace_all(&braced, |caps: &Captures<'_>| {
            let name = token_name(caps);
            push_unique(&mut names, &name);
            format!("{{{name}}}")
        });
        segments.push(rewritten.into_owned());
    }
    (join_segments(&segments), names)
}

/// Replace every `{name}` in a template path with `value`.
pub fn fill_template(template_path: &str, value: &str) -> String {
    any_param_regex()
        .replace_all(template_path, value.replace('$', "$$").as_str())
        .into_owned()
}

/// One operand of a string-concatenated URL in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPart {
    Literal(String),
    Expr(String),
}

/// Join concatenation operands into a path string.
///
/// Non-literal operands are unresolved placeholders, so `'/domains/' + id`
/// becomes `/domains/{param}` instead of `/domains/` (which would lose the
/// segment once slashes are collapsed). A leading expression directly
/// followed by an absolute literal is a base URL and is dropped.
pub fn join_concatenation(parts: &[UrlPart]) -> String {
    let mut joined = String::new();
    for (idx, part) in parts.iter().enumerate() {
        match part {
            UrlPart::Literal(text) => joined.push_str(text),
            UrlPart::Expr(_) => {
                let base_url = idx == 0
                    && matches!(parts.get(1), Some(UrlPart::Literal(next)) if next.starts_with('/'));
                if !base_url {
                    joined.push_str(PLACEHOLDER);
                }
            }
        }
    }
    joined
}

fn path_portion(raw: &str) -> &str {
    let mut rest = raw.trim();
    if let Some(idx) = rest.find(['?', '#']) {
        rest = &rest[..idx];
    }
    let first_slash = rest.find('/');
    if let Some(idx) = rest.find("://") {
        let scheme_first = match first_slash {
            Some(slash) => idx < slash,
            None => true,
        };
        if scheme_first {
            let after = &rest[idx + 3..];
            return after.find('/').map_or("", |slash| &after[slash..]);
        }
    }
    if !rest.starts_with('/') {
        if let Some(host) = leading_host_regex().find(rest) {
            let after = &rest[host.end()..];
            if after.is_empty() || after.starts_with('/') {
                return after;
            }
        }
    }
    rest
}

fn canonical_segment(segment: &str) -> String {
    if is_concrete_id(segment) {
        return PLACEHOLDER.to_string();
    }
    let mut current = match colon_param(segment) {
        Some((_, suffix)) => format!("{PLACEHOLDER}{suffix}"),
        None => segment.to_string(),
    };
    // Nested braces (`{{{id}}}`) only collapse one layer per pass.
    loop {
        let next = param_token_regex()
            .replace_all(&current, PLACEHOLDER)
            .into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

fn join_segments(segments: &[String]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

/// `:name` at the start of a segment, split into the name and whatever
/// non-word suffix follows it (`:file.json` -> `("file", ".json")`).
fn colon_param(segment: &str) -> Option<(&str, &str)> {
    let rest = segment.strip_prefix(':')?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest.split_at(end))
}

fn token_name(caps: &Captures<'_>) -> String {
    if let Some(name) = caps.get(1).or_else(|| caps.get(3)) {
        return name.as_str().to_string();
    }
    // `${expr}`: keep the last identifier of the expression.
    let expr = caps.get(2).map_or("", |m| m.as_str());
    let ident: String = expr
        .rsplit(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find(|part| !part.is_empty())
        .unwrap_or("")
        .to_string();
    if ident.is_empty() {
        "param".to_string()
    } else {
        ident
    }
}

fn is_concrete_id(segment: &str) -> bool {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    is_uuid(segment)
}

fn is_uuid(segment: &str) -> bool {
    let groups: Vec<&str> = segment.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}
