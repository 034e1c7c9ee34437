//! Call-site extraction from existing test artifacts.
//!
//! This is a pattern matcher, not a parser: it finds request openers with
//! regexes and then reads just enough of the argument list (string, template
//! and `+`-concatenated literals) to recover a method and URL. Anything it
//! cannot read is counted as a parse miss and otherwise ignored.
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::endpoint::{EndpointKey, HttpMethod};
use crate::path::{join_concatenation, UrlPart};
use crate::util::truncate_string;
use regex::Regex;
use serde::Serialize;

const MISS_EXCERPT_BYTES: usize = 120;

/// One test-artifact file handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub source: String,
    pub text: String,
}

/// A recognized request call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusCall {
    pub key: EndpointKey,
    pub raw_url: String,
    pub source: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CorpusExtraction {
    pub calls: Vec<CorpusCall>,
    pub parse_misses: Vec<Diagnostic>,
}

/// Turns corpus text into endpoint call sites.
///
/// The comparator only sees [`EndpointKey`]s, so a real parser can replace
/// [`PatternCorpusExtractor`] without touching coverage logic.
pub trait CorpusKeyExtractor: Send + Sync {
    fn extract(&self, source: &str, text: &str) -> CorpusExtraction;
}

pub struct PatternCorpusExtractor {
    cy_request: Regex,
    fetch: Regex,
    client_call: Regex,
    method_field: Regex,
    method_key: Regex,
    url_key: Regex,
}

impl Default for PatternCorpusExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternCorpusExtractor {
    pub fn new() -> Self {
        Self {
            cy_request: Regex::new(r"\bcy\s*\.\s*(?:request|api)\s*\(").expect("cy.request regex"),
            fetch: Regex::new(r"\bfetch\s*\(").expect("fetch regex"),
            client_call: Regex::new(
                r"(?:\b([A-Za-z_$][\w$]*)|\))\s*\.\s*(get|post|put|patch|delete)\s*\(",
            )
            .expect("client call regex"),
            method_field: Regex::new(r#"\bmethod\s*:\s*['"`]([A-Za-z]+)['"`]"#)
                .expect("method field regex"),
            method_key: Regex::new(r"\bmethod\s*:").expect("method key regex"),
            url_key: Regex::new(r"\burl\s*:\s*").expect("url key regex"),
        }
    }

    /// `cy.request(...)` / `cy.api(...)` in object or positional form.
    fn parse_cy_request(&self, args: &str) -> Option<(HttpMethod, Vec<UrlPart>)> {
        let start = skip_ws(args, 0);
        if args[start..].starts_with('{') {
            let end = group_end(args, start)?;
            return self.parse_options_object(&args[start + 1..end - 1], true);
        }
        let (first, after_first) = parse_expr(args)?;
        let after_first = skip_ws(args, after_first);
        if let [UrlPart::Literal(word)] = first.as_slice() {
            if let Some(method) = HttpMethod::parse(word) {
                if args[after_first..].starts_with(',') {
                    let (url, _) = parse_expr(&args[after_first + 1..])?;
                    return Some((method, url));
                }
            }
        }
        Some((HttpMethod::Get, first))
    }

    /// `{ method: 'POST', url: '/x', ... }`. `needs_url` is false for fetch
    /// options, where the URL came positionally.
    fn parse_options_object(
        &self,
        body: &str,
        needs_url: bool,
    ) -> Option<(HttpMethod, Vec<UrlPart>)> {
        // Keys inside `body: {...}` or `headers: {...}` are payload, not options.
        let top_level = mask_nested_groups(body);
        let method = match self.method_field.captures(&top_level) {
            Some(caps) => HttpMethod::parse(&caps[1])?,
            // `method: someVariable` cannot be resolved statically.
            None if self.method_key.is_match(&top_level) => return None,
            None => HttpMethod::Get,
        };
        if !needs_url {
            return Some((method, Vec::new()));
        }
        let url = self.url_key.find(&top_level)?;
        let (parts, _) = parse_expr(&body[url.end()..])?;
        Some((method, parts))
    }

    fn parse_fetch(&self, args: &str) -> Option<(HttpMethod, Vec<UrlPart>)> {
        let (url, after) = parse_expr(args)?;
        let mut pos = skip_ws(args, after);
        if !args[pos..].starts_with(',') {
            return Some((HttpMethod::Get, url));
        }
        pos = skip_ws(args, pos + 1);
        if !args[pos..].starts_with('{') {
            return Some((HttpMethod::Get, url));
        }
        let end = group_end(args, pos)?;
        let (method, _) = self.parse_options_object(&args[pos + 1..end - 1], false)?;
        Some((method, url))
    }
}

impl CorpusKeyExtractor for PatternCorpusExtractor {
    fn extract(&self, source: &str, text: &str) -> CorpusExtraction {
        let mut extraction = CorpusExtraction::default();

        let strict_openers = self
            .cy_request
            .find_iter(text)
            .map(|m| (m.start(), m.end(), true))
            .chain(self.fetch.find_iter(text).map(|m| (m.start(), m.end(), false)));
        for (start, args_start, is_cy) in strict_openers {
            let args = &text[args_start..];
            let parsed = if is_cy {
                self.parse_cy_request(args)
            } else {
                self.parse_fetch(args)
            };
            match parsed {
                Some((method, parts)) => {
                    record_call(&mut extraction, source, text, start, method, &parts)
                }
                None => record_miss(&mut extraction, source, text, start),
            }
        }

        for caps in self.client_call.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if caps.get(1).is_some_and(|receiver| receiver.as_str() == "cy") {
                continue;
            }
            let Some(method) = HttpMethod::parse(&caps[2]) else {
                continue;
            };
            // `.get(` is ambiguous (maps, selectors); only absolute URLs count.
            let Some((parts, _)) = parse_expr(&text[whole.end()..]) else {
                continue;
            };
            if looks_like_api_url(&join_concatenation(&parts)) {
                record_call(&mut extraction, source, text, whole.start(), method, &parts);
            }
        }

        extraction.calls.sort_by(|a, b| (a.line, &a.key).cmp(&(b.line, &b.key)));
        extraction
    }
}

fn record_call(
    extraction: &mut CorpusExtraction,
    source: &str,
    text: &str,
    offset: usize,
    method: HttpMethod,
    parts: &[UrlPart],
) {
    let raw_url = join_concatenation(parts);
    extraction.calls.push(CorpusCall {
        key: EndpointKey::new(method, &raw_url),
        raw_url,
        source: source.to_string(),
        line: line_of(text, offset),
    });
}

fn record_miss(extraction: &mut CorpusExtraction, source: &str, text: &str, offset: usize) {
    let line = line_of(text, offset);
    let line_text = text[offset..].lines().next().unwrap_or("").trim();
    extraction.parse_misses.push(Diagnostic::new(
        DiagnosticKind::CorpusParseMiss,
        format!("{source}:{line}"),
        format!(
            "unrecognized call site: {}",
            truncate_string(line_text, MISS_EXCERPT_BYTES)
        ),
    ));
}

fn looks_like_api_url(url: &str) -> bool {
    url.starts_with('/') || url.contains("://") || url.starts_with("{{") || url.starts_with("${")
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

fn skip_ws(input: &str, pos: usize) -> usize {
    input[pos..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(input.len(), |(idx, _)| pos + idx)
}

/// Parse `operand (+ operand)*` starting at the beginning of `input`.
///
/// Returns `None` unless at least one operand is a string literal.
fn parse_expr(input: &str) -> Option<(Vec<UrlPart>, usize)> {
    let mut pos = skip_ws(input, 0);
    let mut parts = Vec::new();
    loop {
        let (part, next) = parse_operand(input, pos)?;
        parts.push(part);
        pos = skip_ws(input, next);
        if input[pos..].starts_with('+') {
            pos = skip_ws(input, pos + 1);
            continue;
        }
        break;
    }
    if parts.iter().any(|part| matches!(part, UrlPart::Literal(_))) {
        Some((parts, pos))
    } else {
        None
    }
}

fn parse_operand(input: &str, pos: usize) -> Option<(UrlPart, usize)> {
    let rest = &input[pos..];
    let first = rest.chars().next()?;
    if matches!(first, '\'' | '"' | '`') {
        let close = closing_quote(rest, first)?;
        return Some((UrlPart::Literal(rest[1..close].to_string()), pos + close + 1));
    }
    let len = expression_len(rest);
    if len == 0 {
        return None;
    }
    Some((UrlPart::Expr(rest[..len].to_string()), pos + len))
}

/// Length of an identifier/member/call chain such as `Cypress.env('x').id`.
fn expression_len(rest: &str) -> usize {
    let mut idx = 0;
    while let Some(c) = rest[idx..].chars().next() {
        match c {
            '(' | '[' => idx = group_end(rest, idx).unwrap_or(rest.len()),
            c if c.is_alphanumeric() || matches!(c, '_' | '$' | '.') => idx += c.len_utf8(),
            _ => break,
        }
    }
    idx
}

/// Byte index of the quote closing the literal that opens `rest`.
fn closing_quote(rest: &str, quote: char) -> Option<usize> {
    let mut idx = quote.len_utf8();
    while let Some(c) = rest[idx..].chars().next() {
        match c {
            '\\' => {
                idx += 1;
                if let Some(escaped) = rest[idx..].chars().next() {
                    idx += escaped.len_utf8();
                }
                continue;
            }
            '$' if quote == '`' && rest[idx..].starts_with("${") => {
                idx = group_end(rest, idx + 1)?;
                continue;
            }
            '\n' if quote != '`' => return None,
            c if c == quote => return Some(idx),
            _ => {}
        }
        idx += c.len_utf8();
    }
    None
}

/// `body` with every bracketed group blanked to spaces. Byte offsets are
/// preserved, so a match in the result indexes the same text in `body`.
fn mask_nested_groups(body: &str) -> String {
    let mut masked = String::with_capacity(body.len());
    let mut idx = 0;
    while let Some(c) = body[idx..].chars().next() {
        let end = match c {
            '(' | '[' | '{' => {
                let end = group_end(body, idx).unwrap_or(body.len());
                masked.push_str(&" ".repeat(end - idx));
                idx = end;
                continue;
            }
            '\'' | '"' | '`' => {
                closing_quote(&body[idx..], c).map_or(body.len(), |close| idx + close + 1)
            }
            _ => idx + c.len_utf8(),
        };
        masked.push_str(&body[idx..end]);
        idx = end;
    }
    masked
}

/// Index just past the bracket matching the one at `open`.
fn group_end(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = open;
    while let Some(c) = input[idx..].chars().next() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            '\'' | '"' | '`' => {
                idx += closing_quote(&input[idx..], c)? + 1;
                continue;
            }
            _ => {}
        }
        idx += c.len_utf8();
    }
    None
}

#[cfg(test)]
#[path = "corpus_tests.rs"]
mod tests;
