//! Analysis configuration.
//!
//! The category rule table, weights and scenario knobs live in a JSON file
//! next to the spec so a run stays a pure function of its inputs. Missing
//! config means [`default_config`].
use crate::error::AnalysisError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CATEGORY_RULES_VERSION: u32 = 1;
const DEFAULT_CATEGORY: &str = "general";

/// One row of the category rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Knobs for scenario synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScenarioSettings {
    pub oversized_lengths: Vec<usize>,
    pub large_array_len: usize,
    pub not_found_id: String,
    pub burst_requests: u32,
    pub max_latency_ms: u64,
    pub auth_header: String,
    pub auth_placeholder: String,
    pub invalid_token: String,
    pub boundary_statuses: Vec<u16>,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            oversized_lengths: vec![255, 1000],
            large_array_len: 50,
            not_found_id: "99999999".to_string(),
            burst_requests: 50,
            max_latency_ms: 2000,
            auth_header: "Authorization".to_string(),
            auth_placeholder: "Token {{token}}".to_string(),
            invalid_token: "Token invalid-token".to_string(),
            boundary_statuses: vec![200, 201, 400, 413, 422],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub schema_version: u32,
    pub default_category: String,
    /// Bumped whenever the rule table changes meaning; echoed into reports.
    pub category_rules_version: u32,
    pub category_rules: Vec<CategoryRule>,
    #[serde(default)]
    pub category_weights: BTreeMap<String, i32>,
    #[serde(default = "default_keyword_bonuses")]
    pub keyword_bonuses: BTreeMap<String, i32>,
    #[serde(default)]
    pub scenarios: ScenarioSettings,
    #[serde(default = "default_corpus_extensions")]
    pub corpus_extensions: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        default_config()
    }
}

fn rule(category: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        category: category.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        rule("edge_application", &["edge_application"]),
        rule("edge_firewall", &["edge_firewall"]),
        rule("edge_function", &["edge_function"]),
        rule("dns", &["intelligent_dns", "dns"]),
        rule("domains", &["domain"]),
        rule("digital_certificates", &["digital_certificate", "certificate"]),
        rule("network_lists", &["network_list"]),
        rule("waf", &["waf"]),
        rule("data_stream", &["data_stream"]),
        rule("purge", &["real_time_purge", "purge"]),
        rule("storage", &["storage", "bucket"]),
        rule("origins", &["origin"]),
        rule("cache_settings", &["cache_setting"]),
        rule("rules_engine", &["rules_engine"]),
        rule("auth", &["auth", "token", "login"]),
        rule("iam", &["iam", "user", "account"]),
    ]
}

fn default_category_weights() -> BTreeMap<String, i32> {
    [
        ("edge_application", 2),
        ("auth", 2),
        ("domains", 1),
        ("dns", 1),
        ("edge_firewall", 1),
    ]
    .into_iter()
    .map(|(name, weight)| (name.to_string(), weight))
    .collect()
}

fn default_keyword_bonuses() -> BTreeMap<String, i32> {
    ["list", "create", "info"]
        .into_iter()
        .map(|keyword| (keyword.to_string(), 1))
        .collect()
}

fn default_corpus_extensions() -> Vec<String> {
    ["js", "ts", "jsx", "tsx", "mjs", "cjs"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Config used when no file is given.
pub fn default_config() -> AnalysisConfig {
    AnalysisConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        default_category: DEFAULT_CATEGORY.to_string(),
        category_rules_version: CATEGORY_RULES_VERSION,
        category_rules: default_category_rules(),
        category_weights: default_category_weights(),
        keyword_bonuses: default_keyword_bonuses(),
        scenarios: ScenarioSettings::default(),
        corpus_extensions: default_corpus_extensions(),
    }
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: AnalysisConfig =
        serde_json::from_slice(&bytes).context("parse analysis config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `path` if given, else fall back to defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(default_config()),
    }
}

pub fn write_config(path: &Path, config: &AnalysisConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize analysis config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &AnalysisConfig) -> Result<(), AnalysisError> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(AnalysisError::Config(format!(
            "unsupported schema_version {}",
            config.schema_version
        )));
    }
    if config.default_category.trim().is_empty() {
        return Err(AnalysisError::Config(
            "default_category must be non-empty".to_string(),
        ));
    }
    for rule in &config.category_rules {
        if rule.category.trim().is_empty() {
            return Err(AnalysisError::Config(
                "category rule with empty category name".to_string(),
            ));
        }
        if rule.keywords.iter().any(|keyword| keyword.trim().is_empty()) {
            return Err(AnalysisError::Config(format!(
                "category {:?} has an empty keyword",
                rule.category
            )));
        }
    }
    let settings = &config.scenarios;
    if settings.oversized_lengths.contains(&0) {
        return Err(AnalysisError::Config(
            "oversized_lengths entries must be positive".to_string(),
        ));
    }
    if settings.not_found_id.trim().is_empty() {
        return Err(AnalysisError::Config(
            "not_found_id must be non-empty".to_string(),
        ));
    }
    // A single code would claim boundary behavior is known.
    if settings.boundary_statuses.len() < 2 {
        return Err(AnalysisError::Config(
            "boundary_statuses must list at least two codes".to_string(),
        ));
    }
    if settings.auth_header.trim().is_empty() {
        return Err(AnalysisError::Config(
            "auth_header must be non-empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
