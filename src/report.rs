//! Final report assembly.
//!
//! Aggregation is arithmetic and sorting only; every decision was made
//! upstream. The report carries no timestamps so identical inputs produce
//! identical bytes.
use crate::categorize::{CategorizedEndpoint, Priority};
use crate::coverage::{CategoryCoverage, CoverageComparison};
use crate::diagnostics::{count_kind, normalize_diagnostics, Diagnostic, DiagnosticKind};
use crate::endpoint::EndpointKey;
use crate::extract::SpecFormat;
use crate::scenarios::{EndpointScenarios, ScenarioClass};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const REPORT_SCHEMA_VERSION: u32 = 1;
pub const TOOL_NAME: &str = "apicov";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub tool_name: String,
    pub tool_version: String,
    pub spec_sha256: String,
    pub spec_format: SpecFormat,
    pub category_rules_version: u32,
}

impl ReportMeta {
    pub fn new(spec_sha256: &str, spec_format: SpecFormat, category_rules_version: u32) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            tool_name: TOOL_NAME.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            spec_sha256: spec_sha256.to_string(),
            spec_format,
            category_rules_version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub endpoints: usize,
    pub covered: usize,
    pub missing: usize,
    pub extra: usize,
    pub scenarios: usize,
    pub scenarios_by_class: BTreeMap<ScenarioClass, usize>,
    pub priority_buckets: BTreeMap<Priority, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub parse_miss: usize,
    pub corpus_files: usize,
    pub corpus_calls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub per_category: Vec<CategoryCoverage>,
    pub global: CategoryCoverage,
    pub endpoints: Vec<CategorizedEndpoint>,
    pub per_endpoint_scenario_counts: BTreeMap<EndpointKey, usize>,
    pub scenarios: Vec<EndpointScenarios>,
    pub totals: Totals,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: Metrics,
}

/// Everything the aggregator merges.
pub struct ReportParts {
    pub meta: ReportMeta,
    pub endpoints: Vec<CategorizedEndpoint>,
    pub coverage: CoverageComparison,
    pub scenarios: Vec<EndpointScenarios>,
    pub diagnostics: Vec<Diagnostic>,
    pub corpus_files: usize,
    pub corpus_calls: usize,
}

pub fn aggregate(parts: ReportParts) -> Report {
    let ReportParts {
        meta,
        endpoints,
        coverage,
        scenarios,
        mut diagnostics,
        corpus_files,
        corpus_calls,
    } = parts;

    let mut per_category = coverage.per_category;
    sort_by_gap(&mut per_category);
    diagnostics.extend(coverage.diagnostics);
    normalize_diagnostics(&mut diagnostics);

    let mut per_endpoint_scenario_counts = BTreeMap::new();
    let mut scenarios_by_class: BTreeMap<ScenarioClass, usize> = BTreeMap::new();
    for set in &scenarios {
        per_endpoint_scenario_counts.insert(set.key.clone(), set.scenarios.len());
        for (class, count) in set.count_by_class() {
            *scenarios_by_class.entry(class).or_insert(0) += count;
        }
    }
    let mut priority_buckets: BTreeMap<Priority, usize> = BTreeMap::new();
    for endpoint in &endpoints {
        *priority_buckets.entry(endpoint.priority).or_insert(0) += 1;
    }

    let totals = Totals {
        endpoints: endpoints.len(),
        covered: coverage.global.covered_count,
        missing: coverage.global.missing.len(),
        extra: coverage.global.extra.len(),
        scenarios: per_endpoint_scenario_counts.values().sum(),
        scenarios_by_class,
        priority_buckets,
    };
    let metrics = Metrics {
        parse_miss: count_kind(&diagnostics, DiagnosticKind::CorpusParseMiss),
        corpus_files,
        corpus_calls,
    };

    Report {
        meta,
        per_category,
        global: coverage.global,
        endpoints,
        per_endpoint_scenario_counts,
        scenarios,
        totals,
        diagnostics,
        metrics,
    }
}

/// Largest gap first, then category name.
pub fn sort_by_gap(categories: &mut [CategoryCoverage]) {
    categories.sort_by(|a, b| {
        b.gap()
            .cmp(&a.gap())
            .then_with(|| a.category.cmp(&b.category))
    });
}

/// Plain-text coverage table for terminals.
pub fn render_coverage_summary(
    categories: &[CategoryCoverage],
    global: &CategoryCoverage,
) -> String {
    let width = categories
        .iter()
        .map(|c| c.category.len())
        .chain(std::iter::once(global.category.len()))
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for coverage in categories.iter().chain(std::iter::once(global)) {
        let _ = writeln!(
            out,
            "{:<width$}  {:>3}%  {:>4}/{:<4} missing {:<4} extra {}",
            coverage.category,
            coverage.percentage,
            coverage.covered_count,
            coverage.endpoint_count,
            coverage.missing.len(),
            coverage.extra.len(),
        );
    }
    let gaps: Vec<&EndpointKey> = categories.iter().flat_map(|c| &c.missing).collect();
    if !gaps.is_empty() {
        out.push_str("\nmissing:\n");
        for key in gaps {
            let _ = writeln!(out, "  {key}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::Categorizer;
    use crate::config::default_config;
    use crate::coverage::compare;
    use crate::endpoint::{Endpoint, HttpMethod};
    use std::collections::BTreeSet;

    fn key(raw: &str) -> EndpointKey {
        EndpointKey::parse(raw).expect("endpoint key")
    }

    fn coverage(category: &str, missing: usize) -> CategoryCoverage {
        CategoryCoverage {
            category: category.to_string(),
            endpoint_count: missing,
            covered_count: 0,
            covered: Vec::new(),
            missing: (0..missing).map(|i| key(&format!("GET /{category}/{i}x"))).collect(),
            extra: Vec::new(),
            percentage: 0,
        }
    }

    #[test]
    fn categories_sort_by_descending_gap_then_name() {
        let mut categories = vec![coverage("dns", 1), coverage("waf", 3), coverage("auth", 1)];
        sort_by_gap(&mut categories);
        let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, ["waf", "auth", "dns"]);
    }

    #[test]
    fn aggregate_rolls_up_totals() {
        let config = default_config();
        let categorizer = Categorizer::new(&config);
        let endpoints: Vec<_> = [
            (HttpMethod::Get, "/edge_applications"),
            (HttpMethod::Delete, "/domains/{id}"),
        ]
        .into_iter()
        .map(|(method, path)| categorizer.apply(Endpoint::new(method, path)))
        .collect();
        let corpus: BTreeSet<EndpointKey> = [key("GET /edge_applications")].into_iter().collect();
        let comparison = compare(&endpoints, &corpus, &categorizer);
        let parse_miss = Diagnostic::new(DiagnosticKind::CorpusParseMiss, "a.js:1", "miss");

        let report = aggregate(ReportParts {
            meta: ReportMeta::new("abc", SpecFormat::OpenApi, 1),
            endpoints,
            coverage: comparison,
            scenarios: Vec::new(),
            diagnostics: vec![parse_miss.clone(), parse_miss],
            corpus_files: 1,
            corpus_calls: 1,
        });
        assert_eq!(report.totals.endpoints, 2);
        assert_eq!(report.totals.covered, 1);
        assert_eq!(report.totals.missing, 1);
        assert_eq!(report.totals.priority_buckets.get(&Priority::Medium), Some(&1));
        assert_eq!(report.totals.priority_buckets.get(&Priority::Low), Some(&1));
        assert_eq!(report.metrics.parse_miss, 1);
        assert_eq!(report.per_category[0].category, "domains");
        assert_eq!(report.global.percentage, 50);
    }

    #[test]
    fn summary_lists_missing_keys() {
        let rendered = render_coverage_summary(&[coverage("dns", 1)], &coverage("all", 1));
        assert!(rendered.contains("dns"));
        assert!(rendered.contains("missing:\n  GET /dns/0x"));
    }
}
