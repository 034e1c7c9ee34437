//! Set reconciliation of spec endpoints against corpus keys.
//!
//! Everything here is recomputed from scratch on each call. The corpus
//! heuristics are lossy, so a cached or patched result could hide a real
//! regression.
use crate::categorize::{CategorizedEndpoint, Categorizer};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::endpoint::EndpointKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const GLOBAL_CATEGORY: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCoverage {
    pub category: String,
    pub endpoint_count: usize,
    pub covered_count: usize,
    pub covered: Vec<EndpointKey>,
    pub missing: Vec<EndpointKey>,
    /// Corpus keys with no spec counterpart. Reported, never judged.
    pub extra: Vec<EndpointKey>,
    pub percentage: u32,
}

impl CategoryCoverage {
    fn from_sets(
        category: &str,
        spec: &BTreeSet<EndpointKey>,
        corpus: &BTreeSet<EndpointKey>,
        extra: Vec<EndpointKey>,
    ) -> Self {
        let covered: Vec<EndpointKey> = spec.intersection(corpus).cloned().collect();
        let missing: Vec<EndpointKey> = spec.difference(corpus).cloned().collect();
        Self {
            category: category.to_string(),
            endpoint_count: spec.len(),
            covered_count: covered.len(),
            percentage: coverage_percentage(covered.len(), spec.len()),
            covered,
            missing,
            extra,
        }
    }

    pub fn gap(&self) -> usize {
        self.missing.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageComparison {
    pub per_category: Vec<CategoryCoverage>,
    pub global: CategoryCoverage,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rounded `covered / total * 100`.
///
/// An empty denominator yields 0. A non-zero gap never rounds up to 100, so
/// 100 always means nothing is missing.
pub fn coverage_percentage(covered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let covered = covered.min(total) as u64;
    let total = total as u64;
    let rounded = (covered * 200 + total) / (2 * total);
    if rounded == 100 && covered < total {
        return 99;
    }
    rounded as u32
}

pub fn compare(
    spec: &[CategorizedEndpoint],
    corpus_keys: &BTreeSet<EndpointKey>,
    categorizer: &Categorizer<'_>,
) -> CoverageComparison {
    let mut spec_by_category: BTreeMap<&str, BTreeSet<EndpointKey>> = BTreeMap::new();
    for endpoint in spec {
        spec_by_category
            .entry(endpoint.category.as_str())
            .or_default()
            .insert(endpoint.endpoint.key());
    }
    let all_spec: BTreeSet<EndpointKey> = spec_by_category.values().flatten().cloned().collect();

    let mut extra_by_category: BTreeMap<String, Vec<EndpointKey>> = BTreeMap::new();
    for key in corpus_keys.difference(&all_spec) {
        let category = categorizer.categorize_path(&key.path).category;
        extra_by_category
            .entry(category)
            .or_default()
            .push(key.clone());
    }

    let categories: BTreeSet<&str> = spec_by_category
        .keys()
        .copied()
        .chain(extra_by_category.keys().map(String::as_str))
        .collect();

    let empty = BTreeSet::new();
    let mut diagnostics = Vec::new();
    let mut per_category = Vec::with_capacity(categories.len());
    for category in categories {
        let spec_keys = spec_by_category.get(category).unwrap_or(&empty);
        let extra = extra_by_category.get(category).cloned().unwrap_or_default();
        if spec_keys.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::EmptyCategoryDivision,
                category,
                "category has no spec endpoints; coverage reported as 0%",
            ));
        }
        per_category.push(CategoryCoverage::from_sets(
            category,
            spec_keys,
            corpus_keys,
            extra,
        ));
    }

    let all_extra: Vec<EndpointKey> = corpus_keys.difference(&all_spec).cloned().collect();
    let global = CategoryCoverage::from_sets(GLOBAL_CATEGORY, &all_spec, corpus_keys, all_extra);

    CoverageComparison {
        per_category,
        global,
        diagnostics,
    }
}

#[cfg(test)]
#[path = "coverage_tests.rs"]
mod tests;
