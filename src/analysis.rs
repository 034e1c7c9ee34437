//! Single top-level analysis pass.
//!
//! Every stage returns its results explicitly; nothing accumulates in
//! shared state. Per-endpoint and per-file work fans out on rayon and is
//! collected back in input order, so parallelism never changes the output.
use crate::categorize::{CategorizedEndpoint, Categorizer};
use crate::config::AnalysisConfig;
use crate::corpus::{CorpusCall, CorpusFile, CorpusKeyExtractor, PatternCorpusExtractor};
use crate::coverage::{self, CoverageComparison};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::endpoint::{Endpoint, EndpointKey};
use crate::error::AnalysisError;
use crate::extract::{extract_endpoints, SpecFormat};
use crate::report::{aggregate, Report, ReportMeta, ReportParts};
use crate::scenarios::{EndpointScenarios, ScenarioSynthesizer};
use crate::schema::SchemaRegistry;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Categorized endpoints from one spec document.
#[derive(Debug, Clone)]
pub struct SpecAnalysis {
    pub format: SpecFormat,
    pub endpoints: Vec<CategorizedEndpoint>,
    pub registry: SchemaRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

/// Call sites and the derived key set from a corpus snapshot.
#[derive(Debug, Clone, Default)]
pub struct CorpusScan {
    pub calls: Vec<CorpusCall>,
    pub keys: BTreeSet<EndpointKey>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract, dedupe and categorize the spec's endpoints.
pub fn analyze_spec(
    doc: &Value,
    config: &AnalysisConfig,
) -> Result<SpecAnalysis, AnalysisError> {
    let extraction = extract_endpoints(doc)?;
    let mut diagnostics = extraction.diagnostics;
    let endpoints = dedupe_endpoints(extraction.endpoints, &mut diagnostics);

    let categorizer = Categorizer::new(config);
    let endpoints: Vec<CategorizedEndpoint> = endpoints
        .into_par_iter()
        .map(|endpoint| categorizer.apply(endpoint))
        .collect();

    Ok(SpecAnalysis {
        format: extraction.format,
        endpoints,
        registry: extraction.registry,
        diagnostics,
    })
}

/// First declaration of a key wins; later ones are reported and dropped.
/// The result is sorted by key.
fn dedupe_endpoints(
    endpoints: Vec<Endpoint>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Endpoint> {
    let mut by_key: BTreeMap<EndpointKey, Endpoint> = BTreeMap::new();
    for endpoint in endpoints {
        let key = endpoint.key();
        if let Some(first) = by_key.get(&key) {
            tracing::warn!(%key, raw_path = %endpoint.raw_path, "duplicate endpoint");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateEndpoint,
                key.to_string(),
                format!(
                    "{} duplicates {}; keeping the first",
                    endpoint.raw_path, first.raw_path
                ),
            ));
            continue;
        }
        by_key.insert(key, endpoint);
    }
    by_key.into_values().collect()
}

/// Run the extractor over every file. Builds the complete key set before
/// any comparison happens.
pub fn scan_corpus(files: &[CorpusFile], extractor: &dyn CorpusKeyExtractor) -> CorpusScan {
    let extractions: Vec<_> = files
        .par_iter()
        .map(|file| extractor.extract(&file.source, &file.text))
        .collect();

    let mut scan = CorpusScan::default();
    for (file, extraction) in files.iter().zip(extractions) {
        tracing::debug!(
            source = %file.source,
            calls = extraction.calls.len(),
            parse_misses = extraction.parse_misses.len(),
            "scanned corpus file"
        );
        scan.keys
            .extend(extraction.calls.iter().map(|call| call.key.clone()));
        scan.calls.extend(extraction.calls);
        scan.diagnostics.extend(extraction.parse_misses);
    }
    scan
}

pub fn compare_coverage(
    spec: &SpecAnalysis,
    corpus: &CorpusScan,
    config: &AnalysisConfig,
) -> CoverageComparison {
    coverage::compare(&spec.endpoints, &corpus.keys, &Categorizer::new(config))
}

pub fn synthesize_scenarios(
    endpoints: &[CategorizedEndpoint],
    registry: &SchemaRegistry,
    config: &AnalysisConfig,
) -> (Vec<EndpointScenarios>, Vec<Diagnostic>) {
    let synthesizer = ScenarioSynthesizer::new(&config.scenarios, registry);
    let outputs: Vec<_> = endpoints
        .par_iter()
        .map(|endpoint| synthesizer.synthesize(endpoint))
        .collect();
    let mut diagnostics = Vec::new();
    let mut scenarios = Vec::with_capacity(outputs.len());
    for output in outputs {
        diagnostics.extend(output.diagnostics);
        scenarios.push(output.scenarios);
    }
    (scenarios, diagnostics)
}

/// Full pass over one spec document and one corpus snapshot.
pub fn analyze(
    doc: &Value,
    spec_sha256: &str,
    corpus: &[CorpusFile],
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let spec = analyze_spec(doc, config)?;
    let scan = scan_corpus(corpus, &PatternCorpusExtractor::new());
    let coverage = compare_coverage(&spec, &scan, config);
    let (scenarios, scenario_diagnostics) =
        synthesize_scenarios(&spec.endpoints, &spec.registry, config);

    tracing::info!(
        endpoints = spec.endpoints.len(),
        corpus_files = corpus.len(),
        corpus_calls = scan.calls.len(),
        covered = coverage.global.covered_count,
        missing = coverage.global.missing.len(),
        percentage = coverage.global.percentage,
        "analysis complete"
    );

    let mut diagnostics = spec.diagnostics;
    diagnostics.extend(scan.diagnostics);
    diagnostics.extend(scenario_diagnostics);

    Ok(aggregate(ReportParts {
        meta: ReportMeta::new(spec_sha256, spec.format, config.category_rules_version),
        endpoints: spec.endpoints,
        coverage,
        scenarios,
        diagnostics,
        corpus_files: corpus.len(),
        corpus_calls: scan.calls.len(),
    }))
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
