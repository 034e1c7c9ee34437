//! Command implementations.
//!
//! Each command loads its inputs, runs the matching engine stages and writes
//! JSON (or a text summary) to `--out` or stdout.
use crate::analysis::{self, SpecAnalysis};
use crate::categorize::CategorizedEndpoint;
use crate::cli::{CoverageArgs, EndpointsArgs, InitArgs, ReportArgs, ScenariosArgs, SpecArgs};
use crate::config::{self, AnalysisConfig};
use crate::corpus::PatternCorpusExtractor;
use crate::coverage::CategoryCoverage;
use crate::diagnostics::{count_kind, normalize_diagnostics, Diagnostic, DiagnosticKind};
use crate::endpoint::EndpointKey;
use crate::extract::SpecFormat;
use crate::output::{load_corpus, write_json, write_text};
use crate::path::paths_match;
use crate::report::{render_coverage_summary, sort_by_gap, Metrics};
use crate::scenarios::EndpointScenarios;
use crate::util::sha256_hex;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A parsed spec document plus the digest of its raw bytes.
pub struct SpecDocument {
    pub value: Value,
    pub sha256: String,
}

/// Read a spec file as JSON, falling back to YAML.
pub fn load_spec_document(path: &Path) -> Result<SpecDocument> {
    let bytes = fs::read(path).with_context(|| format!("read spec {}", path.display()))?;
    let sha256 = sha256_hex(&bytes);
    let value = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => value,
        Err(json_err) => serde_yaml::from_slice::<Value>(&bytes).map_err(|yaml_err| {
            anyhow!(
                "parse spec {}: not JSON ({json_err}) and not YAML ({yaml_err})",
                path.display()
            )
        })?,
    };
    Ok(SpecDocument { value, sha256 })
}

fn load_inputs(args: &SpecArgs) -> Result<(SpecDocument, AnalysisConfig)> {
    let config = config::load_config_or_default(args.config.as_deref())?;
    let doc = load_spec_document(&args.spec)?;
    Ok((doc, config))
}

fn analyze_spec_file(
    args: &SpecArgs,
) -> Result<(SpecDocument, AnalysisConfig, SpecAnalysis)> {
    let (doc, config) = load_inputs(args)?;
    let spec = analysis::analyze_spec(&doc.value, &config)
        .with_context(|| format!("analyze spec {}", args.spec.display()))?;
    tracing::info!(
        spec = %args.spec.display(),
        endpoints = spec.endpoints.len(),
        schemas = spec.registry.schema_count(),
        "spec loaded"
    );
    Ok((doc, config, spec))
}

pub fn run_init(args: InitArgs) -> Result<()> {
    if args.out.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            args.out.display()
        ));
    }
    config::write_config(&args.out, &config::default_config())?;
    tracing::info!(path = %args.out.display(), "wrote default config");
    Ok(())
}

#[derive(Serialize)]
struct EndpointsOutput {
    spec_format: SpecFormat,
    endpoints: Vec<CategorizedEndpoint>,
    diagnostics: Vec<Diagnostic>,
}

pub fn run_endpoints(args: EndpointsArgs) -> Result<()> {
    let (_, _, spec) = analyze_spec_file(&args.spec)?;
    let mut diagnostics = spec.diagnostics;
    normalize_diagnostics(&mut diagnostics);
    write_json(
        args.spec.out.as_deref(),
        &EndpointsOutput {
            spec_format: spec.format,
            endpoints: spec.endpoints,
            diagnostics,
        },
    )
}

#[derive(Serialize)]
struct CoverageOutput {
    per_category: Vec<CategoryCoverage>,
    global: CategoryCoverage,
    diagnostics: Vec<Diagnostic>,
    metrics: Metrics,
}

pub fn run_coverage(args: CoverageArgs) -> Result<()> {
    let (_, config, spec) = analyze_spec_file(&args.spec)?;
    let files = load_corpus(&args.corpus, &config.corpus_extensions)
        .with_context(|| format!("load corpus {}", args.corpus.display()))?;
    let scan = analysis::scan_corpus(&files, &PatternCorpusExtractor::new());
    let comparison = analysis::compare_coverage(&spec, &scan, &config);

    let mut per_category = comparison.per_category;
    sort_by_gap(&mut per_category);
    if !args.json {
        let summary = render_coverage_summary(&per_category, &comparison.global);
        return write_text(args.spec.out.as_deref(), &summary);
    }

    let mut diagnostics = spec.diagnostics;
    diagnostics.extend(scan.diagnostics);
    diagnostics.extend(comparison.diagnostics);
    normalize_diagnostics(&mut diagnostics);
    let metrics = Metrics {
        parse_miss: count_kind(&diagnostics, DiagnosticKind::CorpusParseMiss),
        corpus_files: files.len(),
        corpus_calls: scan.calls.len(),
    };
    write_json(
        args.spec.out.as_deref(),
        &CoverageOutput {
            per_category,
            global: comparison.global,
            diagnostics,
            metrics,
        },
    )
}

#[derive(Serialize)]
struct ScenariosOutput {
    scenarios: Vec<EndpointScenarios>,
    diagnostics: Vec<Diagnostic>,
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<()> {
    let (_, config, spec) = analyze_spec_file(&args.spec)?;
    let wanted = args
        .endpoint
        .as_deref()
        .map(|raw| {
            EndpointKey::parse(raw)
                .ok_or_else(|| anyhow!("invalid --endpoint {raw:?}; expected \"METHOD /path\""))
        })
        .transpose()?;

    let selected: Vec<CategorizedEndpoint> = spec
        .endpoints
        .into_iter()
        .filter(|endpoint| match &wanted {
            Some(key) => {
                endpoint.endpoint.method == key.method
                    && paths_match(&endpoint.endpoint.raw_path, &key.path)
            }
            None => true,
        })
        .filter(|endpoint| match args.category.as_deref() {
            Some(category) => endpoint.category == category,
            None => true,
        })
        .collect();
    if selected.is_empty() && (wanted.is_some() || args.category.is_some()) {
        return Err(anyhow!("no spec endpoint matches the given filters"));
    }

    let (scenarios, scenario_diagnostics) =
        analysis::synthesize_scenarios(&selected, &spec.registry, &config);
    let mut diagnostics = spec.diagnostics;
    diagnostics.extend(scenario_diagnostics);
    normalize_diagnostics(&mut diagnostics);
    write_json(
        args.spec.out.as_deref(),
        &ScenariosOutput {
            scenarios,
            diagnostics,
        },
    )
}

pub fn run_report(args: ReportArgs) -> Result<()> {
    let (doc, config) = load_inputs(&args.spec)?;
    let files = load_corpus(&args.corpus, &config.corpus_extensions)
        .with_context(|| format!("load corpus {}", args.corpus.display()))?;
    let report = analysis::analyze(&doc.value, &doc.sha256, &files, &config)
        .with_context(|| format!("analyze spec {}", args.spec.spec.display()))?;
    write_json(args.spec.out.as_deref(), &report)
}
