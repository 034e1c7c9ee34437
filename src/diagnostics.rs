//! Non-fatal findings collected during an analysis run.
//!
//! Nothing in here aborts a run; diagnostics travel with the report so the
//! consumer can decide how loud to be about them.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A spec leaf that could not be turned into an endpoint.
    MalformedSpecNode,
    /// A schema reference chain that loops back on itself.
    UnresolvableSchemaCycle,
    /// A `$ref` pointing at a schema the document does not define.
    UnresolvedSchemaRef,
    /// Two spec leaves collapsing onto the same endpoint key.
    DuplicateEndpoint,
    /// A category with no spec endpoints, reported as 0%.
    EmptyCategoryDivision,
    /// A request call site in the corpus that no pattern understood.
    CorpusParseMiss,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Sort and drop exact duplicates so reports stay stable across runs.
pub fn normalize_diagnostics(diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.sort();
    diagnostics.dedup();
}

pub fn count_kind(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> usize {
    diagnostics.iter().filter(|diag| diag.kind == kind).count()
}
