//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temp workspace holding a spec file and a corpus directory.
pub struct Workspace {
    pub temp: TempDir,
}

/// Result of one apicov invocation.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Parse stdout as JSON, panicking with stderr on failure.
    pub fn json(&self) -> Value {
        assert!(self.success, "apicov failed: {}", self.stderr);
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// Run apicov with `args`, with the workspace as the working directory.
    pub fn run(&self, args: &[&str]) -> RunResult {
        let output = Command::new(env!("CARGO_BIN_EXE_apicov"))
            .args(args)
            .current_dir(self.root())
            .env_remove("APICOV_LOG")
            .output()
            .expect("spawn apicov");
        RunResult::from_output(output)
    }
}

/// A small OpenAPI document covering the cases the CLI tests rely on.
pub const OPENAPI_SPEC: &str = r##"{
  "openapi": "3.0.0",
  "info": {"title": "fixture", "version": "1"},
  "paths": {
    "/edge_applications": {
      "get": {"summary": "List edge applications"},
      "post": {
        "summary": "Create edge application",
        "requestBody": {"content": {"application/json": {
          "schema": {"$ref": "#/components/schemas/EdgeApplication"}
        }}}
      }
    },
    "/edge_applications/{id}": {
      "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}],
      "get": {"summary": "Edge application info"},
      "delete": {}
    },
    "/domains": {
      "post": {"summary": "Create domain"}
    }
  },
  "components": {"schemas": {"EdgeApplication": {
    "type": "object",
    "required": ["name"],
    "properties": {
      "name": {"type": "string"},
      "active": {"type": "boolean"}
    }
  }}}
}
"##;

pub const CORPUS_TEST: &str = r#"describe('edge applications', () => {
  it('reads one', () => {
    cy.request({method:'GET', url:'/edge_applications/999999'});
  });
  it('lists', () => {
    cy.request('GET', `${Cypress.env('baseUrl')}/edge_applications`);
  });
  it('hits something undocumented', () => {
    cy.request('DELETE', '/legacy/' + id);
  });
});
"#;
