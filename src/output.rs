//! Filesystem edges: corpus snapshot loading and result writing.
//!
//! The engine itself never touches the filesystem; this module turns a
//! directory into `(source, text)` pairs and results into files or stdout.
use crate::corpus::CorpusFile;
use crate::util::display_path;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Every regular file under `root`, sorted.
pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Load the corpus snapshot rooted at `root` (a directory or a single file).
///
/// Non-UTF-8 bytes are replaced rather than rejected; the extractor only
/// needs the ASCII call sites.
pub fn load_corpus(root: &Path, extensions: &[String]) -> Result<Vec<CorpusFile>> {
    if !root.exists() {
        return Err(anyhow!("corpus path {} does not exist", root.display()));
    }
    let (paths, base) = if root.is_file() {
        (vec![root.to_path_buf()], root.parent())
    } else {
        let paths = collect_files_recursive(root)?
            .into_iter()
            .filter(|path| has_extension(path, extensions))
            .collect();
        (paths, Some(root))
    };
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        files.push(CorpusFile {
            source: display_path(&path, base),
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    tracing::debug!(root = %root.display(), files = files.len(), "loaded corpus");
    Ok(files)
}

/// Write `text` to `out`, or to stdout when no path is given.
pub fn write_text(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(path, text.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("write stdout")?;
            stdout.flush().context("flush stdout")?;
        }
    }
    Ok(())
}

pub fn write_json<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value).context("serialize JSON output")?;
    text.push('\n');
    write_text(out, &text)
}
