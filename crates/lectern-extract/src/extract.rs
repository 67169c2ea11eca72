//! Source artifact normalization: bytes in, one text string out.
//!
//! PDFs are decoded page by page; everything else is treated as UTF-8
//! text. The artifact's declared name travels with every error so a failed
//! document can be reported without aborting its neighbors.

use std::fs;
use std::path::{Path, PathBuf};

use lectern_core::error::{Error, Result};

/// A source document as handed to ingestion: declared name, optional MIME
/// hint, raw bytes.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceArtifact {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes,
        }
    }

    /// Read one file from disk. The artifact name is the file name, not the
    /// full path, since chunk ids are derived from it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::extraction(path.display().to_string(), "path has no usable file name")
            })?;
        let bytes = fs::read(path).map_err(|e| Error::extraction(&name, e))?;
        let mime = mime_for_extension(path);
        Ok(Self { name, mime, bytes })
    }
}

/// Normalize an artifact to one text string.
///
/// PDFs yield their pages' text in page order, joined by newlines. Anything
/// else decodes as UTF-8; invalid sequences are replaced rather than
/// refused, the same policy used for reading arbitrary disk files.
pub fn extract_text(artifact: &SourceArtifact) -> Result<String> {
    if is_pdf(&artifact.name, artifact.mime.as_deref()) {
        extract_pdf_text(&artifact.name, &artifact.bytes)
    } else {
        Ok(String::from_utf8_lossy(&artifact.bytes).into_owned())
    }
}

/// True when either the MIME hint or the file name marks the artifact as PDF.
fn is_pdf(name: &str, mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.contains("pdf")) || name.to_ascii_lowercase().ends_with(".pdf")
}

fn extract_pdf_text(name: &str, bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| Error::extraction(name, e))?;
    // get_pages is keyed by page number, so iteration order is page order.
    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        let text = doc
            .extract_text(&[*page_number])
            .map_err(|e| Error::extraction(name, e))?;
        pages.push(text);
    }
    Ok(pages.join("\n"))
}

fn mime_for_extension(path: &Path) -> Option<String> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf".to_string()),
        "md" => Some("text/markdown".to_string()),
        "txt" => Some("text/plain".to_string()),
        _ => None,
    }
}

/// Recursively list files under `root` whose extension is on the accept
/// list (compared case-insensitively), sorted for deterministic ingestion
/// order.
pub fn list_ingestable_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            if extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files
}
