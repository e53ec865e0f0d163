//! Plain-text extraction from the configured brochure document.
//!
//! PDFs go through `pdf-extract`; `.txt`/`.md` files are read directly.
//! Failures never propagate: they come back as placeholder text that the
//! prompt builder uses like any other content.

use std::panic::AssertUnwindSafe;
use std::path::Path;

use tracing::{info, warn};

pub const DOCUMENT_NOT_FOUND: &str = "PDF file not found.";

/// Upper bound on extracted text kept for prompting.
const MAX_TEXT_LENGTH: usize = 200_000;

pub async fn load_document_text(path: &Path) -> String {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        warn!("document {} not found", path.display());
        return DOCUMENT_NOT_FOUND.to_string();
    }

    let owned = path.to_path_buf();
    let extracted = tokio::task::spawn_blocking(move || extract(&owned))
        .await
        .map_err(|e| format!("extraction task failed: {e}"))
        .and_then(|r| r);

    match extracted {
        Ok(text) => {
            let text = truncate(&text);
            info!(chars = text.len(), "loaded document {}", path.display());
            text
        }
        Err(e) => {
            warn!("failed to read document {}: {e}", path.display());
            format!("Error reading PDF: {e}")
        }
    }
}

fn extract(path: &Path) -> Result<String, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        Some("txt") | Some("md") => {
            std::fs::read_to_string(path).map_err(|e| format!("failed to read text file: {e}"))
        }
        _ => {
            let bytes = std::fs::read(path).map_err(|e| format!("failed to read file: {e}"))?;
            // pdf-extract can panic on unusual fonts
            let text = std::panic::catch_unwind(AssertUnwindSafe(|| {
                pdf_extract::extract_text_from_mem(&bytes)
            }))
            .map_err(|_| "PDF parser panicked on malformed input".to_string())?
            .map_err(|e| format!("failed to extract text: {e}"))?;
            Ok(join_pages(&text))
        }
    }
}

/// Collapse the run of blank lines pdf-extract leaves between pages.
fn join_pages(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_TEXT_LENGTH {
        return text.to_string();
    }
    let mut end = MAX_TEXT_LENGTH;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_pages_squeezes_blank_runs() {
        let raw = "Page one\n\n\n\n\nPage two\n  \n\nEnd\n";
        assert_eq!(join_pages(raw), "Page one\n\nPage two\n\nEnd");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(MAX_TEXT_LENGTH);
        let out = truncate(&text);
        assert!(out.len() <= MAX_TEXT_LENGTH);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
