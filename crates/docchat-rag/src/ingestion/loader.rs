//! PDF loading with per-page text extraction

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Document, Page};

/// A loaded PDF: the document record and its pages in page order
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    pub document: Document,
    pub pages: Vec<Page>,
}

/// Reads PDFs and extracts one text record per page
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

impl PdfLoader {
    /// Load a PDF from disk
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| Error::load(&display, e.to_string()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| display.clone());

        self.load_bytes(&filename, &bytes)
            .map_err(|e| match e {
                Error::Load { message, .. } => Error::load(display, message),
                other => other,
            })
    }

    /// Load a PDF held in memory
    pub fn load_bytes(&self, filename: &str, bytes: &[u8]) -> Result<LoadedPdf> {
        let pdf = lopdf::Document::load_mem(bytes)
            .map_err(|e| Error::load(filename, format!("not a valid PDF: {}", e)))?;

        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        let document = Document::new(filename, bytes, page_numbers.len());

        let pages = page_numbers
            .into_iter()
            .map(|number| {
                let text = match pdf.extract_text(&[number]) {
                    Ok(raw) => normalize_text(&raw),
                    Err(e) => {
                        tracing::debug!(filename, page = number, error = %e, "No extractable text on page");
                        String::new()
                    }
                };
                Page {
                    document_id: document.id,
                    filename: document.filename.clone(),
                    number,
                    text,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            filename,
            pages = pages.len(),
            chars = pages.iter().map(Page::char_len).sum::<usize>(),
            "Loaded PDF"
        );

        Ok(LoadedPdf { document, pages })
    }
}

/// Strip NUL characters, trim every line and drop blank lines
pub fn normalize_text(raw: &str) -> String {
    raw.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
