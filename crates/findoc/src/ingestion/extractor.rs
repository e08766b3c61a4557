//! Document text extraction

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Turns a stored document into raw text
pub trait DocumentExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Extractor for stored uploads
///
/// PDFs go through `pdf-extract` with a `lopdf` content-stream fallback;
/// anything else that is valid UTF-8 is taken as plain text.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    pdf_timeout: Duration,
}

impl Default for FileExtractor {
    fn default() -> Self {
        Self {
            pdf_timeout: Duration::from_secs(60),
        }
    }
}

impl FileExtractor {
    fn extract_pdf(&self, path: &Path, data: Vec<u8>) -> Result<String> {
        let (tx, rx) = mpsc::channel();
        let fallback_data = data.clone();

        // pdf-extract can hang on broken font tables
        let handle = thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text_from_mem(&data));
        });

        let text = match rx.recv_timeout(self.pdf_timeout) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                text
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed for {}: {}, trying fallback", path.display(), e);
                Self::extract_pdf_fallback(path, &fallback_data)?
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "PDF extraction timeout after {}s for {}",
                    self.pdf_timeout.as_secs(),
                    path.display()
                );
                Self::extract_pdf_fallback(path, &fallback_data)?
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed for {}", path.display());
                Self::extract_pdf_fallback(path, &fallback_data)?
            }
        };

        Ok(cleanup_text(&text))
    }

    /// Fallback PDF text extraction using lopdf directly
    fn extract_pdf_fallback(path: &Path, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| {
            Error::extraction(path.display().to_string(), format!("Failed to load PDF: {}", e))
        })?;

        let mut all_text = String::new();
        for (page_num, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let text = text_from_content_stream(&content);
                    if !text.is_empty() {
                        all_text.push_str(&format!("\n--- Page {} ---\n", page_num));
                        all_text.push_str(&text);
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not get content for page {}: {}", page_num, e);
                }
            }
        }

        Ok(all_text)
    }
}

impl DocumentExtractor for FileExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path).map_err(|e| {
            Error::extraction(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let text = if data.starts_with(b"%PDF") {
            self.extract_pdf(path, data)?
        } else {
            String::from_utf8(data).map_err(|_| {
                Error::extraction(path.display().to_string(), "Unsupported document format")
            })?
        };

        if text.trim().is_empty() {
            return Err(Error::extraction(
                path.display().to_string(),
                "No text content could be extracted; the document may be image-based",
            ));
        }

        Ok(text)
    }
}

/// Strip null bytes, ligatures and blank lines left by PDF text layers
fn cleanup_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull literal strings out of `Tj`/`TJ` operators between BT/ET
fn text_from_content_stream(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current = String::new();

    for line in content_str.lines() {
        let line = line.trim();

        match line {
            "BT" => {
                in_text_block = true;
                continue;
            }
            "ET" => {
                in_text_block = false;
                if !current.is_empty() {
                    text.push_str(&current);
                    text.push(' ');
                    current.clear();
                }
                continue;
            }
            _ => {}
        }

        if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) {
            if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                if start < end {
                    let decoded = line[start + 1..end]
                        .replace("\\n", "\n")
                        .replace("\\(", "(")
                        .replace("\\)", ")")
                        .replace("\\\\", "\\");
                    current.push_str(&decoded);
                }
            }
        }
    }

    text
}
