// Document text provider abstraction
//
// This is the boundary between document extraction (PDF -> pages of lines and
// tables) and result extraction (pages -> students). Providers wrap whichever
// external PDF text/table extractor produced the page dump.

use crate::types::DocumentText;
use anyhow::{Context, Result};
use std::path::Path;

/// Converts raw document bytes into per-page lines and tables.
///
/// Like any two-stage extractor it works in two steps:
/// 1. Document bytes -> export markup (the raw text the extractor produced)
/// 2. Export markup -> `DocumentText`
pub trait TextProvider {
    /// Step 1: decode the raw export
    fn read_markup(&self, bytes: &[u8]) -> Result<String>;

    /// Step 2: structure the export into pages
    fn parse_markup(&self, markup: &str) -> Result<DocumentText>;

    /// Full extraction, both steps in sequence
    fn extract(&self, bytes: &[u8]) -> Result<DocumentText> {
        let markup = self.read_markup(bytes)?;
        self.parse_markup(&markup)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;

    fn supports_file_type(&self, path: &Path) -> bool;
}

/// Reads a JSON page dump:
///
/// ```text
/// {"pages": [{"lines": ["..."], "tables": [[["cell", null, ...], ...]]}, ...]}
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonTextProvider;

impl JsonTextProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TextProvider for JsonTextProvider {
    fn read_markup(&self, bytes: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(bytes).context("page dump is not valid UTF-8")?;
        // Some extractors write a byte-order mark
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    fn parse_markup(&self, markup: &str) -> Result<DocumentText> {
        let document: DocumentText = serde_json::from_str(markup).context("malformed page dump")?;
        log::debug!("📄 Page dump: {} pages", document.pages.len());
        Ok(document)
    }

    fn name(&self) -> &str {
        "json"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}
