//! OCR result aggregation: JSON result files → one plain-text document.
//!
//! Vision writes `output-<first>-to-<last>.json` files under the output
//! prefix, each an `AnnotateFileResponse` holding up to `batch_size` page
//! responses. Object listings are lexicographic, which would put
//! `output-11-to-12.json` before `output-3-to-4.json`, so files are ordered
//! by their first page number before their text is concatenated.

use crate::error::{JournalError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// One result file: page responses in page order.
#[derive(Debug, Deserialize)]
pub struct AnnotateFileResponse {
    #[serde(default)]
    pub responses: Vec<PageResponse>,
}

/// One page. Blank pages carry no `fullTextAnnotation`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub full_text_annotation: Option<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub text: String,
}

/// Separator between consecutive pages in the extracted text.
pub const PAGE_SEPARATOR: &str = "\n\n";

static RE_PAGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"output-(\d+)-to-(\d+)\.json$").unwrap());

/// Keep only `.json` result objects and order them by first page number.
///
/// Names without a recognisable page range sort after numbered ones, in
/// lexicographic order.
pub fn order_result_files(names: Vec<String>) -> Vec<String> {
    let mut json: Vec<String> = names.into_iter().filter(|n| n.ends_with(".json")).collect();
    json.sort_by_key(|name| (page_range_start(name).unwrap_or(u64::MAX), name.clone()));
    json
}

fn page_range_start(name: &str) -> Option<u64> {
    RE_PAGE_RANGE
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse one result file and return the text of each annotated page.
pub fn page_texts(object: &str, json: &str) -> Result<Vec<String>> {
    let parsed: AnnotateFileResponse =
        serde_json::from_str(json).map_err(|e| JournalError::MalformedResult {
            object: object.to_string(),
            detail: e.to_string(),
        })?;
    Ok(parsed
        .responses
        .into_iter()
        .filter_map(|p| p.full_text_annotation.map(|a| a.text))
        .collect())
}

/// Join page texts with a blank line between pages.
pub fn assemble_pages(pages: &[String]) -> String {
    pages.join(PAGE_SEPARATOR)
}
