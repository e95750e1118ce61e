// Text extraction module
// Converts source files into a normalized text blob, routed by extension.
// Extraction failures degrade to an empty string so that one bad file can
// never abort a bulk index run.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use lopdf::Document;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

/// Reserved token separating per-record blocks in tabular extractions.
/// Not expected to appear in natural text; the chunker splits on it.
pub const POLICY_SEPARATOR: &str = "===POLICY_SEPARATOR===";

/// Extensions accepted at the upload boundary and during directory scans
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["csv", "pdf", "json", "txt"];

const CSV_FIELDS: [(&str, &str, &str); 5] = [
    ("Policy_Name", "Policy", "N/A"),
    ("Policy_ID", "Policy ID", "N/A"),
    ("Description", "Description", "No description provided."),
    ("Status", "Status", "N/A"),
    ("Effective_Date", "Effective Date", "N/A"),
];

/// Whether a path carries one of the supported extensions (case-insensitive)
#[inline]
pub fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Extract text from a file, routed by extension.
///
/// Returns an empty string for unsupported extensions and for any file that
/// fails to read or parse; both cases are logged, never raised.
#[inline]
pub fn extract_file(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let result = match extension.as_str() {
        "csv" => read_csv(path),
        "pdf" => read_pdf(path),
        "json" => read_json(path),
        "txt" => read_txt(path),
        _ => {
            warn!(
                "Unsupported file type '{}' for file: {}",
                extension,
                path.display()
            );
            return String::new();
        }
    };

    match result {
        Ok(text) => text,
        Err(e) => {
            error!("Error reading {}: {:#}", path.display(), e);
            String::new()
        }
    }
}

/// Render each CSV record as a fixed block of named fields, substituting a
/// placeholder for missing columns, blocks joined by the reserved separator.
fn read_csv(path: &Path) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let column_index = |name: &str| headers.iter().position(|h| h == name);
    let field_indices: Vec<Option<usize>> = CSV_FIELDS
        .iter()
        .map(|(column, _, _)| column_index(column))
        .collect();

    let mut blocks = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to parse CSV record")?;

        let mut block = String::new();
        for ((_, label, placeholder), index) in CSV_FIELDS.iter().zip(field_indices.iter()) {
            let value = index
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(placeholder);
            block.push_str(label);
            block.push_str(": ");
            block.push_str(value);
            block.push('\n');
        }
        blocks.push(block);
    }

    Ok(blocks.join(&format!("\n{}\n\n", POLICY_SEPARATOR)))
}

/// Concatenate per-page text, joined by newlines. Pages that fail to yield
/// text are silently skipped.
fn read_pdf(path: &Path) -> Result<String> {
    let document = Document::load(path)
        .with_context(|| format!("Failed to load PDF file: {}", path.display()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        if let Ok(page_text) = document.extract_text(&[*page_number]) {
            let page_text = page_text.trim().to_string();
            if !page_text.is_empty() {
                pages.push(page_text);
            }
        }
    }

    Ok(pages.join("\n"))
}

fn read_json(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("Failed to parse JSON")?;
    serde_json::to_string_pretty(&value).context("Failed to serialize JSON")
}

fn read_txt(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file: {}", path.display()))
}
