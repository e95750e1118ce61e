// Chunking module
// Splits normalized text into bounded, overlapping windows, or one chunk per
// record when the text is already record-separated.

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::extractor::POLICY_SEPARATOR;

/// Split text into chunks ready for embedding.
///
/// If the text contains the reserved record separator, every non-empty
/// separator-delimited segment becomes one chunk and the size/overlap
/// parameters are ignored. Otherwise the text is tokenized on whitespace and
/// emitted as sliding windows of `chunk_size` tokens advancing by
/// `chunk_size - overlap` tokens, rejoined with single spaces.
///
/// Precondition: `overlap < chunk_size` (enforced by config validation).
/// The window step is additionally clamped to at least one token so a
/// misconfigured caller cannot loop forever.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.contains(POLICY_SEPARATOR) {
        let chunks: Vec<String> = text
            .split(POLICY_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        debug!("Split record-separated text into {} chunks", chunks.len());
        return chunks;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let step = config.chunk_size.saturating_sub(config.overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.chunk_size).min(tokens.len());
        let window = tokens[start..end].join(" ");
        let window = window.trim();
        if !window.is_empty() {
            chunks.push(window.to_string());
        }
        // The final window always reaches the end of the token stream; a
        // further window would contain only overlap material.
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    debug!(
        "Split {} tokens into {} chunks (size {}, overlap {})",
        tokens.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );
    chunks
}
