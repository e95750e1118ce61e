// Answer composition
// Routes questions to the Federal Register lookup or the RAG pipeline
// and renders a grounded answer, with a deterministic fallback when the
// generation model is unavailable.


use std::sync::LazyLock;

use fancy_regex::Regex;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::Result;
use crate::embeddings::{EmbeddingProvider, GenerationProvider};
use crate::federal_register::FederalRegisterClient;
use crate::indexer::IndexingService;
use crate::store::SearchResult;

const NOT_FOUND_ANSWER: &str =
    "I couldn't find any information about that in my knowledge base.";

static EO_QUESTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bis (executive order|eo)\s*\d+\b",
        r"\bstatus of (executive order|eo)\s*\d+\b",
        r"\bcurrent status.*(executive order|eo)\s*\d+\b",
        r"\b(has|have) (executive order|eo)\s*\d+ (been )?(repealed|amended)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static EO_NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(executive order|eo)\s*(\d+)").ok());

/// A piece of context handed to the generation model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnippet {
    pub text: String,
    pub source: String,
}

impl From<&SearchResult> for ContextSnippet {
    fn from(result: &SearchResult) -> Self {
        Self {
            text: result.content.clone(),
            source: result.source.clone(),
        }
    }
}

/// Where an answer's supporting material came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Document,
    Api,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub kind: SourceKind,
}

/// Final answer plus its de-duplicated supporting sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Whether the question asks about the status of a specific executive order
#[inline]
pub fn is_executive_order_question(question: &str) -> bool {
    let lowered = question.to_lowercase();
    EO_QUESTION_PATTERNS
        .iter()
        .any(|p| p.is_match(&lowered).unwrap_or(false))
}

/// Pull the executive order number out of a question, if present
#[inline]
pub fn extract_order_number(question: &str) -> Option<String> {
    let pattern = EO_NUMBER_PATTERN.as_ref()?;
    let captures = pattern.captures(question).ok().flatten()?;
    captures.get(2).map(|m| m.as_str().to_string())
}

fn no_context_prompt(question: &str) -> String {
    format!(
        r#"You are 'Policy Navigator', a helpful AI assistant specializing in government policies and regulations.

User: "{question}"

Instructions:
- If the user is greeting you (hi, hello, etc.), respond with a minimal greeting like "Hello! How can I help you today?"
- If it's a question but no relevant information was found, say "I couldn't find any information about that in my knowledge base."
- Be concise and professional

Response:"#
    )
}

fn grounded_prompt(question: &str, snippets: &[ContextSnippet]) -> String {
    let combined_context = snippets
        .iter()
        .take(5)
        .map(|s| s.text.as_str())
        .join("\n\n---\n\n");

    format!(
        r#"You are 'Policy Navigator', a helpful AI assistant.
Answer the user's question based on the provided context.

Context:
"""
{combined_context}
"""

Question: "{question}"

Instructions:
- Answer ONLY based on the provided context
- Be direct and specific
- If the context doesn't contain enough information, say so
- Do NOT respond with greetings

Answer:"#
    )
}

/// Render an answer without the generation model: a fixed not-found line
/// when there is no context, otherwise short excerpts of the top snippets.
fn fallback_answer(snippets: &[ContextSnippet]) -> String {
    if snippets.is_empty() {
        return NOT_FOUND_ANSWER.to_string();
    }

    let mut response = String::from("Based on the information I found:\n\n");
    for snippet in snippets.iter().take(3) {
        let excerpt: String = snippet.text.chars().take(200).collect();
        response.push_str(&format!("From {}: {}...\n\n", snippet.source, excerpt));
    }
    response
}

/// Produce an answer for `question` grounded in `snippets`, falling back
/// to a deterministic rendering when generation fails or returns nothing.
#[inline]
pub fn generate_answer<G: GenerationProvider>(
    generator: &G,
    question: &str,
    snippets: &[ContextSnippet],
) -> String {
    let prompt = if snippets.is_empty() {
        no_context_prompt(question)
    } else {
        grounded_prompt(question, snippets)
    };

    match generator.generate(&prompt) {
        Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
        Ok(_) => {
            warn!("Generation model returned an empty answer, using fallback");
            fallback_answer(snippets)
        }
        Err(e) => {
            warn!("Generation failed: {}, using fallback", e);
            fallback_answer(snippets)
        }
    }
}

/// Answer a question end to end.
///
/// Executive-order status questions route through the Federal Register
/// lookup; everything else retrieves the nearest indexed chunks and
/// grounds the generation model in them. An embedding-service outage on
/// the retrieval path propagates to the caller; it means "try again",
/// not "nothing found".
#[inline]
pub async fn answer_question<E: EmbeddingProvider, G: GenerationProvider>(
    index: &IndexingService<E>,
    generator: &G,
    federal_register: &FederalRegisterClient,
    question: &str,
) -> Result<Answer> {
    let question = question.trim();

    if is_executive_order_question(question) {
        if let Some(number) = extract_order_number(question) {
            debug!("Routing question to Federal Register lookup for EO {}", number);
            return Ok(answer_order_question(generator, federal_register, question, &number));
        }
    }

    let results = index.query(question).await?;
    let snippets: Vec<ContextSnippet> = results.iter().map(ContextSnippet::from).collect();

    let text = generate_answer(generator, question, &snippets);
    let sources = results
        .iter()
        .map(|r| r.source.clone())
        .unique()
        .take(3)
        .map(|name| Source {
            name,
            kind: SourceKind::Document,
        })
        .collect();

    Ok(Answer { text, sources })
}

fn answer_order_question<G: GenerationProvider>(
    generator: &G,
    federal_register: &FederalRegisterClient,
    question: &str,
    number: &str,
) -> Answer {
    let status = match federal_register.order_status(number) {
        Ok(status) => status,
        Err(e) => {
            warn!("Federal Register lookup failed for EO {}: {}", number, e);
            return Answer {
                text: format!("Executive Order {} not found.", number),
                sources: Vec::new(),
            };
        }
    };

    let context = format!(
        "Executive Order {}:\nTitle: {}\nDate: {}\nStatus: {}\n",
        status.number, status.title, status.publication_date, status.disposition
    );
    let snippets = vec![ContextSnippet {
        text: context,
        source: "Federal Register API".to_string(),
    }];

    let text = generate_answer(generator, question, &snippets);
    Answer {
        text,
        sources: vec![Source {
            name: format!("Federal Register - EO {}", status.number),
            kind: SourceKind::Api,
        }],
    }
}
