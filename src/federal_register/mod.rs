// Federal Register API client
// Looks up executive order status, amendments, and repeals


use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FederalRegisterConfig;

/// Client for the Federal Register documents API
pub struct FederalRegisterClient {
    base_url: Url,
    agent: ureq::Agent,
}

/// Current disposition of an executive order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDisposition {
    Active,
    Repealed,
    NotFound,
}

impl std::fmt::Display for OrderDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Repealed => write!(f, "Repealed"),
            Self::NotFound => write!(f, "Not found in Federal Register"),
        }
    }
}

/// A later document that amends or repeals an executive order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub document_number: Option<String>,
    pub title: Option<String>,
    pub publication_date: Option<String>,
}

/// Full status record for one executive order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatus {
    pub number: String,
    pub title: String,
    pub publication_date: String,
    pub disposition: OrderDisposition,
    pub html_url: Option<String>,
    pub amendments: Vec<Modification>,
    pub repeals: Vec<Modification>,
}

impl OrderStatus {
    fn not_found(number: &str) -> Self {
        Self {
            number: number.to_string(),
            title: "Unknown".to_string(),
            publication_date: "Unknown".to_string(),
            disposition: OrderDisposition::NotFound,
            html_url: None,
            amendments: Vec::new(),
            repeals: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    document_number: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

impl FederalRegisterClient {
    #[inline]
    pub fn new(config: &FederalRegisterConfig) -> Result<Self> {
        let base_url =
            Url::parse(&config.base_url).context("Invalid Federal Register base URL")?;

        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self {
            base_url,
            agent: ureq::Agent::new_with_config(agent_config),
        })
    }

    /// Look up the status of an executive order by number.
    ///
    /// The number is cleaned to its digits first. An exact executive-order
    /// search runs first; if it finds nothing, a broader term search is
    /// tried. No hit anywhere, or a network failure on the search steps,
    /// yields the standardized not-found record. The follow-up check for
    /// amendments and repeals failing leaves the status as found.
    #[inline]
    pub fn order_status(&self, order_number: &str) -> Result<OrderStatus> {
        let cleaned: String = order_number.chars().filter(char::is_ascii_digit).collect();
        if cleaned.is_empty() {
            warn!("Order number {:?} contains no digits", order_number);
            return Ok(OrderStatus::not_found(order_number));
        }

        info!("Searching Federal Register for Executive Order {}", cleaned);

        let mut results = self.search_executive_orders(&cleaned).unwrap_or_else(|e| {
            warn!("Executive order search failed: {}", e);
            Vec::new()
        });

        if results.is_empty() {
            debug!("Exact search empty, trying general search");
            results = self.general_search(&cleaned).unwrap_or_else(|e| {
                warn!("General search failed: {}", e);
                Vec::new()
            });
        }

        let Some(original) = results.into_iter().next() else {
            warn!("No results found for Executive Order {}", cleaned);
            return Ok(OrderStatus::not_found(&cleaned));
        };

        let mut status = OrderStatus {
            number: cleaned.clone(),
            title: original.title.unwrap_or_else(|| "Unknown".to_string()),
            publication_date: original
                .publication_date
                .unwrap_or_else(|| "Unknown".to_string()),
            disposition: OrderDisposition::Active,
            html_url: original.html_url,
            amendments: Vec::new(),
            repeals: Vec::new(),
        };

        if let Err(e) = self.check_for_modifications(&cleaned, &mut status) {
            warn!("Modification check failed for EO {}: {}", cleaned, e);
        }

        Ok(status)
    }

    /// Exact search constrained to presidential executive orders
    fn search_executive_orders(&self, number: &str) -> Result<Vec<DocumentRecord>> {
        let mut url = self.documents_url()?;
        url.query_pairs_mut()
            .append_pair("conditions[type]", "PRESDOCU")
            .append_pair("conditions[presidential_document_type]", "executive_order")
            .append_pair("conditions[term]", &format!("Executive Order {}", number))
            .append_pair("per_page", "10")
            .append_pair("fields[]", "document_number")
            .append_pair("fields[]", "title")
            .append_pair("fields[]", "publication_date")
            .append_pair("fields[]", "html_url");

        self.fetch_results(&url)
    }

    /// Broader term-only search used when the exact search finds nothing
    fn general_search(&self, number: &str) -> Result<Vec<DocumentRecord>> {
        let mut url = self.documents_url()?;
        url.query_pairs_mut()
            .append_pair("conditions[term]", number)
            .append_pair("per_page", "5");

        self.fetch_results(&url)
    }

    /// Scan later presidential documents for amendments and repeals. A
    /// title mentioning revocation or repeal flips the disposition to
    /// Repealed; a title mentioning amendment is collected as an amendment.
    fn check_for_modifications(&self, number: &str, status: &mut OrderStatus) -> Result<()> {
        let term = format!("\"Executive Order {}\" AND (amend OR revoke OR repeal)", number);

        let mut url = self.documents_url()?;
        url.query_pairs_mut()
            .append_pair("conditions[term]", &term)
            .append_pair("conditions[type]", "PRESDOCU")
            .append_pair("per_page", "20")
            .append_pair("fields[]", "document_number")
            .append_pair("fields[]", "title")
            .append_pair("fields[]", "publication_date");

        for document in self.fetch_results(&url)? {
            let title_lower = document
                .title
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            let modification = Modification {
                document_number: document.document_number,
                title: document.title,
                publication_date: document.publication_date,
            };

            if title_lower.contains("revok") || title_lower.contains("repeal") {
                status.disposition = OrderDisposition::Repealed;
                status.repeals.push(modification);
            } else if title_lower.contains("amend") {
                status.amendments.push(modification);
            }
        }

        Ok(())
    }

    fn documents_url(&self) -> Result<Url> {
        self.base_url
            .join("/api/v1/documents.json")
            .context("Failed to build Federal Register URL")
    }

    fn fetch_results(&self, url: &Url) -> Result<Vec<DocumentRecord>> {
        debug!("GET {}", url);

        let body = self
            .agent
            .get(url.as_str())
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Federal Register request failed")?;

        let response: SearchResponse =
            serde_json::from_str(&body).context("Failed to parse Federal Register response")?;

        debug!("Received {} results", response.results.len());
        Ok(response.results)
    }
}
