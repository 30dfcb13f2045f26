// src/services/valuation.rs
use async_trait::async_trait;
use log::{debug, error, info, warn};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::cache::Cache;
use crate::models::{Sourced, Valuation, NOT_AVAILABLE};
use crate::BoxError;

const PE_RATIO_LABEL: &str = "P/E ratio";
const EPS_LABEL: &str = "Earnings per share";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetches the raw quote page for a Google Finance ticker (`SYMBOL:EXCHANGE`).
#[async_trait]
pub trait QuotePageSource: Send + Sync {
    async fn fetch_page(&self, ticker: &str) -> Result<String, BoxError>;
}

pub struct GoogleFinancePages {
    client: Client,
    base_url: String,
}

impl GoogleFinancePages {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://www.google.com")
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        GoogleFinancePages {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuotePageSource for GoogleFinancePages {
    async fn fetch_page(&self, ticker: &str) -> Result<String, BoxError> {
        let url = format!("{}/finance/quote/{}", self.base_url, ticker);
        debug!("Fetching Google Finance page: {}", url);

        let body = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// Which labelled element wins when several yield a number.
///
/// Labels like "P/E ratio" match every ancestor of the label as well as the
/// label itself, so a page usually yields several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// First innermost match in document order: an element none of whose
    /// child elements also carries the label. Ancestors such as `<body>` are
    /// never considered.
    First,
    /// Latest candidate in document order across all matches, ancestors
    /// included. For a single label this is the innermost one.
    #[default]
    Last,
}

pub struct ValuationScraper {
    pages: Arc<dyn QuotePageSource>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    policy: MatchPolicy,
}

impl ValuationScraper {
    pub fn new(pages: Arc<dyn QuotePageSource>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        ValuationScraper {
            pages,
            cache,
            ttl,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// P/E ratio and EPS for `ticker`. Missing fields come back as "N/A",
    /// a failed page fetch as "Error" in both fields.
    pub async fn scrape(&self, ticker: &str) -> Sourced<Valuation> {
        let cache_key = format!("googleFinance:{}", ticker);
        if let Some(cached) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<Valuation>(&cached) {
                Ok(valuation) => return Sourced::Cached(valuation),
                Err(e) => warn!("Ignoring unreadable cached valuation for {}: {}", ticker, e),
            }
        }

        let html = match self.pages.fetch_page(ticker).await {
            Ok(html) => html,
            Err(e) => {
                error!("Error fetching Google Finance data for {}: {}", ticker, e);
                return Sourced::Fallback(Valuation::error());
            }
        };

        let valuation = extract_valuation(&html, self.policy);
        match serde_json::to_string(&valuation) {
            Ok(json) => self.cache.set(&cache_key, &json, self.ttl).await,
            Err(e) => warn!("Could not serialize valuation for {}: {}", ticker, e),
        }
        info!("Fetched Google Finance data for {}: {:?}", ticker, valuation);
        Sourced::Live(valuation)
    }
}

pub fn extract_valuation(html: &str, policy: MatchPolicy) -> Valuation {
    let document = Html::parse_document(html);
    let found = |label: &str| {
        find_labelled_number(&document, label, policy).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };
    Valuation {
        pe_ratio: found(PE_RATIO_LABEL),
        latest_earnings: found(EPS_LABEL),
    }
}

fn find_labelled_number(document: &Html, label: &str, policy: MatchPolicy) -> Option<String> {
    let paragraphs = Selector::parse("p").unwrap();

    let matches = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| has_label(*el, label));

    match policy {
        MatchPolicy::First => matches
            .filter(|el| !el.children().filter_map(ElementRef::wrap).any(|c| has_label(c, label)))
            .find_map(|el| numeric_candidate(el, &paragraphs)),
        MatchPolicy::Last => matches.filter_map(|el| numeric_candidate(el, &paragraphs)).last(),
    }
}

fn has_label(el: ElementRef, label: &str) -> bool {
    el.text().collect::<String>().contains(label)
}

/// Looks for the value next to a label: the following sibling, then any
/// `<p>` inside the label, then whatever follows the label's parent.
fn numeric_candidate(el: ElementRef, paragraphs: &Selector) -> Option<String> {
    let next_sibling = || next_element(el).map(trimmed_text);
    let paragraph = || {
        let text: String = el
            .select(paragraphs)
            .filter(|p| p.id() != el.id())
            .flat_map(|p| p.text())
            .collect();
        Some(text.trim().to_string())
    };
    let parent_sibling = || {
        el.parent()
            .and_then(ElementRef::wrap)
            .and_then(next_element)
            .map(trimmed_text)
    };

    next_sibling()
        .filter(|t| starts_with_number(t))
        .or_else(|| paragraph().filter(|t| starts_with_number(t)))
        .or_else(|| parent_sibling().filter(|t| starts_with_number(t)))
}

fn next_element(el: ElementRef) -> Option<ElementRef> {
    el.next_siblings().find_map(ElementRef::wrap)
}

fn trimmed_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap())
}

/// True when the text begins with a finite decimal number ("24.5", "-3.1x", "1,204.50").
pub fn starts_with_number(text: &str) -> bool {
    leading_number()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map_or(false, f64::is_finite)
}
