use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use caixa_core::{money, RefEntry, TransactionKind};

use crate::config::ExtractorConfig;
use crate::prompt::build_prompt;
use crate::provider::InferenceProvider;

/// Free text plus read-only snapshots of the reference lists taken at
/// request time.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub content: String,
    pub categories: Vec<RefEntry>,
    pub accounts: Vec<RefEntry>,
    pub contacts: Vec<RefEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Transaction,
    Sale,
    Discard,
}

/// Wire view of a provider payload. Every field is defaulted so that a
/// model omitting optional keys still produces a structurally valid
/// result; lenient string fields absorb casing drift in enums.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub shipping: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub dev_code: String,
    #[serde(default)]
    pub suggested_category: String,
}

/// Structured output of the pipeline: probabilistic extraction already
/// reduced to canonical types, plus deterministically bound identifiers.
///
/// When `classification` is `Discard` the monetary fields are not
/// authoritative and must never reach the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub value: Decimal,
    pub direction: TransactionKind,
    pub classification: Classification,
    pub category_id: Option<String>,
    pub account_id: Option<String>,
    pub client_id: Option<String>,
    /// Raw name echoes, kept visible for human review when binding missed.
    pub category_name: String,
    pub account_name: String,
    pub client_name: String,
    pub suggested_category: Option<String>,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub weight: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub seller: Option<String>,
    pub dev_code: Option<String>,
}

/// Orchestrates the ordered provider chain and the deterministic
/// post-processing that binds extracted names to identifiers.
pub struct ExtractionResolver {
    providers: Vec<Box<dyn InferenceProvider>>,
}

impl ExtractionResolver {
    pub fn new(providers: Vec<Box<dyn InferenceProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.build_chain())
    }

    /// Configured chain length.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Try each provider in order and stop at the first structurally valid
    /// JSON payload. Provider failures are logged and skipped; exhaustion
    /// yields `None` ("no classification available"), never an error.
    pub async fn resolve(&self, request: &ExtractionRequest) -> Option<ExtractionResult> {
        if request.content.trim().is_empty() {
            // Nothing to classify — never spend a provider call.
            return None;
        }

        let prompt = build_prompt(request);
        for provider in &self.providers {
            match provider.attempt(&prompt).await {
                Ok(payload) => match parse_payload(&payload) {
                    Some(raw) => {
                        tracing::debug!(provider = provider.name(), "extraction payload accepted");
                        return Some(bind(raw, request));
                    }
                    None => {
                        tracing::warn!(
                            provider = provider.name(),
                            "unparseable payload, trying next provider"
                        );
                    }
                },
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "provider failed, trying next"
                    );
                }
            }
        }
        None
    }
}

/// Strip markdown code fences and parse the JSON body.
fn parse_payload(text: &str) -> Option<RawExtraction> {
    let cleaned = text.replace("```json", "").replace("```", "");
    serde_json::from_str(cleaned.trim()).ok()
}

/// Deterministic post-processing: bind names to ids by case-insensitive
/// *exact* match only. A miss leaves the id unbound and the raw name
/// visible for human disambiguation — never a closest-match guess.
fn bind(raw: RawExtraction, request: &ExtractionRequest) -> ExtractionResult {
    let category_id = find_exact(&request.categories, &raw.category_name);
    let account_id = find_exact(&request.accounts, &raw.account_name);
    let client_id = find_exact(&request.contacts, &raw.client_name);

    let direction = match raw.kind.to_lowercase().as_str() {
        "expense" => TransactionKind::Expense,
        _ => TransactionKind::Income,
    };
    let classification = match raw.classification.to_lowercase().as_str() {
        "sale" => Classification::Sale,
        "discard" => Classification::Discard,
        _ => Classification::Transaction,
    };

    ExtractionResult {
        // A malformed value degrades to zero rather than dropping the
        // whole payload; the reviewer still sees the rest of the fields.
        value: money::parse_brl(&raw.value).unwrap_or(Decimal::ZERO),
        direction,
        classification,
        category_id,
        account_id,
        client_id,
        category_name: raw.category_name,
        account_name: raw.account_name,
        client_name: raw.client_name,
        suggested_category: non_empty(raw.suggested_category),
        description: raw.description,
        date: NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d").ok(),
        weight: opt_decimal(&raw.weight),
        shipping: opt_decimal(&raw.shipping),
        seller: non_empty(raw.seller),
        dev_code: non_empty(raw.dev_code),
    }
}

fn find_exact(entries: &[RefEntry], name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let lowered = name.to_lowercase();
    entries
        .iter()
        .find(|entry| entry.name.to_lowercase() == lowered)
        .map(|entry| entry.id.clone())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn opt_decimal(s: &str) -> Option<Decimal> {
    if s.trim().is_empty() {
        return None;
    }
    money::parse_brl(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use std::str::FromStr;
    use std::sync::atomic::Ordering;

    fn request(content: &str) -> ExtractionRequest {
        ExtractionRequest {
            content: content.to_string(),
            categories: vec![RefEntry::new("c1", "Vendas"), RefEntry::new("c2", "Devolução")],
            accounts: vec![RefEntry::new("a1", "Nubank")],
            contacts: vec![RefEntry::new("p1", "Maria Souza")],
        }
    }

    fn payload(category: &str) -> String {
        format!(
            r#"{{"value":"1.234,56","type":"income","classification":"transaction",
                "category_name":"{category}","description":"Recebimento de R$ 1.234,56",
                "date":"2024-11-28","account_name":"nubank","client_name":"maria souza"}}"#
        )
    }

    // ── fallback chain ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn first_valid_payload_wins_and_later_links_are_untouched() {
        let first = MockProvider::failing("one");
        let second = MockProvider::succeeding("two", payload("Vendas"));
        let third = MockProvider::succeeding("three", payload("Devolução"));
        let (c1, c2, c3) = (first.counter(), second.counter(), third.counter());

        let resolver =
            ExtractionResolver::new(vec![Box::new(first), Box::new(second), Box::new(third)]);
        let result = resolver.resolve(&request("Recebi 1.234,56 da Maria")).await.unwrap();

        assert_eq!(result.category_id.as_deref(), Some("c1"));
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
        assert_eq!(c3.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_json_counts_as_failure_and_chain_continues() {
        let garbled = MockProvider::succeeding("garbled", "definitely not json");
        let healthy = MockProvider::succeeding("healthy", payload("Vendas"));
        let (c1, c2) = (garbled.counter(), healthy.counter());

        let resolver = ExtractionResolver::new(vec![Box::new(garbled), Box::new(healthy)]);
        let result = resolver.resolve(&request("Recebi 10,00")).await;

        assert!(result.is_some());
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_yields_none() {
        let resolver = ExtractionResolver::new(vec![
            Box::new(MockProvider::failing("one")),
            Box::new(MockProvider::failing("two")),
        ]);
        assert!(resolver.resolve(&request("Paguei 50,00")).await.is_none());
    }

    #[tokio::test]
    async fn empty_chain_yields_none() {
        let resolver = ExtractionResolver::new(Vec::new());
        assert!(resolver.resolve(&request("Paguei 50,00")).await.is_none());
    }

    #[tokio::test]
    async fn blank_content_short_circuits_without_provider_calls() {
        let provider = MockProvider::succeeding("one", payload("Vendas"));
        let calls = provider.counter();
        let resolver = ExtractionResolver::new(vec![Box::new(provider)]);

        assert!(resolver.resolve(&request("")).await.is_none());
        assert!(resolver.resolve(&request("   ")).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn markdown_fences_are_stripped() {
        let fenced = format!("```json\n{}\n```", payload("Vendas"));
        let resolver =
            ExtractionResolver::new(vec![Box::new(MockProvider::succeeding("one", fenced))]);
        let result = resolver.resolve(&request("Recebi 1.234,56")).await.unwrap();
        assert_eq!(result.value, Decimal::from_str("1234.56").unwrap());
    }

    // ── deterministic binding ─────────────────────────────────────────────────

    #[tokio::test]
    async fn binding_is_case_insensitive_exact() {
        let resolver =
            ExtractionResolver::new(vec![Box::new(MockProvider::succeeding("one", payload("vendas")))]);
        let result = resolver.resolve(&request("Venda de 1.234,56")).await.unwrap();
        assert_eq!(result.category_id.as_deref(), Some("c1"));
        assert_eq!(result.account_id.as_deref(), Some("a1"));
        assert_eq!(result.client_id.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn partial_names_stay_unbound_but_visible() {
        let resolver =
            ExtractionResolver::new(vec![Box::new(MockProvider::succeeding("one", payload("Venda")))]);
        let result = resolver.resolve(&request("Venda de 1.234,56")).await.unwrap();
        assert_eq!(result.category_id, None);
        assert_eq!(result.category_name, "Venda");
    }

    #[tokio::test]
    async fn fields_convert_to_canonical_types() {
        let resolver =
            ExtractionResolver::new(vec![Box::new(MockProvider::succeeding("one", payload("Vendas")))]);
        let result = resolver.resolve(&request("Recebi 1.234,56 dia 28/11/24")).await.unwrap();
        assert_eq!(result.value, Decimal::from_str("1234.56").unwrap());
        assert_eq!(result.direction, TransactionKind::Income);
        assert_eq!(result.classification, Classification::Transaction);
        assert_eq!(result.date, NaiveDate::from_ymd_opt(2024, 11, 28));
    }

    #[tokio::test]
    async fn discard_classification_passes_through() {
        let chatter = r#"{"value":"","type":"","classification":"discard","description":"Bom dia!"}"#;
        let resolver =
            ExtractionResolver::new(vec![Box::new(MockProvider::succeeding("one", chatter))]);
        let result = resolver.resolve(&request("Bom dia!")).await.unwrap();
        assert_eq!(result.classification, Classification::Discard);
        assert_eq!(result.value, Decimal::ZERO);
    }

    #[tokio::test]
    async fn optional_sale_fields_are_extracted() {
        let sale = r#"{"value":"350,00","type":"income","classification":"sale",
            "client_name":"Maria Souza","weight":"1200","shipping":"25,00",
            "seller":"Carlos","dev_code":"Cód. Dev: 123","description":"Venda de R$ 350,00"}"#;
        let resolver =
            ExtractionResolver::new(vec![Box::new(MockProvider::succeeding("one", sale))]);
        let result = resolver.resolve(&request("Venda pra Maria")).await.unwrap();
        assert_eq!(result.classification, Classification::Sale);
        assert_eq!(result.client_id.as_deref(), Some("p1"));
        assert_eq!(result.weight, Some(Decimal::from_str("1200").unwrap()));
        assert_eq!(result.shipping, Some(Decimal::from_str("25.00").unwrap()));
        assert_eq!(result.seller.as_deref(), Some("Carlos"));
        assert_eq!(result.dev_code.as_deref(), Some("Cód. Dev: 123"));
    }
}
