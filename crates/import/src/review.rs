use chrono::NaiveDate;
use rust_decimal::Decimal;

use caixa_core::{RefEntry, Transaction, TransactionKind, TransactionStatus};
use caixa_extract::{ExtractionRequest, ExtractionResolver};

use crate::ofx::StatementRecord;

/// Marker prefixed to the bank memo so the model knows it is looking at a
/// statement line, not a chat message.
const BANK_CONTEXT_PREFIX: &str = "Transação Bancária";

/// One imported statement row under human review: a statement record
/// merged with whatever the resolver produced, editable until the batch
/// is committed or the row discarded.
#[derive(Debug, Clone)]
pub struct TransactionCandidate {
    pub external_id: String,
    pub date: NaiveDate,
    /// Absolute amount; the movement direction lives in `direction`.
    pub value: Decimal,
    pub direction: TransactionKind,
    pub category_id: Option<String>,
    pub account_id: Option<String>,
    /// Editable description, seeded from the bank memo.
    pub description: String,
    /// The original bank memo, kept verbatim for re-classification.
    pub memo: String,
    pub suggested_category: Option<String>,
    pub ai_refined: bool,
    pub discarded: bool,
}

/// Seed one candidate per statement record. Direction defaults from the
/// amount's sign (non-negative → income) and the account from the first
/// snapshot entry; both stay overridable by the reviewer.
pub fn seed_candidates(
    records: Vec<StatementRecord>,
    default_account: Option<&RefEntry>,
) -> Vec<TransactionCandidate> {
    records
        .into_iter()
        .map(|record| {
            let direction = if record.amount.is_sign_negative() {
                TransactionKind::Expense
            } else {
                TransactionKind::Income
            };
            TransactionCandidate {
                external_id: record.external_id,
                date: record.posted,
                value: record.amount.abs(),
                direction,
                category_id: None,
                account_id: default_account.map(|account| account.id.clone()),
                description: record.memo.clone(),
                memo: record.memo,
                suggested_category: None,
                ai_refined: false,
                discarded: false,
            }
        })
        .collect()
}

/// Re-classify a single candidate. Always re-invokes the resolver — this
/// is an explicit user request, so an existing binding is no reason to
/// skip. A chain miss leaves the candidate untouched and editable.
pub async fn classify_one(
    resolver: &ExtractionResolver,
    candidate: &mut TransactionCandidate,
    categories: &[RefEntry],
    accounts: &[RefEntry],
) {
    let request = ExtractionRequest {
        content: format!("{BANK_CONTEXT_PREFIX}: {}", candidate.memo),
        categories: categories.to_vec(),
        accounts: accounts.to_vec(),
        contacts: Vec::new(),
    };

    match resolver.resolve(&request).await {
        Some(result) => {
            candidate.category_id = result.category_id;
            candidate.suggested_category = result.suggested_category;
            if !result.description.is_empty() {
                candidate.description = result.description;
            }
            candidate.ai_refined = true;
        }
        None => {
            tracing::warn!(
                external_id = %candidate.external_id,
                "no provider produced a classification"
            );
        }
    }
}

/// Classify the whole batch, strictly sequentially to keep inference cost
/// predictable. Candidates that already carry a bound category are skipped,
/// so re-runs are cheap and a reviewer's manual pick is never clobbered.
pub async fn classify_all(
    resolver: &ExtractionResolver,
    candidates: &mut [TransactionCandidate],
    categories: &[RefEntry],
    accounts: &[RefEntry],
) {
    for candidate in candidates.iter_mut() {
        if candidate.category_id.is_some() {
            continue;
        }
        classify_one(resolver, candidate, categories, accounts).await;
    }
}

impl TransactionCandidate {
    /// Convert to a ledger row for the batch commit. Discarded candidates
    /// yield `None` and must never reach storage.
    pub fn into_transaction(self) -> Option<Transaction> {
        if self.discarded {
            return None;
        }
        Some(Transaction {
            id: None,
            date: self.date,
            value: self.value,
            kind: self.direction,
            status: TransactionStatus::Confirmed,
            category_id: self.category_id,
            category_name: None,
            account_id: self.account_id,
            description: self.description,
            external_id: Some(self.external_id),
            ai_extracted: self.ai_refined,
        })
    }
}
