use std::fmt;
use std::path::Path;

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

use caixa_core::{
    format_brl, projection, ClassificationRules, ReportRange, Sale, Transaction,
    TransactionStatus,
};
use caixa_extract::{Classification, ExtractionRequest, ExtractionResolver, ExtractionResult};
use caixa_import::{ofx, review};
use caixa_storage::DbPool;

use crate::refresh::RefreshGuard;

#[derive(Debug, Serialize)]
pub struct CommandError {
    pub message: String,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<sqlx::Error> for CommandError {
    fn from(e: sqlx::Error) -> Self {
        CommandError { message: e.to_string() }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError { message: e.to_string() }
    }
}

// ── Statement import ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub parsed: usize,
    pub committed: usize,
    pub candidates: Vec<CandidateView>,
}

#[derive(Debug, Serialize)]
pub struct CandidateView {
    pub external_id: String,
    pub date: NaiveDate,
    pub value: String,
    pub direction: String,
    pub category_id: Option<String>,
    pub suggested_category: Option<String>,
    pub description: String,
}

/// Parse a statement file, seed the review queue, run the classify-all
/// pass, and commit the surviving candidates as confirmed ledger rows.
pub async fn import_statement(
    db: &DbPool,
    resolver: &ExtractionResolver,
    path: &Path,
) -> Result<ImportReport, CommandError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let records = ofx::parse(&raw);
    let parsed = records.len();
    if records.is_empty() {
        tracing::info!("statement contained no importable entries");
        return Ok(ImportReport { parsed: 0, committed: 0, candidates: Vec::new() });
    }

    let categories = caixa_storage::category_refs(db).await?;
    let accounts = caixa_storage::account_refs(db).await?;

    let mut candidates = review::seed_candidates(records, accounts.first());
    review::classify_all(resolver, &mut candidates, &categories, &accounts).await;

    let views = candidates
        .iter()
        .map(|candidate| CandidateView {
            external_id: candidate.external_id.clone(),
            date: candidate.date,
            value: format_brl(candidate.value),
            direction: candidate.direction.to_string(),
            category_id: candidate.category_id.clone(),
            suggested_category: candidate.suggested_category.clone(),
            description: candidate.description.clone(),
        })
        .collect();

    let batch: Vec<Transaction> = candidates
        .into_iter()
        .filter_map(|candidate| candidate.into_transaction())
        .collect();
    let committed = caixa_storage::commit_batch(db, &batch).await?;
    tracing::info!(parsed, committed, "statement import complete");

    Ok(ImportReport { parsed, committed, candidates: views })
}

// ── Free-text classification ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub outcome: ExtractionResult,
    /// Where the record landed, if anywhere. Discarded results are
    /// reported but never persisted.
    pub stored: Option<StoredRef>,
}

#[derive(Debug, Serialize)]
pub struct StoredRef {
    pub kind: &'static str,
    pub id: String,
}

pub async fn classify_message(
    db: &DbPool,
    resolver: &ExtractionResolver,
    content: &str,
) -> Result<Option<ClassifyReport>, CommandError> {
    let request = ExtractionRequest {
        content: content.to_string(),
        categories: caixa_storage::category_refs(db).await?,
        accounts: caixa_storage::account_refs(db).await?,
        contacts: caixa_storage::contact_refs(db).await?,
    };

    let Some(result) = resolver.resolve(&request).await else {
        return Ok(None);
    };

    let today = Local::now().date_naive();
    let stored = match result.classification {
        Classification::Discard => None,
        Classification::Sale => {
            let sale = Sale {
                id: None,
                date: result.date.unwrap_or(today),
                value: result.value,
                weight: result.weight,
                shipping: result.shipping,
                client_id: result.client_id.clone(),
                client_name: (!result.client_name.is_empty()).then(|| result.client_name.clone()),
                seller: result.seller.clone(),
                dev_code: result.dev_code.clone(),
                description: result.description.clone(),
            };
            let id = caixa_storage::insert_sale(db, &sale).await?;
            Some(StoredRef { kind: "sale", id })
        }
        Classification::Transaction => {
            let tx = Transaction {
                id: None,
                date: result.date.unwrap_or(today),
                value: result.value,
                kind: result.direction,
                status: TransactionStatus::Pending,
                category_id: result.category_id.clone(),
                category_name: None,
                account_id: result.account_id.clone(),
                description: result.description.clone(),
                external_id: None,
                ai_extracted: true,
            };
            let id = caixa_storage::insert_transaction(db, &tx).await?;
            Some(StoredRef { kind: "transaction", id })
        }
    };

    Ok(Some(ClassifyReport { outcome: result, stored }))
}

// ── Cash-flow projection ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProjectionReport {
    pub current_balance: String,
    pub points: Vec<ProjectionPointView>,
}

#[derive(Debug, Serialize)]
pub struct ProjectionPointView {
    pub date: NaiveDate,
    pub balance: String,
}

/// Compute today's balance and the forward daily series. Returns `None`
/// when a newer refresh superseded this one mid-flight.
pub async fn project_cash_flow(
    db: &DbPool,
    rules: &ClassificationRules,
    guard: &RefreshGuard,
    horizon_days: u32,
) -> Result<Option<ProjectionReport>, CommandError> {
    let ticket = guard.begin();
    let today = Local::now().date_naive();
    let horizon_end = today + Days::new(u64::from(horizon_days));

    // No ordering dependency between the two fetches.
    let (past, future) = tokio::join!(
        caixa_storage::transactions_through(db, today),
        caixa_storage::confirmed_between(db, today, horizon_end),
    );
    let (past, future) = (past?, future?);

    if !guard.is_current(ticket) {
        tracing::debug!("projection refresh superseded, discarding result");
        return Ok(None);
    }

    let opening = projection::current_balance(rules, &past);
    let points = projection::project(rules, opening, &future, today, horizon_days);

    Ok(Some(ProjectionReport {
        current_balance: format_brl(opening),
        points: points
            .into_iter()
            .map(|point| ProjectionPointView {
                date: point.date,
                balance: format_brl(point.balance),
            })
            .collect(),
    }))
}

// ── Period totals ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TotalsReport {
    pub range: String,
    pub income: String,
    pub expense: String,
    pub balance: String,
}

pub async fn totals(
    db: &DbPool,
    rules: &ClassificationRules,
    range: ReportRange,
) -> Result<TotalsReport, CommandError> {
    let window = range.date_range(Local::now().date_naive());
    let mut ledger = caixa_storage::transactions_through(db, window.end).await?;
    // Pending rows are not yet part of the books.
    ledger.retain(|tx| tx.status == TransactionStatus::Confirmed);

    let totals = projection::period_totals(rules, &ledger, window);
    Ok(TotalsReport {
        range: range.to_string(),
        income: format_brl(totals.income),
        expense: format_brl(totals.expense),
        balance: format_brl(totals.balance),
    })
}
