use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use caixa_core::{Category, RefEntry, Sale, Transaction, DEFAULT_CATEGORIES};

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL DEFAULT '',
            icon TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            phone TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            value TEXT NOT NULL,
            kind TEXT NOT NULL,
            status TEXT NOT NULL,
            category_id TEXT REFERENCES categories(id),
            account_id TEXT REFERENCES accounts(id),
            description TEXT NOT NULL,
            external_id TEXT UNIQUE,
            is_ai_extracted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sales (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            value TEXT NOT NULL,
            weight TEXT,
            shipping TEXT,
            client_id TEXT REFERENCES contacts(id),
            client_name TEXT,
            seller TEXT,
            dev_code TEXT,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed_default_categories(pool: &DbPool) -> Result<(), sqlx::Error> {
    for (name, color, icon) in DEFAULT_CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO categories (id, name, color, icon) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(color)
            .bind(icon)
            .execute(pool)
            .await?;
    }
    Ok(())
}

// ── Reference snapshots ───────────────────────────────────────────────────────

pub async fn list_categories(pool: &DbPool) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String, String, String)>(
        "SELECT id, name, color, icon FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, color, icon)| Category { id, name, color, icon })
        .collect())
}

pub async fn category_refs(pool: &DbPool) -> Result<Vec<RefEntry>, sqlx::Error> {
    ref_entries(pool, "SELECT id, name FROM categories ORDER BY name").await
}

pub async fn account_refs(pool: &DbPool) -> Result<Vec<RefEntry>, sqlx::Error> {
    ref_entries(pool, "SELECT id, name FROM accounts ORDER BY created_at, name").await
}

pub async fn contact_refs(pool: &DbPool) -> Result<Vec<RefEntry>, sqlx::Error> {
    ref_entries(pool, "SELECT id, name FROM contacts ORDER BY name").await
}

async fn ref_entries(pool: &DbPool, sql: &str) -> Result<Vec<RefEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(id, name)| RefEntry { id, name }).collect())
}

// ── Reference inserts ─────────────────────────────────────────────────────────

pub async fn insert_category(
    pool: &DbPool,
    name: &str,
    color: &str,
    icon: &str,
) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO categories (id, name, color, icon) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(color)
        .bind(icon)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_account(pool: &DbPool, name: &str) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO accounts (id, name) VALUES (?, ?)")
        .bind(&id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_contact(
    pool: &DbPool,
    name: &str,
    phone: Option<&str>,
) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO contacts (id, name, phone) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(phone)
        .execute(pool)
        .await?;
    Ok(id)
}

// ── Ledger writes ─────────────────────────────────────────────────────────────

pub async fn insert_transaction(pool: &DbPool, tx: &Transaction) -> Result<String, sqlx::Error> {
    let id = tx.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    sqlx::query(
        "INSERT INTO transactions \
         (id, date, value, kind, status, category_id, account_id, description, external_id, is_ai_extracted) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(tx.date.to_string())
    .bind(tx.value.to_string())
    .bind(tx.kind.to_string())
    .bind(tx.status.to_string())
    .bind(&tx.category_id)
    .bind(&tx.account_id)
    .bind(&tx.description)
    .bind(&tx.external_id)
    .bind(tx.ai_extracted as i64)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_sale(pool: &DbPool, sale: &Sale) -> Result<String, sqlx::Error> {
    let id = sale.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    sqlx::query(
        "INSERT INTO sales \
         (id, date, value, weight, shipping, client_id, client_name, seller, dev_code, description) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(sale.date.to_string())
    .bind(sale.value.to_string())
    .bind(sale.weight.map(|w| w.to_string()))
    .bind(sale.shipping.map(|s| s.to_string()))
    .bind(&sale.client_id)
    .bind(&sale.client_name)
    .bind(&sale.seller)
    .bind(&sale.dev_code)
    .bind(&sale.description)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Commit a reviewed import batch inside a single database transaction —
/// all-or-nothing from the workflow's perspective. Rows whose external id
/// was already imported are skipped rather than failing the batch, which
/// keeps statement re-imports idempotent. Returns the number of rows
/// actually written.
pub async fn commit_batch(pool: &DbPool, batch: &[Transaction]) -> Result<usize, sqlx::Error> {
    let mut db_tx = pool.begin().await?;
    let mut committed = 0usize;

    for tx in batch {
        if let Some(external_id) = &tx.external_id {
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT id FROM transactions WHERE external_id = ?")
                    .bind(external_id)
                    .fetch_optional(&mut *db_tx)
                    .await?;
            if existing.is_some() {
                continue;
            }
        }

        let id = tx.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        sqlx::query(
            "INSERT INTO transactions \
             (id, date, value, kind, status, category_id, account_id, description, external_id, is_ai_extracted) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(tx.date.to_string())
        .bind(tx.value.to_string())
        .bind(tx.kind.to_string())
        .bind(tx.status.to_string())
        .bind(&tx.category_id)
        .bind(&tx.account_id)
        .bind(&tx.description)
        .bind(&tx.external_id)
        .bind(tx.ai_extracted as i64)
        .execute(&mut *db_tx)
        .await?;
        committed += 1;
    }

    db_tx.commit().await?;
    Ok(committed)
}

// ── Ledger reads ──────────────────────────────────────────────────────────────

type TransactionRow = (
    String,         // id
    String,         // date
    String,         // value
    String,         // kind
    String,         // status
    Option<String>, // category_id
    Option<String>, // category name (joined)
    Option<String>, // account_id
    String,         // description
    Option<String>, // external_id
    i64,            // is_ai_extracted
);

const TRANSACTION_SELECT: &str = "SELECT t.id, t.date, t.value, t.kind, t.status, \
    t.category_id, c.name, t.account_id, t.description, t.external_id, t.is_ai_extracted \
    FROM transactions t LEFT JOIN categories c ON c.id = t.category_id";

/// Every transaction dated on or before `through`, any status — the
/// accumulated-balance input.
pub async fn transactions_through(
    pool: &DbPool,
    through: NaiveDate,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "{TRANSACTION_SELECT} WHERE t.date <= ? ORDER BY t.date"
    ))
    .bind(through.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(decode_transaction).collect())
}

/// Confirmed transactions dated strictly after `after` and up to (and
/// including) `through` — the forward-projection input. Pending rows are
/// not yet trustworthy commitments and are excluded.
pub async fn confirmed_between(
    pool: &DbPool,
    after: NaiveDate,
    through: NaiveDate,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "{TRANSACTION_SELECT} WHERE t.date > ? AND t.date <= ? AND t.status = 'confirmed' ORDER BY t.date"
    ))
    .bind(after.to_string())
    .bind(through.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(decode_transaction).collect())
}

fn decode_transaction(row: TransactionRow) -> Option<Transaction> {
    let (id, date, value, kind, status, category_id, category_name, account_id, description, external_id, ai) =
        row;
    Some(Transaction {
        id: Some(id),
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?,
        value: Decimal::from_str(&value).ok()?,
        kind: kind.parse().ok()?,
        status: status.parse().ok()?,
        category_id,
        category_name,
        account_id,
        description,
        external_id,
        ai_extracted: ai != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use caixa_core::{TransactionKind, TransactionStatus};

    async fn test_db() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("ledger.db")).await.unwrap();
        (dir, pool)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(d: NaiveDate, value: &str, kind: TransactionKind, status: TransactionStatus) -> Transaction {
        Transaction {
            id: None,
            date: d,
            value: Decimal::from_str(value).unwrap(),
            kind,
            status,
            category_id: None,
            category_name: None,
            account_id: None,
            description: "test".to_string(),
            external_id: None,
            ai_extracted: false,
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent_and_includes_return_category() {
        let (_dir, pool) = test_db().await;
        seed_default_categories(&pool).await.unwrap();
        seed_default_categories(&pool).await.unwrap();

        let categories = list_categories(&pool).await.unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert!(categories.iter().any(|c| c.name == "Devolução"));

        let refs = category_refs(&pool).await.unwrap();
        assert_eq!(refs.len(), DEFAULT_CATEGORIES.len());
    }

    #[tokio::test]
    async fn transaction_round_trip_preserves_fields() {
        let (_dir, pool) = test_db().await;
        seed_default_categories(&pool).await.unwrap();
        let category_id = category_refs(&pool)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.name == "Devolução")
            .unwrap()
            .id;

        let mut row = tx(date(2024, 11, 28), "230.50", TransactionKind::Expense, TransactionStatus::Confirmed);
        row.category_id = Some(category_id.clone());
        row.external_id = Some("TXN001".to_string());
        row.ai_extracted = true;
        insert_transaction(&pool, &row).await.unwrap();

        let loaded = transactions_through(&pool, date(2024, 11, 28)).await.unwrap();
        assert_eq!(loaded.len(), 1);
        let loaded = &loaded[0];
        assert_eq!(loaded.value, Decimal::from_str("230.50").unwrap());
        assert_eq!(loaded.kind, TransactionKind::Expense);
        assert_eq!(loaded.category_id.as_deref(), Some(category_id.as_str()));
        // The join surfaces the display name the rules engine needs.
        assert_eq!(loaded.category_name.as_deref(), Some("Devolução"));
        assert_eq!(loaded.external_id.as_deref(), Some("TXN001"));
        assert!(loaded.ai_extracted);
    }

    #[tokio::test]
    async fn read_windows_respect_dates_and_status() {
        let (_dir, pool) = test_db().await;
        let today = date(2024, 11, 28);

        insert_transaction(&pool, &tx(date(2024, 11, 1), "100.00", TransactionKind::Income, TransactionStatus::Confirmed)).await.unwrap();
        insert_transaction(&pool, &tx(today, "50.00", TransactionKind::Expense, TransactionStatus::Pending)).await.unwrap();
        insert_transaction(&pool, &tx(date(2024, 12, 3), "70.00", TransactionKind::Income, TransactionStatus::Confirmed)).await.unwrap();
        insert_transaction(&pool, &tx(date(2024, 12, 5), "80.00", TransactionKind::Income, TransactionStatus::Pending)).await.unwrap();
        insert_transaction(&pool, &tx(date(2025, 1, 15), "90.00", TransactionKind::Income, TransactionStatus::Confirmed)).await.unwrap();

        // Past window: everything through today, pending included.
        let past = transactions_through(&pool, today).await.unwrap();
        assert_eq!(past.len(), 2);

        // Future window: confirmed only, strictly after today, horizon inclusive.
        let future = confirmed_between(&pool, today, date(2024, 12, 28)).await.unwrap();
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].date, date(2024, 12, 3));
    }

    #[tokio::test]
    async fn commit_batch_writes_all_rows() {
        let (_dir, pool) = test_db().await;
        let batch = vec![
            tx(date(2024, 11, 1), "10.00", TransactionKind::Income, TransactionStatus::Confirmed),
            tx(date(2024, 11, 2), "20.00", TransactionKind::Expense, TransactionStatus::Confirmed),
        ];
        let committed = commit_batch(&pool, &batch).await.unwrap();
        assert_eq!(committed, 2);
        assert_eq!(transactions_through(&pool, date(2024, 11, 30)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn commit_batch_skips_already_imported_external_ids() {
        let (_dir, pool) = test_db().await;
        let mut first = tx(date(2024, 11, 1), "10.00", TransactionKind::Income, TransactionStatus::Confirmed);
        first.external_id = Some("TXN001".to_string());
        assert_eq!(commit_batch(&pool, &[first.clone()]).await.unwrap(), 1);

        // Re-importing the same statement: the duplicate is skipped, the new
        // row lands, and the batch as a whole still succeeds.
        let mut second = tx(date(2024, 11, 2), "20.00", TransactionKind::Expense, TransactionStatus::Confirmed);
        second.external_id = Some("TXN002".to_string());
        let committed = commit_batch(&pool, &[first, second]).await.unwrap();
        assert_eq!(committed, 1);
        assert_eq!(transactions_through(&pool, date(2024, 11, 30)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sale_insert_succeeds_with_optional_fields_absent() {
        let (_dir, pool) = test_db().await;
        let sale = Sale {
            id: None,
            date: date(2024, 11, 28),
            value: Decimal::from_str("350.00").unwrap(),
            weight: None,
            shipping: None,
            client_id: None,
            client_name: Some("Maria Souza".to_string()),
            seller: None,
            dev_code: None,
            description: "Venda de R$ 350,00".to_string(),
        };
        let id = insert_sale(&pool, &sale).await.unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn reference_inserts_round_trip() {
        let (_dir, pool) = test_db().await;
        let account_id = insert_account(&pool, "Nubank").await.unwrap();
        insert_contact(&pool, "Maria Souza", Some("11999990000")).await.unwrap();

        let accounts = account_refs(&pool).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, account_id);
        assert_eq!(accounts[0].name, "Nubank");

        let contacts = contact_refs(&pool).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Maria Souza");
    }
}
