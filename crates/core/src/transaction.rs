use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction kind: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Confirmed,
    Pending,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Confirmed => write!(f, "confirmed"),
            TransactionStatus::Pending => write!(f, "pending"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "pending" => Ok(TransactionStatus::Pending),
            other => Err(format!("Unknown transaction status: '{other}'")),
        }
    }
}

/// One persisted ledger entry. `value` is always non-negative; the
/// direction of money movement is carried solely by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub date: NaiveDate,
    pub value: Decimal,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub category_id: Option<String>,
    /// Display name of the bound category, when known. Consumed by the
    /// direction-override rules; not authoritative for identity.
    pub category_name: Option<String>,
    pub account_id: Option<String>,
    pub description: String,
    /// Bank-assigned statement id for imported rows; used to keep
    /// re-imports idempotent.
    pub external_id: Option<String>,
    pub ai_extracted: bool,
}

/// Minimal `{id, name}` view of a reference record, snapshotted at request
/// time for the extraction resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    pub id: String,
    pub name: String,
}

impl RefEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        RefEntry { id: id.into(), name: name.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Seed categories for a fresh ledger: (name, color, icon).
/// "Devolução" is the reserved sale-return category consumed by the
/// direction-override rules.
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Vendas", "bg-emerald-500", "payments"),
    ("Fornecedores", "bg-blue-500", "local_shipping"),
    ("Salários", "bg-purple-500", "group"),
    ("Aluguel", "bg-amber-500", "home_work"),
    ("Impostos", "bg-red-500", "receipt_long"),
    ("Frete", "bg-cyan-500", "package_2"),
    ("Material de Escritório", "bg-slate-500", "edit_note"),
    ("Devolução", "bg-rose-500", "undo"),
    ("Outros", "bg-slate-300", "category"),
];
