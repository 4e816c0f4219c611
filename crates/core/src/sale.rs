use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A merchandise sale. Separate from the ledger transaction so that order
/// details (weight, shipping, seller, return code) survive alongside the
/// monetary record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Option<String>,
    pub date: NaiveDate,
    pub value: Decimal,
    pub weight: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub seller: Option<String>,
    /// Return authorization code, e.g. "Cód. Dev: 123".
    pub dev_code: Option<String>,
    pub description: String,
}
