pub mod money;
pub mod period;
pub mod projection;
pub mod rules;
pub mod sale;
pub mod transaction;

pub use money::{format_brl, parse_brl, MoneyError};
pub use period::{DateRange, ReportRange};
pub use projection::{current_balance, period_totals, project, PeriodTotals, ProjectionPoint};
pub use rules::{ClassificationRules, EffectiveEntry, OverrideLabels, OverrideReason};
pub use sale::Sale;
pub use transaction::{
    BankAccount, Category, Contact, RefEntry, Transaction, TransactionKind, TransactionStatus,
    DEFAULT_CATEGORIES,
};
