use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionKind};

/// Reserved labels recognized by the direction overrides. Configuration,
/// not code: deployments with different category naming load their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideLabels {
    /// Category display name marking a sale return.
    pub return_category: String,
    /// Description phrase marking a bounced-instrument reversal.
    pub bounced_check_phrase: String,
}

impl Default for OverrideLabels {
    fn default() -> Self {
        Self {
            return_category: "Devolução".to_string(),
            bounced_check_phrase: "Cheque Devolvido".to_string(),
        }
    }
}

/// Which override fired, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideReason {
    /// Income recorded under the return category is really money going back
    /// out: a sale return reduces revenue.
    ReturnCategory,
    /// An expense whose description mentions a bounced check is a reversal
    /// of a previously recorded outflow.
    BouncedInstrument,
}

/// The direction and value all aggregations must consume. The stored
/// `kind` on the row is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveEntry {
    pub direction: TransactionKind,
    pub value: Decimal,
    pub reason: Option<OverrideReason>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassificationRules {
    labels: OverrideLabels,
}

impl ClassificationRules {
    pub fn new(labels: OverrideLabels) -> Self {
        Self { labels }
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        let labels: OverrideLabels =
            toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
        Ok(Self::new(labels))
    }

    /// Evaluate both overrides against one transaction. The two rules test
    /// opposite starting directions, so at most one can fire; re-applying
    /// with the same inputs yields the same answer.
    pub fn effective(&self, tx: &Transaction) -> EffectiveEntry {
        let is_return =
            tx.category_name.as_deref() == Some(self.labels.return_category.as_str());
        let is_bounced = tx.description.contains(&self.labels.bounced_check_phrase);

        let (direction, reason) = match tx.kind {
            TransactionKind::Income if is_return => {
                (TransactionKind::Expense, Some(OverrideReason::ReturnCategory))
            }
            TransactionKind::Expense if is_bounced => {
                (TransactionKind::Income, Some(OverrideReason::BouncedInstrument))
            }
            kind => (kind, None),
        };

        EffectiveEntry { direction, value: tx.value, reason }
    }

    /// Effective value with the direction applied as a sign: income adds,
    /// expense subtracts.
    pub fn signed(&self, tx: &Transaction) -> Decimal {
        let entry = self.effective(tx);
        match entry.direction {
            TransactionKind::Income => entry.value,
            TransactionKind::Expense => -entry.value,
        }
    }
}
