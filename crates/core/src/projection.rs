use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::period::DateRange;
use crate::rules::ClassificationRules;
use crate::transaction::{Transaction, TransactionKind};

/// One day of the forward cash-flow series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub date: NaiveDate,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Accumulated balance over the given past transactions: signed fold of
/// effective values. An empty ledger is simply zero.
pub fn current_balance(rules: &ClassificationRules, past: &[Transaction]) -> Decimal {
    past.iter().map(|tx| rules.signed(tx)).sum()
}

/// Day-by-day projected balance from `today` through `today + horizon_days`,
/// seeded at `opening`. `future` must already be filtered to the
/// transactions allowed to participate (confirmed, dated after today);
/// days without any matching transaction carry the balance forward, so the
/// output always has `horizon_days + 1` points with no gaps.
pub fn project(
    rules: &ClassificationRules,
    opening: Decimal,
    future: &[Transaction],
    today: NaiveDate,
    horizon_days: u32,
) -> Vec<ProjectionPoint> {
    let mut deltas_by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
    for tx in future {
        *deltas_by_day.entry(tx.date).or_default() += rules.signed(tx);
    }

    let mut points = Vec::with_capacity(horizon_days as usize + 1);
    let mut balance = opening;
    for day in 0..=horizon_days {
        let date = today + Days::new(u64::from(day));
        if let Some(delta) = deltas_by_day.get(&date) {
            balance += *delta;
        }
        points.push(ProjectionPoint { date, balance });
    }
    points
}

/// Income/expense/balance totals for the window, with the direction
/// overrides applied. This is the figure dashboards display; summing the
/// stored `kind` directly would misread returns and bounced checks.
pub fn period_totals(
    rules: &ClassificationRules,
    transactions: &[Transaction],
    range: DateRange,
) -> PeriodTotals {
    let mut totals = PeriodTotals::default();
    for tx in transactions.iter().filter(|tx| range.contains(tx.date)) {
        let entry = rules.effective(tx);
        match entry.direction {
            TransactionKind::Income => totals.income += entry.value,
            TransactionKind::Expense => totals.expense += entry.value,
        }
    }
    totals.balance = totals.income - totals.expense;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionStatus;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tx(d: NaiveDate, value: &str, kind: TransactionKind) -> Transaction {
        Transaction {
            id: None,
            date: d,
            value: dec(value),
            kind,
            status: TransactionStatus::Confirmed,
            category_id: None,
            category_name: None,
            account_id: None,
            description: String::new(),
            external_id: None,
            ai_extracted: false,
        }
    }

    // ── current_balance ───────────────────────────────────────────────────────

    #[test]
    fn balance_sums_signed_values() {
        let rules = ClassificationRules::default();
        let ledger = vec![
            tx(date(2024, 11, 1), "500.00", TransactionKind::Income),
            tx(date(2024, 11, 2), "120.00", TransactionKind::Expense),
        ];
        assert_eq!(current_balance(&rules, &ledger), dec("380.00"));
    }

    #[test]
    fn balance_applies_overrides() {
        let rules = ClassificationRules::default();
        let mut returned = tx(date(2024, 11, 3), "50.00", TransactionKind::Income);
        returned.category_name = Some("Devolução".to_string());
        let ledger = vec![tx(date(2024, 11, 1), "500.00", TransactionKind::Income), returned];
        // The return counts as an outflow despite its stored kind.
        assert_eq!(current_balance(&rules, &ledger), dec("450.00"));
    }

    #[test]
    fn empty_ledger_is_zero() {
        let rules = ClassificationRules::default();
        assert_eq!(current_balance(&rules, &[]), Decimal::ZERO);
    }

    // ── project ───────────────────────────────────────────────────────────────

    #[test]
    fn projection_steps_at_transaction_day_and_stays_flat() {
        let rules = ClassificationRules::default();
        let today = date(2024, 11, 28);
        let future = vec![tx(today + Days::new(5), "100.00", TransactionKind::Income)];

        let points = project(&rules, dec("250.00"), &future, today, 10);

        assert_eq!(points.len(), 11);
        for point in &points[..5] {
            assert_eq!(point.balance, dec("250.00"));
        }
        for point in &points[5..] {
            assert_eq!(point.balance, dec("350.00"));
        }
        assert_eq!(points[5].date, today + Days::new(5));
    }

    #[test]
    fn projection_has_no_gaps() {
        let rules = ClassificationRules::default();
        let today = date(2024, 11, 28);
        let points = project(&rules, Decimal::ZERO, &[], today, 30);
        assert_eq!(points.len(), 31);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.date, today + Days::new(i as u64));
            assert_eq!(point.balance, Decimal::ZERO);
        }
    }

    #[test]
    fn projection_balance_can_fall() {
        let rules = ClassificationRules::default();
        let today = date(2024, 11, 28);
        let future = vec![
            tx(today + Days::new(2), "300.00", TransactionKind::Expense),
            tx(today + Days::new(4), "100.00", TransactionKind::Income),
        ];
        let points = project(&rules, dec("200.00"), &future, today, 5);
        assert_eq!(points[1].balance, dec("200.00"));
        assert_eq!(points[2].balance, dec("-100.00"));
        assert_eq!(points[4].balance, dec("0.00"));
    }

    #[test]
    fn projection_applies_overrides_to_future_entries() {
        let rules = ClassificationRules::default();
        let today = date(2024, 11, 28);
        let mut bounced = tx(today + Days::new(3), "80.00", TransactionKind::Expense);
        bounced.description = "Cheque Devolvido #12".to_string();
        let points = project(&rules, Decimal::ZERO, &[bounced], today, 3);
        // The bounced-check reversal adds instead of subtracting.
        assert_eq!(points[3].balance, dec("80.00"));
    }

    #[test]
    fn same_day_transactions_accumulate() {
        let rules = ClassificationRules::default();
        let today = date(2024, 11, 28);
        let day3 = today + Days::new(3);
        let future = vec![
            tx(day3, "100.00", TransactionKind::Income),
            tx(day3, "40.00", TransactionKind::Expense),
        ];
        let points = project(&rules, Decimal::ZERO, &future, today, 4);
        assert_eq!(points[3].balance, dec("60.00"));
        assert_eq!(points[4].balance, dec("60.00"));
    }

    // ── period_totals ─────────────────────────────────────────────────────────

    #[test]
    fn totals_respect_window_and_overrides() {
        let rules = ClassificationRules::default();
        let mut returned = tx(date(2024, 11, 10), "50.00", TransactionKind::Income);
        returned.category_name = Some("Devolução".to_string());
        let ledger = vec![
            tx(date(2024, 11, 1), "500.00", TransactionKind::Income),
            tx(date(2024, 11, 5), "120.00", TransactionKind::Expense),
            returned,
            // Outside the window, must not count.
            tx(date(2024, 10, 31), "999.00", TransactionKind::Income),
        ];
        let window = DateRange::new(date(2024, 11, 1), date(2024, 11, 30));
        let totals = period_totals(&rules, &ledger, window);
        assert_eq!(totals.income, dec("500.00"));
        assert_eq!(totals.expense, dec("170.00"));
        assert_eq!(totals.balance, dec("330.00"));
    }
}
