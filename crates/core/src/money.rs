use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Unparseable monetary value: '{0}'")]
    Invalid(String),
}

/// Parse a Brazilian-locale monetary string into a canonical decimal.
///
/// Accepts `"R$ 1.234,56"`, `"1.234,56"`, `"1234,56"` and already-canonical
/// `"1234.56"`. The Brazilian reading (`.` grouping, `,` radix) only engages
/// when a comma is present; a dot-only string is taken as canonical, which
/// keeps the function idempotent over its own output. A string with no
/// separators at all (`"100002"`) is whole currency units.
pub fn parse_brl(input: &str) -> Result<Decimal, MoneyError> {
    let mut s = input.trim().replace('\u{a0}', " ");

    // The sign may precede or follow the currency symbol.
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start().to_string();
    }
    if let Some(rest) = s.strip_prefix("R$") {
        s = rest.trim_start().to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start().to_string();
    }
    let s = s.replace(' ', "");
    if s.is_empty() {
        return Err(MoneyError::Invalid(input.to_string()));
    }

    let canonical = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s
    };

    let value =
        Decimal::from_str(&canonical).map_err(|_| MoneyError::Invalid(input.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Format a decimal for display in the Brazilian locale: `R$ 1.234,56`,
/// with the sign ahead of the currency symbol for negatives.
pub fn format_brl(value: Decimal) -> String {
    let negative = value.is_sign_negative() && !value.is_zero();
    let abs = value.abs().round_dp(2);
    let text = format!("{abs:.2}");
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}
