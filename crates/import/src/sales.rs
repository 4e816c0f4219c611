use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use caixa_core::money;

/// One row of a sales spreadsheet export.
#[derive(Debug, Clone)]
pub struct SaleRow {
    pub date: Option<NaiveDate>,
    pub client_name: Option<String>,
    pub value: Decimal,
    pub weight: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub seller: Option<String>,
}

#[derive(Error, Debug)]
pub enum SalesCsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("No recognizable value column in header")]
    MissingValueColumn,
}

// Spreadsheets arrive with inconsistent header spellings; match on a
// lowercased alias table instead of a fixed layout.
const VALUE_HEADERS: &[&str] = &["valor_total", "valor total", "valor"];
const WEIGHT_HEADERS: &[&str] = &["peso_gramas", "peso (g)", "peso"];
const SHIPPING_HEADERS: &[&str] = &["frete", "frete (r$)"];
const CLIENT_HEADERS: &[&str] = &["cliente", "nome_cliente", "nome cliente"];
const DATE_HEADERS: &[&str] = &["data", "data_venda", "data venda"];
const SELLER_HEADERS: &[&str] = &["vendedor"];

/// Import sales rows from a CSV export. Rows without a parseable value are
/// skipped (the same tolerant policy as the statement parser); a header
/// with no recognizable value column is a hard error since every row would
/// be dropped.
pub fn import_sales<R: Read>(data: R) -> Result<Vec<SaleRow>, SalesCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> =
        reader.headers()?.iter().map(|h| h.trim().to_lowercase()).collect();
    let position =
        |aliases: &[&str]| headers.iter().position(|h| aliases.contains(&h.as_str()));

    let value_col = position(VALUE_HEADERS).ok_or(SalesCsvError::MissingValueColumn)?;
    let weight_col = position(WEIGHT_HEADERS);
    let shipping_col = position(SHIPPING_HEADERS);
    let client_col = position(CLIENT_HEADERS);
    let date_col = position(DATE_HEADERS);
    let seller_col = position(SELLER_HEADERS);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;

        let Some(value) = record.get(value_col).and_then(|cell| money::parse_brl(cell).ok())
        else {
            continue;
        };

        let cell = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        rows.push(SaleRow {
            date: cell(date_col).and_then(|s| parse_date(&s)),
            client_name: cell(client_col),
            value,
            weight: cell(weight_col).and_then(|s| money::parse_brl(&s).ok()),
            shipping: cell(shipping_col).and_then(|s| money::parse_brl(&s).ok()),
            seller: cell(seller_col),
        });
    }

    Ok(rows)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    for format in &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    None
}
