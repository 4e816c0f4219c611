use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use uuid::Uuid;

/// One entry lifted from a bank statement export: the minimum a candidate
/// needs. `amount` keeps the bank's sign; direction is derived later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    /// Bank-assigned id (FITID), or a synthesized opaque token when the
    /// bank omitted one.
    pub external_id: String,
    pub posted: NaiveDate,
    pub amount: Decimal,
    pub memo: String,
}

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_block, r"(?is)<STMTTRN>(.*?)</STMTTRN>");
re!(re_amount, r"(?i)<TRNAMT>([^<\r\n]+)");
re!(re_posted, r"(?i)<DTPOSTED>([^<\r\n]+)");
re!(re_memo, r"(?i)<MEMO>([^<\r\n]+)");
re!(re_name, r"(?i)<NAME>([^<\r\n]+)");
re!(re_fitid, r"(?i)<FITID>([^<\r\n]+)");

/// Parse a statement export into records, one per well-formed transaction
/// block. Parsing is deliberately tolerant: a block missing its amount,
/// posted date, or memo/name is skipped, and an input with no blocks at
/// all yields an empty sequence — "nothing to import" is not an error.
pub fn parse(data: &str) -> Vec<StatementRecord> {
    let mut records = Vec::new();

    for caps in re_block().captures_iter(data) {
        let block = &caps[1];

        let amount = tag_value(re_amount(), block).and_then(|raw| parse_amount(&raw));
        let posted = tag_value(re_posted(), block).and_then(|raw| parse_posted(&raw));
        let memo = tag_value(re_memo(), block).or_else(|| tag_value(re_name(), block));

        let (Some(amount), Some(posted), Some(memo)) = (amount, posted, memo) else {
            continue;
        };

        let external_id = tag_value(re_fitid(), block)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        records.push(StatementRecord { external_id, posted, amount, memo: unescape(&memo) });
    }

    records
}

fn tag_value(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .map(|caps| caps[1].trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Statement amounts may use a comma decimal separator ("-230,50").
fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', ".")).ok()
}

/// Posted dates come as `YYYYMMDD`, often with a time/timezone suffix
/// (`20241128120000[-3:BRT]`) — only the first eight digits matter.
fn parse_posted(raw: &str) -> Option<NaiveDate> {
    if raw.len() < 8 {
        return None;
    }
    let year: i32 = raw[0..4].parse().ok()?;
    let month: u32 = raw[4..6].parse().ok()?;
    let day: u32 = raw[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}
