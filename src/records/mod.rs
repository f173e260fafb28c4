//! Typed records at the boundary to the accounting sync.
//!
//! The sync job stores amounts and dates as loosely formatted strings. They are
//! parsed exactly once here; everything downstream works on `Money` and
//! `NaiveDate`.

pub mod customer;
pub mod receipt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use crate::decimal::Money;

pub use customer::Customer;
pub use receipt::{import_receipts, ImportReport, RawReceipt, Receipt};

/// parse `YYYY-MM-DD`, an RFC 3339 timestamp, or `DD.MM.YYYY`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    if let Some(prefix) = value.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(value, "%d.%m.%Y").ok()
}

/// amount from a json string or number; `None` when it cannot be read
pub fn parse_amount(value: &Value) -> Option<Money> {
    match value {
        Value::String(s) => Money::parse_lenient(s),
        Value::Number(n) => Money::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// serde adapter for day counts stored either as number or string
pub(crate) fn lenient_days<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
