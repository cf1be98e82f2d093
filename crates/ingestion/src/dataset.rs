//! Decoding of raw tabular rows into typed records.
//!
//! Input rows arrive as JSON-shaped objects with a fixed column contract.
//! A row missing a required column or carrying a non-coercible value is
//! rejected and reported; it never aborts the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tca_core::{ConditionRule, Order, Quote, TimestampSec, ts_from_datetime};
use tracing::warn;

/// Which input table a rejected row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Table {
    /// The quotes table.
    Quotes,
    /// The orders table.
    Orders,
    /// The condition-filter rules table.
    ConditionFilter,
}

/// A row that failed decoding, with its position and the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Table the row belonged to.
    pub table: Table,
    /// Zero-based row index within the input batch.
    pub row: usize,
    /// Why the row was rejected.
    pub reason: String,
}

/// Decode quote rows. Bad rows are skipped and reported.
pub fn decode_quotes(rows: &[Value]) -> (Vec<Quote>, Vec<RejectedRow>) {
    decode_table(rows, Table::Quotes, |row| {
        Ok(Quote {
            security_id: req_str(row, "security_id")?,
            ts: req_ts(row, "timestamp")?,
            condition_code: opt_str(row, "condition_code"),
            bid_price: req_f64(row, "bid_price")?,
            ask_price: req_f64(row, "ask_price")?,
            trade_price: opt_f64(row, "trade_price")?,
            volume: opt_f64(row, "volume")?,
        })
    })
}

/// Decode order rows. Bad rows are skipped and reported.
pub fn decode_orders(rows: &[Value]) -> (Vec<Order>, Vec<RejectedRow>) {
    decode_table(rows, Table::Orders, |row| {
        Ok(Order {
            security_id: req_str(row, "security_id")?,
            mic_exchange: req_str(row, "mic_exchange")?,
            fulfill_time: req_ts(row, "fulfill_time")?,
            order_start_time: req_ts(row, "order_start_time")?,
            order_end_time: req_ts(row, "order_end_time")?,
            order_size: req_f64(row, "order_size")?,
            execution_price: req_f64(row, "execution_price")?,
        })
    })
}

/// Decode condition-filter rule rows. Bad rows are skipped and reported.
pub fn decode_rules(rows: &[Value]) -> (Vec<ConditionRule>, Vec<RejectedRow>) {
    decode_table(rows, Table::ConditionFilter, |row| {
        Ok(ConditionRule {
            mic_exchange: req_str(row, "mic_exchange")?,
            condition_code: req_str(row, "condition_code_to_drop")?,
        })
    })
}

fn decode_table<T>(
    rows: &[Value],
    table: Table,
    decode: impl Fn(&Value) -> std::result::Result<T, String>,
) -> (Vec<T>, Vec<RejectedRow>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (row_idx, row) in rows.iter().enumerate() {
        if !row.is_object() {
            reject(&mut rejected, table, row_idx, "row is not an object".to_string());
            continue;
        }
        match decode(row) {
            Ok(record) => records.push(record),
            Err(reason) => reject(&mut rejected, table, row_idx, reason),
        }
    }

    (records, rejected)
}

fn reject(rejected: &mut Vec<RejectedRow>, table: Table, row: usize, reason: String) {
    warn!(?table, row, %reason, "rejected input row");
    rejected.push(RejectedRow { table, row, reason });
}

/// Look up a column, treating JSON null the same as an absent column.
fn field<'a>(row: &'a Value, name: &str) -> Option<&'a Value> {
    match row.get(name) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

fn req_str(row: &Value, name: &str) -> std::result::Result<String, String> {
    match field(row, name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("column '{name}' is not a string: {other}")),
        None => Err(format!("missing required column '{name}'")),
    }
}

fn opt_str(row: &Value, name: &str) -> Option<String> {
    match field(row, name) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn req_f64(row: &Value, name: &str) -> std::result::Result<f64, String> {
    let value = field(row, name).ok_or_else(|| format!("missing required column '{name}'"))?;
    match coerce_f64(value) {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(format!("column '{name}' is not a finite number: {value}")),
    }
}

fn opt_f64(row: &Value, name: &str) -> std::result::Result<Option<f64>, String> {
    match field(row, name) {
        None => Ok(None),
        Some(value) => match coerce_f64(value) {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(format!("column '{name}' is not a finite number: {value}")),
        },
    }
}

/// Coerce a timestamp column: epoch seconds as a number, or an RFC 3339
/// string. Fractional seconds are truncated.
fn req_ts(row: &Value, name: &str) -> std::result::Result<TimestampSec, String> {
    let value = field(row, name).ok_or_else(|| format!("missing required column '{name}'"))?;
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(v)
            } else if let Some(v) = n.as_f64() {
                Ok(v.trunc() as i64)
            } else {
                Err(format!("column '{name}' is not a valid timestamp: {value}"))
            }
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| ts_from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| format!("column '{name}' is not a valid timestamp: {e}")),
        _ => Err(format!("column '{name}' is not a valid timestamp: {value}")),
    }
}
