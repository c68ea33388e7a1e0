//! Feed message decoder.
//!
//! Walks one complete JSON message and builds a [`Transaction`]:
//!
//! ```text
//! { "op": "utx",
//!   "x": { "hash": str, "time": int,
//!          "out":    [ { "addr": str, "value": int }, ... ],
//!          "inputs": [ { "prev_out": { "addr": str, "value": int } }, ... ] } }
//! ```
//!
//! Amounts are summed per address. Any missing or mistyped field fails the
//! whole message; no partial transaction is produced.

use serde_json::{Map, Value};
use utx_core::error::ExtractError;
use utx_core::{AmountMap, Transaction};

use crate::json_util::{array_field, as_object, index, join, object_field, str_field, u64_field};

/// `op` value of transaction notifications.
pub const TRANSACTION_OP: &str = "utx";

/// A decoded feed message.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// An unconfirmed transaction.
    Transaction(Transaction),
    /// A non-transaction message, e.g. `{"op":"pong"}`. Carries the `op`.
    Control(String),
}

/// Decode a complete message into a [`Transaction`].
///
/// The `op` field is not inspected; see [`decode_event`] for that.
pub fn extract(buf: &[u8]) -> Result<Transaction, ExtractError> {
    let v: Value = serde_json::from_slice(buf)?;
    transaction_from_root(as_object(&v, "")?)
}

/// Decode a complete message, routing by its `op` field.
///
/// A string `op` other than `"utx"` marks a control message. A message with
/// no `op` is decoded as a transaction.
pub fn decode_event(buf: &[u8]) -> Result<FeedEvent, ExtractError> {
    let v: Value = serde_json::from_slice(buf)?;
    let root = as_object(&v, "")?;

    match root.get("op").and_then(Value::as_str) {
        Some(op) if op != TRANSACTION_OP => Ok(FeedEvent::Control(op.to_string())),
        _ => transaction_from_root(root).map(FeedEvent::Transaction),
    }
}

fn transaction_from_root(root: &Map<String, Value>) -> Result<Transaction, ExtractError> {
    let x = object_field(root, "", "x")?;
    let id = str_field(x, "x", "hash")?;
    let timestamp = u64_field(x, "x", "time")?;

    let mut outputs = AmountMap::default();
    for (i, entry) in array_field(x, "x", "out")?.iter().enumerate() {
        let path = index("x.out", i);
        add_amount(&mut outputs, as_object(entry, &path)?, &path)?;
    }

    let mut inputs = AmountMap::default();
    for (i, entry) in array_field(x, "x", "inputs")?.iter().enumerate() {
        let path = index("x.inputs", i);
        let prev_out = object_field(as_object(entry, &path)?, &path, "prev_out")?;
        add_amount(&mut inputs, prev_out, &join(&path, "prev_out"))?;
    }

    Ok(Transaction::new(id.to_string(), timestamp, inputs, outputs))
}

/// Add `entry.value` into `amounts[entry.addr]`, starting from 0.
fn add_amount(amounts: &mut AmountMap, entry: &Map<String, Value>, path: &str) -> Result<(), ExtractError> {
    let addr = str_field(entry, path, "addr")?;
    let value = u64_field(entry, path, "value")?;

    let slot = amounts.entry(addr.to_string()).or_insert(0);
    *slot = slot.checked_add(value).ok_or_else(|| ExtractError::AmountOverflow(addr.to_string()))?;
    Ok(())
}
