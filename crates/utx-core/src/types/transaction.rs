//! The aggregated transaction record produced from one feed message.
//!
//! Amounts are kept in integer smallest units. Each map holds one entry per
//! counterparty address, summed over every input (or output) entry of the
//! message that references it. Inputs and outputs are aggregated
//! independently; nothing checks that they balance.

use std::fmt;

use ahash::AHashMap;

use crate::units::to_decimal;

/// Address → aggregated amount in smallest units.
pub type AmountMap = AHashMap<String, u64>;

/// One unconfirmed transaction, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    id: String,
    timestamp: u64,
    inputs: AmountMap,
    outputs: AmountMap,
}

impl Transaction {
    pub fn new(id: String, timestamp: u64, inputs: AmountMap, outputs: AmountMap) -> Self {
        Self { id, timestamp, inputs, outputs }
    }

    /// Transaction identifier as asserted by the feed.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Seconds since Unix epoch, as asserted by the feed.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Funds consumed, per address.
    pub fn inputs(&self) -> &AmountMap {
        &self.inputs
    }

    /// Funds produced, per address.
    pub fn outputs(&self) -> &AmountMap {
        &self.outputs
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction {}", self.id)?;
        writeln!(f, "  time: {}", self.timestamp)?;
        writeln!(f, "  inputs:")?;
        write_amounts(f, &self.inputs)?;
        writeln!(f, "  outputs:")?;
        write_amounts(f, &self.outputs)
    }
}

/// Addresses are rendered in sorted order so output is stable.
fn write_amounts(f: &mut fmt::Formatter<'_>, amounts: &AmountMap) -> fmt::Result {
    let mut entries: Vec<(&String, &u64)> = amounts.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    for (addr, value) in entries {
        writeln!(f, "    {addr} : {:.8} BTC", to_decimal(*value))?;
    }
    Ok(())
}
