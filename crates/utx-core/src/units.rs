//! Smallest-unit to display-unit conversion.
//!
//! Amounts travel through the system as integer satoshis. Conversion to a
//! decimal BTC value happens only at presentation time, and the result is
//! display-grade: sums and comparisons must use the raw integers.

/// Smallest units per whole coin (10^8).
pub const UNIT_SCALE: u64 = 100_000_000;

/// Convert an integer smallest-unit amount into a decimal display amount.
#[inline]
pub fn to_decimal(amount: u64) -> f64 {
    amount as f64 / UNIT_SCALE as f64
}
