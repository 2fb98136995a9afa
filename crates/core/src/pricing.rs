//! Expected-vs-paid amount reconciliation.
//!
//! A payment whose amount differs from the catalog price is still recorded;
//! the mismatch is reported back to the caller as a [`Discrepancy`] and
//! never blocks the write.

use serde::Serialize;

use crate::types::Cents;

/// Mismatches at or below this many cents are treated as rounding noise
/// and not reported.
pub const DISCREPANCY_TOLERANCE_CENTS: Cents = 1;

/// A recorded payment amount that does not match the catalog price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    /// Price from the active price schedule.
    pub expected_cents: Cents,
    /// Amount actually paid.
    pub actual_cents: Cents,
    /// `actual - expected`; negative means underpaid.
    pub delta_cents: Cents,
}

/// Compare a paid amount against the expected price.
///
/// Returns `None` when the amounts agree within
/// [`DISCREPANCY_TOLERANCE_CENTS`], otherwise the full discrepancy record.
pub fn discrepancy(expected_cents: Cents, actual_cents: Cents) -> Option<Discrepancy> {
    let delta_cents = actual_cents - expected_cents;
    if delta_cents.abs() <= DISCREPANCY_TOLERANCE_CENTS {
        None
    } else {
        Some(Discrepancy {
            expected_cents,
            actual_cents,
            delta_cents,
        })
    }
}
