//! Rent pricing.
//!
//! Rent is `rate(len) * duration` where the per-second rate depends on the
//! length of the normalized label. Shorter labels are scarcer and cost more.
//! All amounts are integers in the smallest currency unit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Seconds in a (365-day) year.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// A rent amount in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Amount(pub u128);

impl Amount {
    /// Zero rent.
    pub const ZERO: Self = Self(0);

    /// Get the raw value.
    pub const fn value(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-second rates indexed by label length.
///
/// Entry `i` is the rate for labels of `i + 1` characters; the last entry
/// covers every longer label. Rates are non-increasing in length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct PriceTable {
    rates: Vec<u64>,
}

impl PriceTable {
    /// Build a table, rejecting empty or length-increasing rates.
    pub fn new(rates: Vec<u64>) -> Result<Self> {
        if rates.is_empty() {
            return Err(CoreError::InvalidPriceTable("no rates".into()));
        }
        if let Some(i) = rates.windows(2).position(|w| w[1] > w[0]) {
            return Err(CoreError::InvalidPriceTable(format!(
                "rate for length {} ({}) exceeds rate for length {} ({})",
                i + 2,
                rates[i + 1],
                i + 1,
                rates[i]
            )));
        }
        Ok(Self { rates })
    }

    /// Per-second rate for a label of `len` characters.
    ///
    /// `len` is at least 1 for any valid name; 0 is priced as 1.
    pub fn rate_for(&self, len: usize) -> u64 {
        let idx = len.saturating_sub(1).min(self.rates.len() - 1);
        self.rates[idx]
    }

    /// The configured rates.
    pub fn rates(&self) -> &[u64] {
        &self.rates
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            rates: vec![
                1_000_000, 500_000, 200_000, 100_000, 50_000, 20_000, 10_000, 5_000, 2_000, 1_000,
            ],
        }
    }
}

impl TryFrom<Vec<u64>> for PriceTable {
    type Error = CoreError;

    fn try_from(rates: Vec<u64>) -> Result<Self> {
        Self::new(rates)
    }
}

impl From<PriceTable> for Vec<u64> {
    fn from(table: PriceTable) -> Self {
        table.rates
    }
}

/// Pure rent calculator over a [`PriceTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RentPricer {
    table: PriceTable,
}

impl RentPricer {
    /// Create a pricer for the given table.
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }

    /// The table in use.
    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    /// Rent for holding `label` (already normalized) for `duration_secs`.
    ///
    /// The product of a `u64` rate and a `u64` duration always fits in `u128`.
    pub fn price(&self, label: &str, duration_secs: u64) -> Result<Amount> {
        if duration_secs == 0 {
            return Err(CoreError::InvalidDuration(
                "duration must be greater than zero".into(),
            ));
        }
        let rate = self.table.rate_for(label.chars().count());
        Ok(Amount(u128::from(rate) * u128::from(duration_secs)))
    }
}
