//! Shares and Monthly Payments
//!
//! Holdings are modelled as append-only share lots: a member's balance at any
//! point in time is the sum of the lots recorded at or before it. Base lots
//! represent the recurring monthly obligation and only ever grow; additional
//! lots are one-time grants from funding rounds and profit carry-forward.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MemberId;

/// Share class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareType {
    /// Recurring monthly obligation; count is monotonically non-decreasing
    Base,
    /// One-time purchase or grant
    Additional,
}

/// Append-only share grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLot {
    /// Lot id
    pub id: u64,
    /// Owning member
    pub member_id: MemberId,
    /// Share class
    pub share_type: ShareType,
    /// Number of shares in this lot
    pub quantity: u64,
    /// When the lot was recorded
    pub recorded_at: DateTime<Utc>,
}

/// A member's holdings at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareBalance {
    /// Base share count
    pub base: u64,
    /// Additional share count
    pub additional: u64,
}

impl ShareBalance {
    /// Total share count (base + additional)
    pub fn total(&self) -> u64 {
        self.base + self.additional
    }

    /// Monetary value at the given unit price
    pub fn monetary_value(&self, unit_price: Decimal) -> Decimal {
        Decimal::from(self.total()) * unit_price
    }
}

/// Monthly payment record against a member's base shares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPayment {
    /// Payment id
    pub id: u64,
    /// Paying member
    pub member_id: MemberId,
    /// Due month (1-12)
    pub month: u32,
    /// Due year
    pub year: i32,
    /// Base share count at billing time
    pub base_share_count: u64,
    /// Amount due (base shares x unit price)
    pub amount_due: Decimal,
    /// Amount actually paid
    pub amount_paid: Decimal,
    /// Whether the obligation is settled
    pub is_paid: bool,
    /// Settlement time, if settled
    pub paid_at: Option<DateTime<Utc>>,
}
