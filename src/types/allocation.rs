//! Funding Allocations
//!
//! One row per (plan, member) recording the shares granted in each funding
//! round. Append-only: written once when the allocator commits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MemberId, PlanId};

/// Shares granted to one member for one plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingAllocation {
    /// Funded plan
    pub plan_id: PlanId,
    /// Receiving member
    pub member_id: MemberId,
    /// Shares granted in Round 1
    pub round1_shares: u64,
    /// Shares granted in Round 2
    pub round2_shares: u64,
    /// When the allocation was committed
    pub allocated_at: DateTime<Utc>,
}

impl FundingAllocation {
    /// Total shares granted across both rounds
    pub fn total_shares(&self) -> u64 {
        self.round1_shares + self.round2_shares
    }

    /// Monetary value of the grant at the given unit price
    pub fn amount(&self, unit_price: Decimal) -> Decimal {
        Decimal::from(self.total_shares()) * unit_price
    }
}

/// Outcome summary of an allocation run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AllocationSummary {
    /// Plan the allocation ran for
    pub plan_id: PlanId,
    /// Target expressed in whole shares
    pub target_shares: u64,
    /// Shares granted in Round 1
    pub round1_shares: u64,
    /// Shares granted in Round 2
    pub round2_shares: u64,
}

impl AllocationSummary {
    /// Total shares granted
    pub fn allocated_shares(&self) -> u64 {
        self.round1_shares + self.round2_shares
    }

    /// Whether the target was fully reached
    pub fn fully_funded(&self) -> bool {
        self.allocated_shares() == self.target_shares
    }
}
