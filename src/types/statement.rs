//! Member Statements
//!
//! Read-only aggregation of one member's position: holdings, payment history,
//! funding grants and profit splits, all as of a point in time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FundingAllocation, MemberId, MemberProfitShare, MonthlyPayment, PlanId, ShareBalance};

/// One plan's profit split for a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitShareEntry {
    /// Plan the profit came from
    pub plan_id: PlanId,
    /// The member's slice of that distribution
    pub share: MemberProfitShare,
}

/// A member's aggregated position at `as_of`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStatement {
    /// Statement subject
    pub member_id: MemberId,
    /// Point in time the statement reflects
    pub as_of: DateTime<Utc>,
    /// Holdings by share class
    pub balance: ShareBalance,
    /// Holdings at the unit price
    pub monetary_value: Decimal,
    /// Monthly payment history
    pub payments: Vec<MonthlyPayment>,
    /// Funding-round grants received
    pub allocations: Vec<FundingAllocation>,
    /// Profit splits received
    pub profit_shares: Vec<ProfitShareEntry>,
}

impl MemberStatement {
    /// Total profit paid out to the member across all distributions
    pub fn total_profit_booked(&self) -> Decimal {
        self.profit_shares.iter().map(|e| e.share.booked).sum()
    }

    /// Total profit carried into additional shares across all distributions
    pub fn total_profit_carried(&self) -> Decimal {
        self.profit_shares.iter().map(|e| e.share.carried).sum()
    }

    /// Whether every billed month is settled
    pub fn payments_current(&self) -> bool {
        self.payments.iter().all(|p| p.is_paid)
    }
}
