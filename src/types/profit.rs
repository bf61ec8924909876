//! Profit Records
//!
//! One record per funded plan, written once when profit is booked. Each
//! member's gross share splits into an immediate payout (booked) and a
//! carry-forward converted into additional shares at the unit price; sub-share
//! remainders flow back into the booked payout so nothing is lost.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{MemberId, PlanId};

/// Per-member book percentage schedule
///
/// Members not present in the schedule book 100% of their profit share as an
/// immediate payout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSchedule {
    overrides: HashMap<MemberId, Decimal>,
}

impl BookSchedule {
    /// Schedule with no overrides (everyone books 100%)
    pub fn book_all() -> Self {
        Self::default()
    }

    /// Set a member's book percentage (0-100)
    pub fn with_percent(mut self, member_id: MemberId, percent: Decimal) -> Self {
        self.overrides.insert(member_id, percent);
        self
    }

    /// Book percentage for a member
    pub fn percent_for(&self, member_id: MemberId) -> Decimal {
        self.overrides
            .get(&member_id)
            .copied()
            .unwrap_or(Decimal::ONE_HUNDRED)
    }

    /// Whether every override is within 0-100
    pub fn is_valid(&self) -> bool {
        self.overrides
            .values()
            .all(|p| *p >= Decimal::ZERO && *p <= Decimal::ONE_HUNDRED)
    }
}

/// One member's slice of a profit distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfitShare {
    /// Receiving member
    pub member_id: MemberId,
    /// Gross pro-rata share of the distributable pool
    pub gross: Decimal,
    /// Amount paid out immediately
    pub booked: Decimal,
    /// Amount converted into additional shares
    pub carried: Decimal,
    /// Whole additional shares granted from the carried amount
    pub carried_shares: u64,
}

/// Profit distribution record for a funded plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitRecord {
    /// Funded plan
    pub plan_id: PlanId,
    /// Total profit amount recorded
    pub total_amount: Decimal,
    /// Proposer bonus taken off the top
    pub proposer_bonus: Decimal,
    /// Member receiving the proposer bonus
    pub proposer_id: MemberId,
    /// Per-member splits of the remaining pool
    pub splits: Vec<MemberProfitShare>,
    /// When the distribution was committed
    pub recorded_at: DateTime<Utc>,
}

impl ProfitRecord {
    /// Total paid out immediately across all members, excluding the bonus
    pub fn total_booked(&self) -> Decimal {
        self.splits.iter().map(|s| s.booked).sum()
    }

    /// Total carried forward into shares across all members
    pub fn total_carried(&self) -> Decimal {
        self.splits.iter().map(|s| s.carried).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_defaults_to_full_booking() {
        let schedule = BookSchedule::book_all();
        assert_eq!(schedule.percent_for(42), Decimal::ONE_HUNDRED);
        assert!(schedule.is_valid());
    }

    #[test]
    fn test_schedule_override() {
        let schedule = BookSchedule::book_all().with_percent(3, Decimal::from(40u64));
        assert_eq!(schedule.percent_for(3), Decimal::from(40u64));
        assert_eq!(schedule.percent_for(4), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_schedule_validation() {
        let bad = BookSchedule::book_all().with_percent(1, Decimal::from(150u64));
        assert!(!bad.is_valid());
    }
}
