//! Club Core Error Types
//!
//! Error definitions for the voting / funding / profit pipeline.

use thiserror::Error;

use crate::types::{MemberId, PlanId};

/// Club core errors
#[derive(Debug, Error)]
pub enum ClubError {
    /// A vote already exists for this (member, plan) pair
    #[error("Member {member_id} already voted on plan {plan_id}")]
    AlreadyVoted { member_id: MemberId, plan_id: PlanId },

    /// Voting window is not open
    #[error("Voting is closed for plan {plan_id}")]
    VotingClosed { plan_id: PlanId },

    /// Resolution attempted before the voting deadline
    #[error("Plan {plan_id} voting deadline has not passed yet")]
    NotYetDue { plan_id: PlanId },

    /// Allocation attempted on a plan that is not closed with an approving outcome
    #[error("Plan {plan_id} is not resolved for funding")]
    NotResolved { plan_id: PlanId },

    /// Profit recorded against a plan that was never funded
    #[error("Plan {plan_id} is not funded")]
    PlanNotFunded { plan_id: PlanId },

    /// Profit already distributed for this plan
    #[error("Profit already distributed for plan {plan_id}")]
    AlreadyDistributed { plan_id: PlanId },

    /// No member capacity available to fund the target
    #[error("Insufficient member capacity: {target_shares} shares required, {capacity} available")]
    InsufficientFunds { target_shares: u64, capacity: u64 },

    /// Optimistic concurrency conflict (stale plan version)
    #[error("Concurrent modification of plan {plan_id}")]
    ConcurrentModification { plan_id: PlanId },

    /// Member not found
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// Plan not found
    #[error("Business plan not found: {0}")]
    PlanNotFound(PlanId),

    /// Caller is not a top member
    #[error("Member {0} is not a top member")]
    NotTopMember(MemberId),

    /// Member is not yet approved for club operations
    #[error("Member {0} is not an approved member")]
    NotEligible(MemberId),

    /// Illegal plan state transition
    #[error("Invalid plan state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Invalid monetary amount or percentage
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Club core Result type
pub type ClubResult<T> = Result<T, ClubError>;

impl ClubError {
    /// Whether the caller may retry the operation (with backoff).
    ///
    /// Only lock-contention conflicts are retriable; every domain error is
    /// final and must be reported to the caller as-is.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ClubError::ConcurrentModification { .. })
    }
}
