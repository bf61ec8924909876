//! BusinessPlan - proposal lifecycle record
//!
//! A plan is created by a top member, mutated only by the voting engine
//! (status and outcome) and the funding allocator (funded amount), and never
//! deleted: it is retained as a historical ledger entry.
//!
//! # State machine
//!
//! ```text
//! open ──resolve──┬──→ closed ──allocate──→ funded
//!                 │
//!                 └──→ rejected
//! ```
//!
//! `funded` and `rejected` are terminal. Every mutation goes through a guarded
//! transition method and bumps the optimistic-concurrency `version`, which the
//! store checks on update so that resolution and allocation stay single-writer
//! per plan across processes.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MemberId, PlanId};
use crate::error::{ClubError, ClubResult};

/// Plan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Voting window is open
    Open,
    /// Voting resolved with an approving outcome, allocation pending
    Closed,
    /// Funding rounds completed (terminal)
    Funded,
    /// Voting resolved with zero yes votes (terminal)
    Rejected,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanStatus::Open => "open",
            PlanStatus::Closed => "closed",
            PlanStatus::Funded => "funded",
            PlanStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Resolution outcome of the voting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Every eligible member voted yes
    UnanimousYes,
    /// At least one yes, and at least one no or non-voter
    PartialYes,
    /// Zero yes votes
    Rejected,
}

impl VoteOutcome {
    /// Whether this outcome authorizes funding rounds
    pub fn is_approved(&self) -> bool {
        matches!(self, VoteOutcome::UnanimousYes | VoteOutcome::PartialYes)
    }
}

/// Business plan proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessPlan {
    /// Plan id
    pub id: PlanId,
    /// Short title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Proposing member
    pub proposer_id: MemberId,
    /// Amount the plan needs, in rupees
    pub funding_target: Decimal,
    /// Creation time (voting window start)
    pub created_at: DateTime<Utc>,
    /// Voting deadline (creation + configured window)
    pub voting_deadline: DateTime<Utc>,
    /// Lifecycle status
    pub status: PlanStatus,
    /// Resolution outcome, set when the plan leaves `Open`
    pub outcome: Option<VoteOutcome>,
    /// Total amount actually allocated, set when the plan is funded
    pub funded_amount: Decimal,
    /// Optimistic concurrency version, bumped on every mutation
    pub version: u64,
}

impl BusinessPlan {
    /// Create a new open plan with the voting window starting now
    pub fn new(
        id: PlanId,
        title: String,
        description: String,
        proposer_id: MemberId,
        funding_target: Decimal,
        voting_window: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            proposer_id,
            funding_target,
            created_at: now,
            voting_deadline: now + voting_window,
            status: PlanStatus::Open,
            outcome: None,
            funded_amount: Decimal::ZERO,
            version: 0,
        }
    }

    /// Whether votes may still be cast at `now`
    pub fn voting_open(&self, now: DateTime<Utc>) -> bool {
        self.status == PlanStatus::Open && now <= self.voting_deadline
    }

    /// Whether the plan is open and past its deadline (ready for resolution)
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PlanStatus::Open && now >= self.voting_deadline
    }

    /// Close the voting window with the given outcome.
    ///
    /// An approving outcome moves the plan to `Closed` (allocation pending);
    /// a rejected outcome moves it straight to the terminal `Rejected`.
    pub fn resolve(&mut self, outcome: VoteOutcome) -> ClubResult<()> {
        if self.status != PlanStatus::Open {
            return Err(self.invalid_transition("closed"));
        }
        self.status = if outcome.is_approved() {
            PlanStatus::Closed
        } else {
            PlanStatus::Rejected
        };
        self.outcome = Some(outcome);
        self.version += 1;
        Ok(())
    }

    /// Mark the plan funded after allocation completes
    pub fn mark_funded(&mut self, funded_amount: Decimal) -> ClubResult<()> {
        if self.status != PlanStatus::Closed {
            return Err(self.invalid_transition("funded"));
        }
        self.status = PlanStatus::Funded;
        self.funded_amount = funded_amount;
        self.version += 1;
        Ok(())
    }

    fn invalid_transition(&self, to: &str) -> ClubError {
        ClubError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

/// Execution evidence attached to a funded plan.
///
/// Receipts, purchase records and similar paperwork filed by a top member
/// after the money moves. Append-only; a plan may accumulate any number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanProof {
    /// Proof id
    pub id: u64,
    /// Funded plan the evidence belongs to
    pub plan_id: PlanId,
    /// Top member who filed it
    pub recorded_by: MemberId,
    /// What the evidence shows
    pub note: String,
    /// Filing time
    pub recorded_at: DateTime<Utc>,
}
