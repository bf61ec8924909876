//! Votes and Tallies
//!
//! A vote is created once per (member, plan) pair and never mutated. Silence
//! is not a vote: non-voters are counted in the tally and carried into Round 2
//! allocation under the minimum-share criterion, but no synthetic vote rows
//! are ever written for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MemberId, PlanId, VoteOutcome};

/// Ballot choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yes,
    No,
}

/// A member's vote on a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Voting member
    pub member_id: MemberId,
    /// Plan voted on
    pub plan_id: PlanId,
    /// Ballot choice
    pub choice: VoteChoice,
    /// When the vote was cast
    pub cast_at: DateTime<Utc>,
}

/// Tally over the full eligible member population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Yes votes
    pub yes: u64,
    /// No votes
    pub no: u64,
    /// Eligible members who did not vote
    pub non_voters: u64,
}

impl VoteTally {
    /// Count votes against the eligible population size
    pub fn count(votes: &[Vote], eligible: u64) -> Self {
        let yes = votes.iter().filter(|v| v.choice == VoteChoice::Yes).count() as u64;
        let no = votes.iter().filter(|v| v.choice == VoteChoice::No).count() as u64;
        Self {
            yes,
            no,
            non_voters: eligible.saturating_sub(yes + no),
        }
    }

    /// Resolution outcome for this tally
    ///
    /// - every eligible member voted yes: unanimous
    /// - at least one yes, plus any no or non-voter: partial
    /// - zero yes votes: rejected
    pub fn outcome(&self) -> VoteOutcome {
        if self.yes == 0 {
            VoteOutcome::Rejected
        } else if self.no == 0 && self.non_voters == 0 {
            VoteOutcome::UnanimousYes
        } else {
            VoteOutcome::PartialYes
        }
    }
}
