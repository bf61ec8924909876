//! Voting Engine
//!
//! Manages the business-plan voting lifecycle: opening the window, casting
//! votes, and resolving the outcome once the deadline passes. Resolution is
//! idempotent and races safely with the background sweeper: whichever writer
//! wins the plan-version compare-and-swap decides, the loser observes the
//! winner's outcome.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ClubConfig;
use crate::error::{ClubError, ClubResult};
use crate::storage::LedgerStore;
use crate::types::{BusinessPlan, PlanId, Principal, Vote, VoteChoice, VoteOutcome, VoteTally};

/// Voting engine
pub struct VotingEngine<S: LedgerStore> {
    store: Arc<S>,
    config: ClubConfig,
}

impl<S: LedgerStore> VotingEngine<S> {
    /// Create a voting engine over the given store
    pub fn new(store: Arc<S>, config: ClubConfig) -> Self {
        Self { store, config }
    }

    /// Open a new plan with the voting window starting now.
    ///
    /// Only top members may propose plans.
    pub async fn open_plan(
        &self,
        principal: &Principal,
        title: String,
        description: String,
        funding_target: Decimal,
    ) -> ClubResult<BusinessPlan> {
        principal.require_top()?;

        if funding_target <= Decimal::ZERO {
            return Err(ClubError::InvalidAmount(
                "funding target must be positive".to_string(),
            ));
        }

        let plan = BusinessPlan::new(
            0,
            title,
            description,
            principal.member_id,
            funding_target,
            self.config.voting_window(),
        );
        let plan = self.store.create_plan(plan).await?;

        info!(
            plan_id = plan.id,
            proposer_id = plan.proposer_id,
            deadline = %plan.voting_deadline,
            "opened voting window"
        );
        Ok(plan)
    }

    /// Cast a vote as the calling member
    pub async fn cast_vote(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        choice: VoteChoice,
    ) -> ClubResult<Vote> {
        self.cast_vote_at(principal, plan_id, choice, Utc::now()).await
    }

    /// Cast a vote with an explicit clock (used by tests and replays).
    ///
    /// Eligibility is checked against the stored member record, not the role
    /// baked into the principal, so a caller authenticated before approval
    /// may vote once approved. Fails with `VotingClosed` if the plan is no
    /// longer open or the deadline has passed, and with `AlreadyVoted` on a
    /// duplicate.
    pub async fn cast_vote_at(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> ClubResult<Vote> {
        let member = self
            .store
            .get_member(principal.member_id)
            .await?
            .ok_or(ClubError::MemberNotFound(principal.member_id))?;
        if !member.is_eligible() {
            return Err(ClubError::NotEligible(member.id));
        }

        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or(ClubError::PlanNotFound(plan_id))?;

        if !plan.voting_open(now) {
            return Err(ClubError::VotingClosed { plan_id });
        }

        let vote = Vote {
            member_id: principal.member_id,
            plan_id,
            choice,
            cast_at: now,
        };
        self.store.insert_vote(vote.clone()).await?;

        debug!(plan_id, member_id = vote.member_id, ?choice, "vote recorded");
        Ok(vote)
    }

    /// Resolve a plan whose voting deadline has passed
    pub async fn resolve(&self, plan_id: PlanId) -> ClubResult<VoteOutcome> {
        self.resolve_at(plan_id, Utc::now()).await
    }

    /// Resolve with an explicit clock.
    ///
    /// Fails with `NotYetDue` before the deadline. On an already-resolved
    /// plan this returns the recorded outcome without re-tallying.
    pub async fn resolve_at(
        &self,
        plan_id: PlanId,
        now: DateTime<Utc>,
    ) -> ClubResult<VoteOutcome> {
        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or(ClubError::PlanNotFound(plan_id))?;

        if let Some(outcome) = plan.outcome {
            return Ok(outcome);
        }
        if now < plan.voting_deadline {
            return Err(ClubError::NotYetDue { plan_id });
        }

        let tally = self.tally(plan_id).await?;
        let outcome = tally.outcome();

        let read_version = plan.version;
        let mut resolved = plan;
        resolved.resolve(outcome)?;

        match self.store.update_plan(&resolved, read_version).await {
            Ok(()) => {
                info!(
                    plan_id,
                    yes = tally.yes,
                    no = tally.no,
                    non_voters = tally.non_voters,
                    ?outcome,
                    "voting resolved"
                );
                Ok(outcome)
            }
            Err(ClubError::ConcurrentModification { .. }) => {
                // Another resolver won the race; its outcome stands.
                warn!(plan_id, "lost resolution race, reading winner's outcome");
                let current = self
                    .store
                    .get_plan(plan_id)
                    .await?
                    .ok_or(ClubError::PlanNotFound(plan_id))?;
                current
                    .outcome
                    .ok_or(ClubError::ConcurrentModification { plan_id })
            }
            Err(e) => Err(e),
        }
    }

    /// Tally votes over the full eligible member population
    pub async fn tally(&self, plan_id: PlanId) -> ClubResult<VoteTally> {
        let votes = self.store.list_votes(plan_id).await?;
        let eligible = self.store.list_eligible_members().await?.len() as u64;
        Ok(VoteTally::count(&votes, eligible))
    }
}
