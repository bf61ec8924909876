//! Club Service
//!
//! Facade composing the four pipeline engines over a single ledger store,
//! plus the member registry operations the pipeline depends on. An API layer
//! wraps this service one-to-one; nothing here touches HTTP.

pub mod sweeper;

pub use sweeper::{ResolutionSweeper, SweepReport, SweeperHandle};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::config::ClubConfig;
use crate::error::{ClubError, ClubResult};
use crate::ops::{FundingAllocator, ProfitDistributor, ShareAccounting, VotingEngine};
use crate::storage::{LedgerStats, LedgerStore};
use crate::types::{
    AllocationSummary, BookSchedule, BusinessPlan, Member, MemberId, MemberRole, MemberStatement,
    MonthlyPayment, PlanId, PlanProof, PlanStatus, Principal, ProfitRecord, ShareBalance,
    ShareLot, Vote, VoteChoice, VoteOutcome, VoteTally,
};

/// New member registration data
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub introduced_by: Option<MemberId>,
}

/// Club service facade
pub struct ClubService<S: LedgerStore> {
    store: Arc<S>,
    config: ClubConfig,
    voting: VotingEngine<S>,
    funding: FundingAllocator<S>,
    profit: ProfitDistributor<S>,
    accounting: ShareAccounting<S>,
}

impl<S: LedgerStore + 'static> ClubService<S> {
    /// Create a service over the given store
    pub fn new(store: Arc<S>, config: ClubConfig) -> Self {
        Self {
            voting: VotingEngine::new(store.clone(), config.clone()),
            funding: FundingAllocator::new(store.clone(), config.clone()),
            profit: ProfitDistributor::new(store.clone(), config.clone()),
            accounting: ShareAccounting::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    // ==================== Member registry ====================

    /// Register a new member pending approval
    pub async fn register_member(&self, registration: Registration) -> ClubResult<Member> {
        if let Some(introducer_id) = registration.introduced_by {
            self.store
                .get_member(introducer_id)
                .await?
                .ok_or(ClubError::MemberNotFound(introducer_id))?;
        }

        let member = self
            .store
            .create_member(Member {
                id: 0,
                name: registration.name,
                email: registration.email,
                phone: registration.phone,
                location: registration.location,
                role: MemberRole::New,
                introduced_by: registration.introduced_by,
                joined_at: Utc::now(),
            })
            .await?;
        info!(member_id = member.id, "member registered, pending approval");
        Ok(member)
    }

    /// Approve a pending member (top members only)
    pub async fn approve_member(
        &self,
        principal: &Principal,
        member_id: MemberId,
    ) -> ClubResult<Member> {
        principal.require_top()?;
        let mut member = self
            .store
            .get_member(member_id)
            .await?
            .ok_or(ClubError::MemberNotFound(member_id))?;
        if member.role == MemberRole::New {
            member.role = MemberRole::Regular;
            self.store.update_member(&member).await?;
            info!(member_id, "member approved");
        }
        Ok(member)
    }

    /// Create the initial top member.
    ///
    /// Bootstrap-only: used when the club is first set up and no principal
    /// exists yet to authorize the call.
    pub async fn bootstrap_top_member(&self, registration: Registration) -> ClubResult<Member> {
        let member = self
            .store
            .create_member(Member {
                id: 0,
                name: registration.name,
                email: registration.email,
                phone: registration.phone,
                location: registration.location,
                role: MemberRole::Top,
                introduced_by: registration.introduced_by,
                joined_at: Utc::now(),
            })
            .await?;
        info!(member_id = member.id, "top member bootstrapped");
        Ok(member)
    }

    /// List all members
    pub async fn list_members(&self) -> ClubResult<Vec<Member>> {
        self.store.list_members().await
    }

    // ==================== Voting ====================

    /// Open a plan with the voting window starting now
    pub async fn open_plan(
        &self,
        principal: &Principal,
        title: String,
        description: String,
        funding_target: Decimal,
    ) -> ClubResult<BusinessPlan> {
        self.voting
            .open_plan(principal, title, description, funding_target)
            .await
    }

    /// Cast a vote on an open plan
    pub async fn cast_vote(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        choice: VoteChoice,
    ) -> ClubResult<Vote> {
        self.voting.cast_vote(principal, plan_id, choice).await
    }

    /// Resolve a plan whose deadline has passed
    pub async fn resolve(&self, plan_id: PlanId) -> ClubResult<VoteOutcome> {
        self.voting.resolve(plan_id).await
    }

    /// Current tally for a plan
    pub async fn tally(&self, plan_id: PlanId) -> ClubResult<VoteTally> {
        self.voting.tally(plan_id).await
    }

    // ==================== Funding ====================

    /// Run funding rounds for a resolved plan
    pub async fn allocate(&self, plan_id: PlanId) -> ClubResult<AllocationSummary> {
        self.funding.allocate(plan_id).await
    }

    // ==================== Profit ====================

    /// Record and distribute profit for a funded plan
    pub async fn record_profit(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        amount: Decimal,
        schedule: &BookSchedule,
    ) -> ClubResult<ProfitRecord> {
        self.profit
            .record_profit(principal, plan_id, amount, schedule)
            .await
    }

    // ==================== Plan proofs ====================

    /// File execution evidence against a funded plan (top members only)
    pub async fn record_proof(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        note: String,
    ) -> ClubResult<PlanProof> {
        principal.require_top()?;
        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or(ClubError::PlanNotFound(plan_id))?;
        if plan.status != PlanStatus::Funded {
            return Err(ClubError::PlanNotFunded { plan_id });
        }

        let proof = self
            .store
            .append_plan_proof(PlanProof {
                id: 0,
                plan_id,
                recorded_by: principal.member_id,
                note,
                recorded_at: Utc::now(),
            })
            .await?;
        info!(plan_id, proof_id = proof.id, "plan proof filed");
        Ok(proof)
    }

    /// List a plan's filed evidence
    pub async fn list_proofs(&self, plan_id: PlanId) -> ClubResult<Vec<PlanProof>> {
        self.store.list_plan_proofs(plan_id).await
    }

    // ==================== Share accounting ====================

    /// A member's share balance at `as_of`
    pub async fn total_shares(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> ClubResult<ShareBalance> {
        self.accounting.total_shares(member_id, as_of).await
    }

    /// Monetary value of a member's holdings at `as_of`
    pub async fn monetary_value(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> ClubResult<Decimal> {
        self.accounting.monetary_value(member_id, as_of).await
    }

    /// A member's aggregated statement at `as_of`
    pub async fn statement(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> ClubResult<MemberStatement> {
        self.accounting.statement(member_id, as_of).await
    }

    /// Grant base shares to a member (top members only)
    pub async fn grant_base_shares(
        &self,
        principal: &Principal,
        member_id: MemberId,
        quantity: u64,
    ) -> ClubResult<ShareLot> {
        self.accounting
            .grant_base_shares(principal, member_id, quantity)
            .await
    }

    /// Record a monthly payment (top members only)
    pub async fn record_payment(
        &self,
        principal: &Principal,
        member_id: MemberId,
        month: u32,
        year: i32,
        amount_paid: Decimal,
    ) -> ClubResult<MonthlyPayment> {
        self.accounting
            .record_payment(principal, member_id, month, year, amount_paid)
            .await
    }

    // ==================== Background services ====================

    /// Start the resolution sweeper for due plans
    pub fn start_sweeper(&self) -> SweeperHandle {
        ResolutionSweeper::new(self.store.clone(), self.config.clone()).start()
    }

    // ==================== Accessors ====================

    /// Ledger row counts
    pub async fn stats(&self) -> ClubResult<LedgerStats> {
        self.store.stats().await
    }

    /// Service configuration
    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
