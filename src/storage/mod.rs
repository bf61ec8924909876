//! Ledger Storage
//!
//! Persistence interface for the club ledger: members, share lots, payments,
//! plans, votes, funding allocations and profit records.
//!
//! # Contract
//!
//! - `insert_vote` enforces at most one vote per (member, plan) pair.
//! - `update_plan` and `commit_allocation` are compare-and-swap on the plan's
//!   version column; a stale read fails with `ConcurrentModification`. This is
//!   the per-plan single-writer discipline: it must hold across server
//!   processes, so it lives in the store rather than an in-process mutex.
//! - `commit_allocation` and `commit_profit` are all-or-nothing; a failure
//!   commits no partial rows.
//! - `commit_profit` enforces at most one profit record per plan.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ClubResult;
use crate::types::{
    BusinessPlan, FundingAllocation, Member, MemberId, MonthlyPayment, PlanId, PlanProof,
    ProfitRecord, ShareLot, Vote,
};

/// Ledger storage interface
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ==================== Member operations ====================

    /// Create a member; the backend assigns the primary key and returns the
    /// stored record (the id on the input is ignored)
    async fn create_member(&self, member: Member) -> ClubResult<Member>;

    /// Update an existing member
    async fn update_member(&self, member: &Member) -> ClubResult<()>;

    /// Get a member by id
    async fn get_member(&self, member_id: MemberId) -> ClubResult<Option<Member>>;

    /// List all members, ascending by id
    async fn list_members(&self) -> ClubResult<Vec<Member>>;

    /// List approved (non-new) members, ascending by id
    async fn list_eligible_members(&self) -> ClubResult<Vec<Member>>;

    // ==================== Share lot operations ====================

    /// Append a share lot; the backend assigns the lot id
    async fn append_share_lot(&self, lot: ShareLot) -> ClubResult<ShareLot>;

    /// List a member's share lots, ascending by recording time
    async fn list_share_lots(&self, member_id: MemberId) -> ClubResult<Vec<ShareLot>>;

    // ==================== Payment operations ====================

    /// Record a monthly payment; the backend assigns the payment id
    async fn create_payment(&self, payment: MonthlyPayment) -> ClubResult<MonthlyPayment>;

    /// List a member's payments
    async fn list_payments(&self, member_id: MemberId) -> ClubResult<Vec<MonthlyPayment>>;

    // ==================== Plan operations ====================

    /// Create a plan; the backend assigns the primary key
    async fn create_plan(&self, plan: BusinessPlan) -> ClubResult<BusinessPlan>;

    /// Get a plan by id
    async fn get_plan(&self, plan_id: PlanId) -> ClubResult<Option<BusinessPlan>>;

    /// Update a plan if its stored version equals `expected_version`,
    /// otherwise fail with `ConcurrentModification`
    async fn update_plan(&self, plan: &BusinessPlan, expected_version: u64) -> ClubResult<()>;

    /// List all plans, ascending by id
    async fn list_plans(&self) -> ClubResult<Vec<BusinessPlan>>;

    /// List open plans whose voting deadline is at or before `now`
    async fn list_due_plans(&self, now: DateTime<Utc>) -> ClubResult<Vec<BusinessPlan>>;

    // ==================== Vote operations ====================

    /// Insert a vote; fails with `AlreadyVoted` if one exists for the pair
    async fn insert_vote(&self, vote: Vote) -> ClubResult<()>;

    /// Get a member's vote on a plan
    async fn get_vote(&self, plan_id: PlanId, member_id: MemberId) -> ClubResult<Option<Vote>>;

    /// List all votes on a plan
    async fn list_votes(&self, plan_id: PlanId) -> ClubResult<Vec<Vote>>;

    // ==================== Allocation operations ====================

    /// List allocations for a plan
    async fn list_allocations(&self, plan_id: PlanId) -> ClubResult<Vec<FundingAllocation>>;

    /// List a member's allocations across plans
    async fn list_member_allocations(
        &self,
        member_id: MemberId,
    ) -> ClubResult<Vec<FundingAllocation>>;

    // ==================== Profit operations ====================

    /// Get the profit record for a plan, if distributed
    async fn get_profit_record(&self, plan_id: PlanId) -> ClubResult<Option<ProfitRecord>>;

    /// List all profit records, ascending by plan id
    async fn list_profit_records(&self) -> ClubResult<Vec<ProfitRecord>>;

    // ==================== Proof operations ====================

    /// Append execution evidence for a plan; the backend assigns the proof id
    async fn append_plan_proof(&self, proof: PlanProof) -> ClubResult<PlanProof>;

    /// List a plan's filed evidence, ascending by filing time
    async fn list_plan_proofs(&self, plan_id: PlanId) -> ClubResult<Vec<PlanProof>>;

    // ==================== Atomic commits ====================

    /// Atomically persist a completed allocation: the funded plan (checked
    /// against `expected_version`), its allocation rows, and the additional
    /// share lots they grant. All-or-nothing.
    async fn commit_allocation(
        &self,
        plan: &BusinessPlan,
        expected_version: u64,
        allocations: Vec<FundingAllocation>,
        lots: Vec<ShareLot>,
    ) -> ClubResult<()>;

    /// Atomically persist a profit distribution: the record plus the carried
    /// share lots. Fails with `AlreadyDistributed` if the plan already has a
    /// record. All-or-nothing.
    async fn commit_profit(&self, record: ProfitRecord, lots: Vec<ShareLot>) -> ClubResult<()>;

    // ==================== Stats ====================

    /// Row counts for monitoring
    async fn stats(&self) -> ClubResult<LedgerStats>;
}

/// Ledger row counts
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerStats {
    /// Total members
    pub members: u64,
    /// Approved members
    pub eligible_members: u64,
    /// Total plans
    pub plans: u64,
    /// Plans with an open voting window
    pub open_plans: u64,
    /// Funded plans
    pub funded_plans: u64,
    /// Total votes
    pub votes: u64,
    /// Total allocation rows
    pub allocations: u64,
    /// Total profit records
    pub profit_records: u64,
    /// Total share lots
    pub share_lots: u64,
}

pub use memory::MemoryLedger;
