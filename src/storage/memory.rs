//! In-memory ledger
//!
//! Thread-safe in-memory implementation of [`LedgerStore`], used for tests
//! and development. Shared state lives behind tokio `RwLock`s; primary keys
//! come from atomic counters. Every method that touches more than one table
//! acquires locks in declaration order: members, plans, votes, payments,
//! allocations, lots, profits, proofs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{LedgerStats, LedgerStore};
use crate::error::{ClubError, ClubResult};
use crate::types::{
    BusinessPlan, FundingAllocation, Member, MemberId, MonthlyPayment, PlanId, PlanProof,
    PlanStatus, ProfitRecord, ShareLot, Vote,
};

/// In-memory ledger store
#[derive(Debug, Default)]
pub struct MemoryLedger {
    members: RwLock<HashMap<MemberId, Member>>,
    plans: RwLock<HashMap<PlanId, BusinessPlan>>,
    votes: RwLock<HashMap<(PlanId, MemberId), Vote>>,
    payments: RwLock<Vec<MonthlyPayment>>,
    allocations: RwLock<Vec<FundingAllocation>>,
    lots: RwLock<Vec<ShareLot>>,
    profits: RwLock<HashMap<PlanId, ProfitRecord>>,
    proofs: RwLock<Vec<PlanProof>>,
    next_member_id: AtomicU64,
    next_plan_id: AtomicU64,
    next_lot_id: AtomicU64,
    next_payment_id: AtomicU64,
    next_proof_id: AtomicU64,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    // ==================== Member operations ====================

    async fn create_member(&self, mut member: Member) -> ClubResult<Member> {
        member.id = Self::next_id(&self.next_member_id);
        let mut members = self.members.write().await;
        members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update_member(&self, member: &Member) -> ClubResult<()> {
        let mut members = self.members.write().await;
        if !members.contains_key(&member.id) {
            return Err(ClubError::MemberNotFound(member.id));
        }
        members.insert(member.id, member.clone());
        Ok(())
    }

    async fn get_member(&self, member_id: MemberId) -> ClubResult<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.get(&member_id).cloned())
    }

    async fn list_members(&self) -> ClubResult<Vec<Member>> {
        let members = self.members.read().await;
        let mut all: Vec<Member> = members.values().cloned().collect();
        all.sort_by_key(|m| m.id);
        Ok(all)
    }

    async fn list_eligible_members(&self) -> ClubResult<Vec<Member>> {
        let members = self.members.read().await;
        let mut eligible: Vec<Member> = members
            .values()
            .filter(|m| m.is_eligible())
            .cloned()
            .collect();
        eligible.sort_by_key(|m| m.id);
        Ok(eligible)
    }

    // ==================== Share lot operations ====================

    async fn append_share_lot(&self, mut lot: ShareLot) -> ClubResult<ShareLot> {
        lot.id = Self::next_id(&self.next_lot_id);
        let mut lots = self.lots.write().await;
        lots.push(lot.clone());
        Ok(lot)
    }

    async fn list_share_lots(&self, member_id: MemberId) -> ClubResult<Vec<ShareLot>> {
        let lots = self.lots.read().await;
        let mut member_lots: Vec<ShareLot> = lots
            .iter()
            .filter(|l| l.member_id == member_id)
            .cloned()
            .collect();
        member_lots.sort_by_key(|l| l.recorded_at);
        Ok(member_lots)
    }

    // ==================== Payment operations ====================

    async fn create_payment(&self, mut payment: MonthlyPayment) -> ClubResult<MonthlyPayment> {
        payment.id = Self::next_id(&self.next_payment_id);
        let mut payments = self.payments.write().await;
        payments.push(payment.clone());
        Ok(payment)
    }

    async fn list_payments(&self, member_id: MemberId) -> ClubResult<Vec<MonthlyPayment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .iter()
            .filter(|p| p.member_id == member_id)
            .cloned()
            .collect())
    }

    // ==================== Plan operations ====================

    async fn create_plan(&self, mut plan: BusinessPlan) -> ClubResult<BusinessPlan> {
        plan.id = Self::next_id(&self.next_plan_id);
        let mut plans = self.plans.write().await;
        plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, plan_id: PlanId) -> ClubResult<Option<BusinessPlan>> {
        let plans = self.plans.read().await;
        Ok(plans.get(&plan_id).cloned())
    }

    async fn update_plan(&self, plan: &BusinessPlan, expected_version: u64) -> ClubResult<()> {
        let mut plans = self.plans.write().await;
        let stored = plans
            .get(&plan.id)
            .ok_or(ClubError::PlanNotFound(plan.id))?;
        if stored.version != expected_version {
            return Err(ClubError::ConcurrentModification { plan_id: plan.id });
        }
        plans.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn list_plans(&self) -> ClubResult<Vec<BusinessPlan>> {
        let plans = self.plans.read().await;
        let mut all: Vec<BusinessPlan> = plans.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn list_due_plans(&self, now: DateTime<Utc>) -> ClubResult<Vec<BusinessPlan>> {
        let plans = self.plans.read().await;
        let mut due: Vec<BusinessPlan> = plans
            .values()
            .filter(|p| p.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|p| p.id);
        Ok(due)
    }

    // ==================== Vote operations ====================

    async fn insert_vote(&self, vote: Vote) -> ClubResult<()> {
        let mut votes = self.votes.write().await;
        let key = (vote.plan_id, vote.member_id);
        if votes.contains_key(&key) {
            return Err(ClubError::AlreadyVoted {
                member_id: vote.member_id,
                plan_id: vote.plan_id,
            });
        }
        votes.insert(key, vote);
        Ok(())
    }

    async fn get_vote(&self, plan_id: PlanId, member_id: MemberId) -> ClubResult<Option<Vote>> {
        let votes = self.votes.read().await;
        Ok(votes.get(&(plan_id, member_id)).cloned())
    }

    async fn list_votes(&self, plan_id: PlanId) -> ClubResult<Vec<Vote>> {
        let votes = self.votes.read().await;
        let mut plan_votes: Vec<Vote> = votes
            .values()
            .filter(|v| v.plan_id == plan_id)
            .cloned()
            .collect();
        plan_votes.sort_by_key(|v| v.member_id);
        Ok(plan_votes)
    }

    // ==================== Allocation operations ====================

    async fn list_allocations(&self, plan_id: PlanId) -> ClubResult<Vec<FundingAllocation>> {
        let allocations = self.allocations.read().await;
        let mut rows: Vec<FundingAllocation> = allocations
            .iter()
            .filter(|a| a.plan_id == plan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.member_id);
        Ok(rows)
    }

    async fn list_member_allocations(
        &self,
        member_id: MemberId,
    ) -> ClubResult<Vec<FundingAllocation>> {
        let allocations = self.allocations.read().await;
        Ok(allocations
            .iter()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect())
    }

    // ==================== Profit operations ====================

    async fn get_profit_record(&self, plan_id: PlanId) -> ClubResult<Option<ProfitRecord>> {
        let profits = self.profits.read().await;
        Ok(profits.get(&plan_id).cloned())
    }

    async fn list_profit_records(&self) -> ClubResult<Vec<ProfitRecord>> {
        let profits = self.profits.read().await;
        let mut records: Vec<ProfitRecord> = profits.values().cloned().collect();
        records.sort_by_key(|r| r.plan_id);
        Ok(records)
    }

    // ==================== Proof operations ====================

    async fn append_plan_proof(&self, mut proof: PlanProof) -> ClubResult<PlanProof> {
        proof.id = Self::next_id(&self.next_proof_id);
        let mut proofs = self.proofs.write().await;
        proofs.push(proof.clone());
        Ok(proof)
    }

    async fn list_plan_proofs(&self, plan_id: PlanId) -> ClubResult<Vec<PlanProof>> {
        let proofs = self.proofs.read().await;
        let mut plan_proofs: Vec<PlanProof> = proofs
            .iter()
            .filter(|p| p.plan_id == plan_id)
            .cloned()
            .collect();
        plan_proofs.sort_by_key(|p| p.recorded_at);
        Ok(plan_proofs)
    }

    // ==================== Atomic commits ====================

    async fn commit_allocation(
        &self,
        plan: &BusinessPlan,
        expected_version: u64,
        new_allocations: Vec<FundingAllocation>,
        new_lots: Vec<ShareLot>,
    ) -> ClubResult<()> {
        // Hold the plans write lock across the whole commit so the version
        // check and the row writes are one atomic unit.
        let mut plans = self.plans.write().await;
        let stored = plans
            .get(&plan.id)
            .ok_or(ClubError::PlanNotFound(plan.id))?;
        if stored.version != expected_version {
            return Err(ClubError::ConcurrentModification { plan_id: plan.id });
        }

        let mut allocations = self.allocations.write().await;
        let mut lots = self.lots.write().await;

        plans.insert(plan.id, plan.clone());
        allocations.extend(new_allocations);
        for mut lot in new_lots {
            lot.id = Self::next_id(&self.next_lot_id);
            lots.push(lot);
        }
        Ok(())
    }

    async fn commit_profit(&self, record: ProfitRecord, new_lots: Vec<ShareLot>) -> ClubResult<()> {
        // Lock order: lots before profits. Nothing is written until the
        // idempotency check passes.
        let mut lots = self.lots.write().await;
        let mut profits = self.profits.write().await;
        if profits.contains_key(&record.plan_id) {
            return Err(ClubError::AlreadyDistributed {
                plan_id: record.plan_id,
            });
        }

        for mut lot in new_lots {
            lot.id = Self::next_id(&self.next_lot_id);
            lots.push(lot);
        }
        profits.insert(record.plan_id, record);
        Ok(())
    }

    // ==================== Stats ====================

    async fn stats(&self) -> ClubResult<LedgerStats> {
        let members = self.members.read().await;
        let plans = self.plans.read().await;
        let votes = self.votes.read().await;
        let allocations = self.allocations.read().await;
        let lots = self.lots.read().await;
        let profits = self.profits.read().await;

        Ok(LedgerStats {
            members: members.len() as u64,
            eligible_members: members.values().filter(|m| m.is_eligible()).count() as u64,
            plans: plans.len() as u64,
            open_plans: plans
                .values()
                .filter(|p| p.status == PlanStatus::Open)
                .count() as u64,
            funded_plans: plans
                .values()
                .filter(|p| p.status == PlanStatus::Funded)
                .count() as u64,
            votes: votes.len() as u64,
            allocations: allocations.len() as u64,
            profit_records: profits.len() as u64,
            share_lots: lots.len() as u64,
        })
    }
}
