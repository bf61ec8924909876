//! Funding Allocator
//!
//! Turns a resolved vote into share allocations toward the plan's funding
//! target. A unanimous yes runs a single equal-split round over all eligible
//! members; a partial yes runs Round 1 over the yes-voters pro-rata by their
//! base-share stake, then opens the remainder to the full population in
//! Round 2 (non-voters included, under the minimum-share criterion).
//!
//! Determinism: all arithmetic is integral floor division; rounding leftovers
//! are handed out one share at a time in ascending member id. Per-member
//! capacity is the base-share count in Round 1 and total holdings minus the
//! Round 1 grant in Round 2. The commit is a single version-checked write, so
//! a failure leaves the plan `Closed` with no rows written.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::accounting::balance_of;
use crate::config::ClubConfig;
use crate::error::{ClubError, ClubResult};
use crate::storage::LedgerStore;
use crate::types::{
    AllocationSummary, FundingAllocation, MemberId, PlanId, PlanStatus, ShareBalance, ShareLot,
    ShareType, VoteChoice, VoteOutcome,
};

/// One member's position entering a funding round
#[derive(Debug, Clone, Copy)]
struct Entrant {
    member_id: MemberId,
    /// Pro-rata weight
    stake: u64,
    /// Maximum shares this member may take in the round
    capacity: u64,
}

/// Funding allocator
pub struct FundingAllocator<S: LedgerStore> {
    store: Arc<S>,
    config: ClubConfig,
}

impl<S: LedgerStore> FundingAllocator<S> {
    /// Create a funding allocator over the given store
    pub fn new(store: Arc<S>, config: ClubConfig) -> Self {
        Self { store, config }
    }

    /// Run the funding rounds for a resolved plan
    pub async fn allocate(&self, plan_id: PlanId) -> ClubResult<AllocationSummary> {
        self.allocate_at(plan_id, Utc::now()).await
    }

    /// Run the funding rounds with an explicit clock.
    ///
    /// Requires the plan to be `Closed` with an approving outcome; fails with
    /// `NotResolved` otherwise. Commits atomically and moves the plan to
    /// `Funded`.
    pub async fn allocate_at(
        &self,
        plan_id: PlanId,
        now: DateTime<Utc>,
    ) -> ClubResult<AllocationSummary> {
        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or(ClubError::PlanNotFound(plan_id))?;

        if plan.status != PlanStatus::Closed {
            return Err(ClubError::NotResolved { plan_id });
        }
        let outcome = match plan.outcome {
            Some(o) if o.is_approved() => o,
            _ => return Err(ClubError::NotResolved { plan_id }),
        };
        let read_version = plan.version;

        let unit_price = self.config.share_unit_price;
        let target_shares = (plan.funding_target / unit_price)
            .floor()
            .to_u64()
            .ok_or_else(|| {
                ClubError::InvalidAmount("funding target does not fit in whole shares".to_string())
            })?;

        let members = self.store.list_eligible_members().await?;
        if members.is_empty() {
            return Err(ClubError::InsufficientFunds {
                target_shares,
                capacity: 0,
            });
        }

        let mut balances: Vec<(MemberId, ShareBalance)> = Vec::with_capacity(members.len());
        for member in &members {
            let balance = balance_of(self.store.as_ref(), member.id, now).await?;
            balances.push((member.id, balance));
        }

        let (round1, round2) = match outcome {
            VoteOutcome::UnanimousYes => {
                let grants = equal_split(target_shares, &balances, plan.proposer_id);
                (grants, HashMap::new())
            }
            VoteOutcome::PartialYes => {
                let votes = self.store.list_votes(plan_id).await?;
                let yes_voters: Vec<MemberId> = votes
                    .iter()
                    .filter(|v| v.choice == VoteChoice::Yes)
                    .map(|v| v.member_id)
                    .collect();

                // Round 1: yes-voters only, weighted and capped by base stake.
                let entrants: Vec<Entrant> = balances
                    .iter()
                    .filter(|(id, _)| yes_voters.contains(id))
                    .map(|(id, b)| Entrant {
                        member_id: *id,
                        stake: b.base,
                        capacity: b.base,
                    })
                    .collect();
                let round1 = pro_rata(target_shares, &entrants);
                let round1_total: u64 = round1.values().sum();

                // Round 2: remainder opens to the full population, weighted
                // by total holdings net of the Round 1 grant.
                let remaining = target_shares - round1_total;
                let round2 = if remaining > 0 {
                    let entrants: Vec<Entrant> = balances
                        .iter()
                        .map(|(id, b)| {
                            let taken = round1.get(id).copied().unwrap_or(0);
                            Entrant {
                                member_id: *id,
                                stake: b.total(),
                                capacity: b.total().saturating_sub(taken),
                            }
                        })
                        .collect();
                    pro_rata(remaining, &entrants)
                } else {
                    HashMap::new()
                };
                (round1, round2)
            }
            VoteOutcome::Rejected => unreachable!("guarded by is_approved"),
        };

        let round1_shares: u64 = round1.values().sum();
        let round2_shares: u64 = round2.values().sum();
        let allocated_shares = round1_shares + round2_shares;
        if allocated_shares == 0 {
            return Err(ClubError::InsufficientFunds {
                target_shares,
                capacity: balances.iter().map(|(_, b)| b.total()).sum(),
            });
        }
        debug_assert!(allocated_shares <= target_shares);

        let mut rows = Vec::new();
        let mut lots = Vec::new();
        for (member_id, _) in &balances {
            let r1 = round1.get(member_id).copied().unwrap_or(0);
            let r2 = round2.get(member_id).copied().unwrap_or(0);
            if r1 + r2 == 0 {
                continue;
            }
            rows.push(FundingAllocation {
                plan_id,
                member_id: *member_id,
                round1_shares: r1,
                round2_shares: r2,
                allocated_at: now,
            });
            lots.push(ShareLot {
                id: 0,
                member_id: *member_id,
                share_type: ShareType::Additional,
                quantity: r1 + r2,
                recorded_at: now,
            });
        }

        let mut funded = plan;
        funded.mark_funded(Decimal::from(allocated_shares) * unit_price)?;
        self.store
            .commit_allocation(&funded, read_version, rows, lots)
            .await?;

        info!(
            plan_id,
            ?outcome,
            target_shares,
            round1_shares,
            round2_shares,
            "funding allocation committed"
        );

        Ok(AllocationSummary {
            plan_id,
            target_shares,
            round1_shares,
            round2_shares,
        })
    }
}

/// Scenario 1: equal split over all eligible members, capped at each member's
/// base stake, with the leftover handed to the proposer up to their remaining
/// capacity.
fn equal_split(
    target: u64,
    balances: &[(MemberId, ShareBalance)],
    proposer_id: MemberId,
) -> HashMap<MemberId, u64> {
    let n = balances.len() as u64;
    let equal = target / n;

    let mut grants: HashMap<MemberId, u64> = HashMap::new();
    let mut allocated = 0u64;
    for (member_id, balance) in balances {
        let grant = equal.min(balance.base);
        grants.insert(*member_id, grant);
        allocated += grant;
    }

    let leftover = target - allocated;
    if leftover > 0 {
        if let Some((_, balance)) = balances.iter().find(|(id, _)| *id == proposer_id) {
            let grant = grants.entry(proposer_id).or_insert(0);
            let headroom = balance.base.saturating_sub(*grant);
            *grant += leftover.min(headroom);
        }
    }

    grants.retain(|_, g| *g > 0);
    grants
}

/// One pro-rata round: `floor(target * stake / total_stake)` per entrant,
/// capped at capacity, then the rounding leftover is handed out one share at
/// a time in ascending member id among entrants with remaining capacity.
fn pro_rata(target: u64, entrants: &[Entrant]) -> HashMap<MemberId, u64> {
    let total_stake: u128 = entrants.iter().map(|e| e.stake as u128).sum();
    if total_stake == 0 || target == 0 {
        return HashMap::new();
    }

    let mut grants: Vec<u64> = entrants
        .iter()
        .map(|e| {
            let proportional = (target as u128 * e.stake as u128 / total_stake) as u64;
            proportional.min(e.capacity)
        })
        .collect();
    let mut allocated: u64 = grants.iter().sum();

    // Entrants arrive sorted ascending by member id, so a straight scan is
    // the lowest-id-first tie-break.
    'fill: while allocated < target {
        let mut progressed = false;
        for (i, entrant) in entrants.iter().enumerate() {
            if allocated == target {
                break 'fill;
            }
            if grants[i] < entrant.capacity {
                grants[i] += 1;
                allocated += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    debug!(target, allocated, "pro-rata round complete");

    entrants
        .iter()
        .zip(grants)
        .filter(|(_, g)| *g > 0)
        .map(|(e, g)| (e.member_id, g))
        .collect()
}
