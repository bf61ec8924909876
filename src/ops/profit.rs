//! Profit Distributor
//!
//! Books profit against a funded plan: the proposer takes a bonus off the
//! top, the rest is split pro-rata by each eligible member's total holdings
//! at recording time. Per member, a book percentage divides the gross into an
//! immediate payout and a carry-forward converted to whole additional shares;
//! sub-share remainders return to the payout.
//!
//! All division happens in integral paise with the residue handed out one
//! paisa at a time in ascending member id, so the distribution conserves the
//! recorded amount exactly.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use super::accounting::balance_of;
use crate::config::ClubConfig;
use crate::error::{ClubError, ClubResult};
use crate::storage::LedgerStore;
use crate::types::{
    BookSchedule, MemberId, MemberProfitShare, PlanId, PlanStatus, Principal, ProfitRecord,
    ShareLot, ShareType,
};

/// Profit distributor
pub struct ProfitDistributor<S: LedgerStore> {
    store: Arc<S>,
    config: ClubConfig,
}

impl<S: LedgerStore> ProfitDistributor<S> {
    /// Create a profit distributor over the given store
    pub fn new(store: Arc<S>, config: ClubConfig) -> Self {
        Self { store, config }
    }

    /// Record and distribute profit for a funded plan
    pub async fn record_profit(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        amount: Decimal,
        schedule: &BookSchedule,
    ) -> ClubResult<ProfitRecord> {
        self.record_profit_at(principal, plan_id, amount, schedule, Utc::now())
            .await
    }

    /// Record and distribute profit with an explicit clock.
    ///
    /// Top members only; requires the plan to be `Funded` and not yet
    /// distributed. Idempotent per plan: a second call fails with
    /// `AlreadyDistributed`.
    pub async fn record_profit_at(
        &self,
        principal: &Principal,
        plan_id: PlanId,
        amount: Decimal,
        schedule: &BookSchedule,
        now: DateTime<Utc>,
    ) -> ClubResult<ProfitRecord> {
        principal.require_top()?;

        if amount <= Decimal::ZERO || amount != amount.round_dp(2) {
            return Err(ClubError::InvalidAmount(
                "profit must be positive with at most two decimal places".to_string(),
            ));
        }
        if !schedule.is_valid() {
            return Err(ClubError::InvalidAmount(
                "book percentages must be within 0-100".to_string(),
            ));
        }

        let plan = self
            .store
            .get_plan(plan_id)
            .await?
            .ok_or(ClubError::PlanNotFound(plan_id))?;
        if plan.status != PlanStatus::Funded {
            return Err(ClubError::PlanNotFunded { plan_id });
        }
        if self.store.get_profit_record(plan_id).await?.is_some() {
            return Err(ClubError::AlreadyDistributed { plan_id });
        }

        let members = self.store.list_eligible_members().await?;
        let mut holdings: Vec<(MemberId, u64)> = Vec::with_capacity(members.len());
        for member in &members {
            let balance = balance_of(self.store.as_ref(), member.id, now).await?;
            holdings.push((member.id, balance.total()));
        }
        let total_shares: u64 = holdings.iter().map(|(_, s)| s).sum();
        if total_shares == 0 {
            return Err(ClubError::InvalidAmount(
                "no shares outstanding to distribute against".to_string(),
            ));
        }

        let amount_paise = to_paise(amount)?;
        let bonus_paise = percent_floor(amount_paise, self.config.proposer_bonus_percent)?;
        let pool_paise = amount_paise - bonus_paise;
        let unit_paise = to_paise(self.config.share_unit_price)?;

        // Gross pro-rata split of the pool, floor division with the residue
        // assigned paisa-by-paisa in ascending member id among shareholders.
        let shareholders: Vec<(MemberId, u64)> =
            holdings.into_iter().filter(|(_, s)| *s > 0).collect();
        let mut gross: Vec<i64> = shareholders
            .iter()
            .map(|(_, shares)| {
                (pool_paise as i128 * *shares as i128 / total_shares as i128) as i64
            })
            .collect();
        // Floor division leaves fewer leftover paise than shareholders, so
        // one pass over the lowest ids absorbs all of them.
        let residue = (pool_paise - gross.iter().sum::<i64>()) as usize;
        for g in gross.iter_mut().take(residue) {
            *g += 1;
        }

        let mut splits = Vec::with_capacity(shareholders.len());
        let mut lots = Vec::new();
        for ((member_id, _), gross_paise) in shareholders.iter().zip(gross) {
            let percent = schedule.percent_for(*member_id);
            let mut booked_paise = percent_floor(gross_paise, percent)?;
            let carried_paise = gross_paise - booked_paise;

            // Carry-forward converts to whole shares only; the sub-share
            // remainder goes back to the payout.
            let carried_shares = (carried_paise / unit_paise) as u64;
            let carried_whole = carried_shares as i64 * unit_paise;
            booked_paise += carried_paise - carried_whole;

            splits.push(MemberProfitShare {
                member_id: *member_id,
                gross: from_paise(gross_paise),
                booked: from_paise(booked_paise),
                carried: from_paise(carried_whole),
                carried_shares,
            });
            if carried_shares > 0 {
                lots.push(ShareLot {
                    id: 0,
                    member_id: *member_id,
                    share_type: ShareType::Additional,
                    quantity: carried_shares,
                    recorded_at: now,
                });
            }
        }

        let record = ProfitRecord {
            plan_id,
            total_amount: amount,
            proposer_bonus: from_paise(bonus_paise),
            proposer_id: plan.proposer_id,
            splits,
            recorded_at: now,
        };
        self.store.commit_profit(record.clone(), lots).await?;

        info!(
            plan_id,
            %amount,
            bonus = %record.proposer_bonus,
            members = record.splits.len(),
            "profit distributed"
        );
        Ok(record)
    }
}

fn to_paise(amount: Decimal) -> ClubResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| ClubError::InvalidAmount(format!("amount out of range: {}", amount)))
}

fn from_paise(paise: i64) -> Decimal {
    Decimal::new(paise, 2)
}

fn percent_floor(paise: i64, percent: Decimal) -> ClubResult<i64> {
    (Decimal::from(paise) * percent / Decimal::ONE_HUNDRED)
        .floor()
        .to_i64()
        .ok_or_else(|| ClubError::InvalidAmount(format!("percentage out of range: {}", percent)))
}
