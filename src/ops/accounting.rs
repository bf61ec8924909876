//! Share Accounting
//!
//! Read path for member holdings plus the administrative mutations that feed
//! it: base-share grants and monthly payment records. Balances are computed
//! from the append-only lot history, so `as_of` queries come for free.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::config::ClubConfig;
use crate::error::{ClubError, ClubResult};
use crate::storage::LedgerStore;
use crate::types::{
    MemberId, MemberStatement, MonthlyPayment, Principal, ProfitShareEntry, ShareBalance,
    ShareLot, ShareType,
};

/// Sum a member's lots recorded at or before `as_of`
pub(crate) async fn balance_of<S: LedgerStore>(
    store: &S,
    member_id: MemberId,
    as_of: DateTime<Utc>,
) -> ClubResult<ShareBalance> {
    let lots = store.list_share_lots(member_id).await?;
    let mut balance = ShareBalance::default();
    for lot in lots.iter().filter(|l| l.recorded_at <= as_of) {
        match lot.share_type {
            ShareType::Base => balance.base += lot.quantity,
            ShareType::Additional => balance.additional += lot.quantity,
        }
    }
    Ok(balance)
}

/// Share accounting engine
pub struct ShareAccounting<S: LedgerStore> {
    store: Arc<S>,
    config: ClubConfig,
}

impl<S: LedgerStore> ShareAccounting<S> {
    /// Create a share accounting engine over the given store
    pub fn new(store: Arc<S>, config: ClubConfig) -> Self {
        Self { store, config }
    }

    /// A member's share balance at `as_of`
    pub async fn total_shares(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> ClubResult<ShareBalance> {
        self.require_member(member_id).await?;
        balance_of(self.store.as_ref(), member_id, as_of).await
    }

    /// Monetary value of a member's holdings at `as_of`
    pub async fn monetary_value(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> ClubResult<Decimal> {
        let balance = self.total_shares(member_id, as_of).await?;
        Ok(balance.monetary_value(self.config.share_unit_price))
    }

    /// Grant base shares to a member.
    ///
    /// Base holdings only ever grow: grants append a lot, there is no
    /// reduction path.
    pub async fn grant_base_shares(
        &self,
        principal: &Principal,
        member_id: MemberId,
        quantity: u64,
    ) -> ClubResult<ShareLot> {
        principal.require_top()?;
        self.require_member(member_id).await?;

        if quantity == 0 {
            return Err(ClubError::InvalidAmount(
                "share quantity must be positive".to_string(),
            ));
        }

        let lot = self
            .store
            .append_share_lot(ShareLot {
                id: 0,
                member_id,
                share_type: ShareType::Base,
                quantity,
                recorded_at: Utc::now(),
            })
            .await?;

        info!(member_id, quantity, "base shares granted");
        Ok(lot)
    }

    /// Aggregate a member's full position at `as_of`: holdings, payment
    /// history, funding grants and profit splits.
    pub async fn statement(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> ClubResult<MemberStatement> {
        self.require_member(member_id).await?;

        let balance = balance_of(self.store.as_ref(), member_id, as_of).await?;
        let payments = self.store.list_payments(member_id).await?;
        let allocations = self
            .store
            .list_member_allocations(member_id)
            .await?
            .into_iter()
            .filter(|a| a.allocated_at <= as_of)
            .collect();
        let profit_shares = self
            .store
            .list_profit_records()
            .await?
            .into_iter()
            .filter(|r| r.recorded_at <= as_of)
            .filter_map(|r| {
                r.splits
                    .iter()
                    .find(|s| s.member_id == member_id)
                    .cloned()
                    .map(|share| ProfitShareEntry {
                        plan_id: r.plan_id,
                        share,
                    })
            })
            .collect();

        Ok(MemberStatement {
            member_id,
            as_of,
            monetary_value: balance.monetary_value(self.config.share_unit_price),
            balance,
            payments,
            allocations,
            profit_shares,
        })
    }

    /// Record a monthly payment against a member's base shares.
    ///
    /// The amount due is the member's current base-share count at the unit
    /// price; the payment is marked paid when the amount covers it.
    pub async fn record_payment(
        &self,
        principal: &Principal,
        member_id: MemberId,
        month: u32,
        year: i32,
        amount_paid: Decimal,
    ) -> ClubResult<MonthlyPayment> {
        principal.require_top()?;
        self.require_member(member_id).await?;

        if !(1..=12).contains(&month) {
            return Err(ClubError::InvalidAmount(format!("invalid month: {}", month)));
        }
        if amount_paid < Decimal::ZERO {
            return Err(ClubError::InvalidAmount(
                "payment amount cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let balance = balance_of(self.store.as_ref(), member_id, now).await?;
        let amount_due = Decimal::from(balance.base) * self.config.share_unit_price;
        let is_paid = amount_paid >= amount_due;

        let payment = self
            .store
            .create_payment(MonthlyPayment {
                id: 0,
                member_id,
                month,
                year,
                base_share_count: balance.base,
                amount_due,
                amount_paid,
                is_paid,
                paid_at: is_paid.then_some(now),
            })
            .await?;

        info!(member_id, month, year, %amount_due, %amount_paid, is_paid, "monthly payment recorded");
        Ok(payment)
    }

    async fn require_member(&self, member_id: MemberId) -> ClubResult<()> {
        self.store
            .get_member(member_id)
            .await?
            .ok_or(ClubError::MemberNotFound(member_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedger;
    use crate::types::{Member, MemberRole};
    use chrono::Duration;

    async fn seed(store: &Arc<MemoryLedger>) -> (Member, ShareAccounting<MemoryLedger>) {
        let member = store
            .create_member(Member {
                id: 0,
                name: "kiran".to_string(),
                email: "kiran@example.com".to_string(),
                phone: None,
                location: "gav".to_string(),
                role: MemberRole::Top,
                introduced_by: None,
                joined_at: Utc::now(),
            })
            .await
            .unwrap();
        let accounting = ShareAccounting::new(store.clone(), ClubConfig::default());
        (member, accounting)
    }

    #[tokio::test]
    async fn test_balance_sums_lots_by_type() {
        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;
        let principal = member.principal();

        accounting
            .grant_base_shares(&principal, member.id, 10)
            .await
            .unwrap();
        accounting
            .grant_base_shares(&principal, member.id, 5)
            .await
            .unwrap();
        store
            .append_share_lot(ShareLot {
                id: 0,
                member_id: member.id,
                share_type: ShareType::Additional,
                quantity: 3,
                recorded_at: Utc::now(),
            })
            .await
            .unwrap();

        let balance = accounting
            .total_shares(member.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(balance.base, 15);
        assert_eq!(balance.additional, 3);
        assert_eq!(
            accounting
                .monetary_value(member.id, Utc::now())
                .await
                .unwrap(),
            Decimal::from(1_800u64)
        );
    }

    #[tokio::test]
    async fn test_as_of_excludes_later_lots() {
        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;

        let before_any = Utc::now() - Duration::hours(1);
        accounting
            .grant_base_shares(&member.principal(), member.id, 10)
            .await
            .unwrap();

        let balance = accounting
            .total_shares(member.id, before_any)
            .await
            .unwrap();
        assert_eq!(balance.total(), 0);
    }

    #[tokio::test]
    async fn test_payment_settles_when_covering_due() {
        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;
        let principal = member.principal();

        accounting
            .grant_base_shares(&principal, member.id, 10)
            .await
            .unwrap();

        let paid = accounting
            .record_payment(&principal, member.id, 6, 2024, Decimal::from(1_000u64))
            .await
            .unwrap();
        assert_eq!(paid.amount_due, Decimal::from(1_000u64));
        assert!(paid.is_paid);
        assert!(paid.paid_at.is_some());

        let short = accounting
            .record_payment(&principal, member.id, 7, 2024, Decimal::from(500u64))
            .await
            .unwrap();
        assert!(!short.is_paid);
        assert!(short.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_statement_aggregates_position() {
        use crate::types::{MemberProfitShare, ProfitRecord};

        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;
        let principal = member.principal();

        accounting
            .grant_base_shares(&principal, member.id, 10)
            .await
            .unwrap();
        accounting
            .record_payment(&principal, member.id, 6, 2024, Decimal::from(1_000u64))
            .await
            .unwrap();
        store
            .commit_profit(
                ProfitRecord {
                    plan_id: 1,
                    total_amount: Decimal::from(1_000u64),
                    proposer_bonus: Decimal::from(100u64),
                    proposer_id: member.id,
                    splits: vec![MemberProfitShare {
                        member_id: member.id,
                        gross: Decimal::from(900u64),
                        booked: Decimal::from(500u64),
                        carried: Decimal::from(400u64),
                        carried_shares: 4,
                    }],
                    recorded_at: Utc::now(),
                },
                vec![ShareLot {
                    id: 0,
                    member_id: member.id,
                    share_type: ShareType::Additional,
                    quantity: 4,
                    recorded_at: Utc::now(),
                }],
            )
            .await
            .unwrap();

        let statement = accounting.statement(member.id, Utc::now()).await.unwrap();
        assert_eq!(statement.balance.base, 10);
        assert_eq!(statement.balance.additional, 4);
        assert_eq!(statement.monetary_value, Decimal::from(1_400u64));
        assert_eq!(statement.payments.len(), 1);
        assert!(statement.payments_current());
        assert_eq!(statement.profit_shares.len(), 1);
        assert_eq!(statement.total_profit_booked(), Decimal::from(500u64));
        assert_eq!(statement.total_profit_carried(), Decimal::from(400u64));
    }

    #[tokio::test]
    async fn test_statement_excludes_later_activity() {
        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;

        let before_any = Utc::now() - Duration::hours(1);
        accounting
            .grant_base_shares(&member.principal(), member.id, 10)
            .await
            .unwrap();

        let statement = accounting.statement(member.id, before_any).await.unwrap();
        assert_eq!(statement.balance.total(), 0);
        assert_eq!(statement.monetary_value, Decimal::ZERO);
        assert!(statement.profit_shares.is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_grant_rejected() {
        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;

        let err = accounting
            .grant_base_shares(&member.principal(), member.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_unknown_member_rejected() {
        let store = Arc::new(MemoryLedger::new());
        let (member, accounting) = seed(&store).await;

        let err = accounting
            .grant_base_shares(&member.principal(), 999, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::MemberNotFound(999)));
    }
}
