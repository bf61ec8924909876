//! End-to-end pipeline tests: registration, voting, funding and profit
//! distribution over one in-memory ledger. Time-dependent steps use the
//! explicit-clock entry points so the tests never sleep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use club_core::{
    BookSchedule, ClubConfig, ClubService, FundingAllocator, LedgerStore, MemoryLedger,
    PlanStatus, ProfitDistributor, Registration, ResolutionSweeper, VoteChoice, VoteOutcome,
    VotingEngine,
};

fn registration(name: &str) -> Registration {
    Registration {
        name: name.to_string(),
        email: format!("{}@example.com", name),
        phone: None,
        location: "pune".to_string(),
        introduced_by: None,
    }
}

#[tokio::test]
async fn test_unanimous_plan_full_lifecycle() {
    let store = Arc::new(MemoryLedger::new());
    let config = ClubConfig::default();
    let service = ClubService::new(store.clone(), config.clone());

    // One top member bootstraps the club and approves two recruits.
    let admin = service.bootstrap_top_member(registration("admin")).await.unwrap();
    let ravi = service.register_member(registration("ravi")).await.unwrap();
    let meena = service.register_member(registration("meena")).await.unwrap();
    let ravi = service.approve_member(&admin.principal(), ravi.id).await.unwrap();
    let meena = service.approve_member(&admin.principal(), meena.id).await.unwrap();

    let principal = admin.principal();
    service.grant_base_shares(&principal, admin.id, 40).await.unwrap();
    service.grant_base_shares(&principal, ravi.id, 40).await.unwrap();
    service.grant_base_shares(&principal, meena.id, 40).await.unwrap();

    // ₹10,000 target at ₹100 a share.
    let plan = service
        .open_plan(
            &principal,
            "dairy expansion".to_string(),
            "second milk route".to_string(),
            Decimal::from(10_000u64),
        )
        .await
        .unwrap();
    service.cast_vote(&principal, plan.id, VoteChoice::Yes).await.unwrap();
    service.cast_vote(&ravi.principal(), plan.id, VoteChoice::Yes).await.unwrap();
    service.cast_vote(&meena.principal(), plan.id, VoteChoice::Yes).await.unwrap();

    let after = plan.voting_deadline + Duration::minutes(1);
    let voting = VotingEngine::new(store.clone(), config.clone());
    assert_eq!(
        voting.resolve_at(plan.id, after).await.unwrap(),
        VoteOutcome::UnanimousYes
    );

    // Unanimous: equal split of 100 shares, remainder to the proposer.
    let funding = FundingAllocator::new(store.clone(), config.clone());
    let summary = funding.allocate_at(plan.id, after).await.unwrap();
    assert_eq!(summary.target_shares, 100);
    assert_eq!(summary.allocated_shares(), 100);
    assert!(summary.fully_funded());

    let rows = store.list_allocations(plan.id).await.unwrap();
    let grant_for = |id| {
        rows.iter()
            .find(|a| a.member_id == id)
            .map(|a| a.total_shares())
            .unwrap_or(0)
    };
    assert_eq!(grant_for(admin.id), 34); // 33 + the remainder
    assert_eq!(grant_for(ravi.id), 33);
    assert_eq!(grant_for(meena.id), 33);

    let stored = store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Funded);
    assert_eq!(stored.funded_amount, Decimal::from(10_000u64));

    // Allocation shares now show up as additional holdings.
    let balance = service.total_shares(admin.id, after).await.unwrap();
    assert_eq!(balance.base, 40);
    assert_eq!(balance.additional, 34);
    assert_eq!(
        service.monetary_value(admin.id, after).await.unwrap(),
        Decimal::from(7_400u64)
    );

    // ₹2,000 profit: ₹200 bonus, the rest pro-rata by total holdings
    // (74 / 73 / 73 of 220 shares).
    let profit = ProfitDistributor::new(store.clone(), config);
    let record = profit
        .record_profit_at(
            &principal,
            plan.id,
            Decimal::from(2_000u64),
            &BookSchedule::book_all(),
            after,
        )
        .await
        .unwrap();
    assert_eq!(record.proposer_bonus, Decimal::from(200u64));
    assert_eq!(record.proposer_id, admin.id);
    assert_eq!(
        record.proposer_bonus + record.total_booked() + record.total_carried(),
        Decimal::from(2_000u64)
    );
}

#[tokio::test]
async fn test_partial_yes_runs_two_rounds() {
    let store = Arc::new(MemoryLedger::new());
    let config = ClubConfig::default();
    let service = ClubService::new(store.clone(), config.clone());

    let a = service.bootstrap_top_member(registration("a")).await.unwrap();
    let b = service.register_member(registration("b")).await.unwrap();
    let c = service.register_member(registration("c")).await.unwrap();
    let b = service.approve_member(&a.principal(), b.id).await.unwrap();
    let c = service.approve_member(&a.principal(), c.id).await.unwrap();

    service.grant_base_shares(&a.principal(), a.id, 20).await.unwrap();
    service.grant_base_shares(&a.principal(), b.id, 20).await.unwrap();
    service.grant_base_shares(&a.principal(), c.id, 10).await.unwrap();

    // Target of 50 shares; c votes no.
    let plan = service
        .open_plan(
            &a.principal(),
            "grain storage".to_string(),
            "silo lease".to_string(),
            Decimal::from(5_000u64),
        )
        .await
        .unwrap();
    service.cast_vote(&a.principal(), plan.id, VoteChoice::Yes).await.unwrap();
    service.cast_vote(&b.principal(), plan.id, VoteChoice::Yes).await.unwrap();
    service.cast_vote(&c.principal(), plan.id, VoteChoice::No).await.unwrap();

    let after = plan.voting_deadline + Duration::minutes(1);
    let voting = VotingEngine::new(store.clone(), config.clone());
    assert_eq!(
        voting.resolve_at(plan.id, after).await.unwrap(),
        VoteOutcome::PartialYes
    );

    let funding = FundingAllocator::new(store.clone(), config);
    let summary = funding.allocate_at(plan.id, after).await.unwrap();

    // Round 1 fills the yes-voters to their base capacity (20 + 20); the
    // remaining 10 shares open to everyone in Round 2 and land on c, the
    // only member with headroom left.
    assert_eq!(summary.round1_shares, 40);
    assert_eq!(summary.round2_shares, 10);
    assert!(summary.fully_funded());

    let rows = store.list_allocations(plan.id).await.unwrap();
    let row_for = |id| rows.iter().find(|r| r.member_id == id);
    assert_eq!(row_for(a.id).map(|r| r.round1_shares), Some(20));
    assert_eq!(row_for(b.id).map(|r| r.round1_shares), Some(20));
    assert_eq!(row_for(c.id).map(|r| r.round2_shares), Some(10));
}

#[tokio::test]
async fn test_rejected_plan_never_funds() {
    let store = Arc::new(MemoryLedger::new());
    let config = ClubConfig::default();
    let service = ClubService::new(store.clone(), config.clone());

    let a = service.bootstrap_top_member(registration("a")).await.unwrap();
    service.grant_base_shares(&a.principal(), a.id, 10).await.unwrap();

    let plan = service
        .open_plan(
            &a.principal(),
            "t".to_string(),
            "d".to_string(),
            Decimal::from(1_000u64),
        )
        .await
        .unwrap();
    service.cast_vote(&a.principal(), plan.id, VoteChoice::No).await.unwrap();

    let after = plan.voting_deadline + Duration::minutes(1);
    let voting = VotingEngine::new(store.clone(), config.clone());
    assert_eq!(
        voting.resolve_at(plan.id, after).await.unwrap(),
        VoteOutcome::Rejected
    );

    let funding = FundingAllocator::new(store.clone(), config);
    assert!(funding.allocate_at(plan.id, after).await.is_err());

    let stored = store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Rejected);
    assert!(store.list_allocations(plan.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sweeper_completes_the_pipeline() {
    let store = Arc::new(MemoryLedger::new());
    let config = ClubConfig::test();
    let service = ClubService::new(store.clone(), config.clone());

    let a = service.bootstrap_top_member(registration("a")).await.unwrap();
    let b = service.register_member(registration("b")).await.unwrap();
    let b = service.approve_member(&a.principal(), b.id).await.unwrap();
    service.grant_base_shares(&a.principal(), a.id, 30).await.unwrap();
    service.grant_base_shares(&a.principal(), b.id, 30).await.unwrap();

    let plan = service
        .open_plan(
            &a.principal(),
            "t".to_string(),
            "d".to_string(),
            Decimal::from(4_000u64),
        )
        .await
        .unwrap();
    service.cast_vote(&a.principal(), plan.id, VoteChoice::Yes).await.unwrap();
    service.cast_vote(&b.principal(), plan.id, VoteChoice::Yes).await.unwrap();

    let sweeper = ResolutionSweeper::new(store.clone(), config.clone());
    let after = plan.voting_deadline + Duration::minutes(1);
    let report = sweeper.sweep_once(after).await.unwrap();
    assert_eq!(report.resolved, 1);
    assert_eq!(report.funded, 1);

    // A second pass finds nothing left to do.
    let again = sweeper.sweep_once(after).await.unwrap();
    assert_eq!(again.resolved, 0);

    let stored = store.get_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PlanStatus::Funded);

    // Profit lands on the sweeper-funded plan just like a manual one.
    let profit = ProfitDistributor::new(store.clone(), config);
    let record = profit
        .record_profit_at(
            &a.principal(),
            plan.id,
            Decimal::from(1_000u64),
            &BookSchedule::book_all(),
            after,
        )
        .await
        .unwrap();
    assert_eq!(record.proposer_bonus, Decimal::from(100u64));

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.funded_plans, 1);
    assert_eq!(stats.profit_records, 1);
}

#[tokio::test]
async fn test_carried_shares_compound_into_later_distributions() {
    let store = Arc::new(MemoryLedger::new());
    let config = ClubConfig::default();
    let service = ClubService::new(store.clone(), config.clone());

    let a = service.bootstrap_top_member(registration("a")).await.unwrap();
    let b = service.register_member(registration("b")).await.unwrap();
    let b = service.approve_member(&a.principal(), b.id).await.unwrap();
    service.grant_base_shares(&a.principal(), a.id, 10).await.unwrap();
    service.grant_base_shares(&a.principal(), b.id, 10).await.unwrap();

    let open_and_fund = |title: String| {
        let service = &service;
        let store = &store;
        let config = config.clone();
        let a = &a;
        let b = &b;
        async move {
            let plan = service
                .open_plan(&a.principal(), title, "d".to_string(), Decimal::from(2_000u64))
                .await
                .unwrap();
            service.cast_vote(&a.principal(), plan.id, VoteChoice::Yes).await.unwrap();
            service.cast_vote(&b.principal(), plan.id, VoteChoice::Yes).await.unwrap();
            let after = plan.voting_deadline + Duration::minutes(1);
            VotingEngine::new(store.clone(), config.clone())
                .resolve_at(plan.id, after)
                .await
                .unwrap();
            FundingAllocator::new(store.clone(), config)
                .allocate_at(plan.id, after)
                .await
                .unwrap();
            (plan.id, after)
        }
    };

    let (first, after) = open_and_fund("first".to_string()).await;

    // Member a carries everything forward; 20 shares each after funding,
    // so a's gross of ₹450 converts to 4 shares with ₹50 booked back.
    let profit = ProfitDistributor::new(store.clone(), config.clone());
    let schedule = BookSchedule::book_all().with_percent(a.id, Decimal::ZERO);
    let record = profit
        .record_profit_at(&a.principal(), first, Decimal::from(1_000u64), &schedule, after)
        .await
        .unwrap();
    let a_split = record.splits.iter().find(|s| s.member_id == a.id).unwrap();
    assert_eq!(a_split.carried_shares, 4);

    let later = after + Duration::days(1);
    let balance = service.total_shares(a.id, later).await.unwrap();
    assert_eq!(balance.total(), 24);

    // The second distribution weighs a's compounded 24 against b's 20.
    let (second, after2) = open_and_fund("second".to_string()).await;
    let record2 = profit
        .record_profit_at(
            &a.principal(),
            second,
            Decimal::from(1_000u64),
            &BookSchedule::book_all(),
            after2.max(later),
        )
        .await
        .unwrap();
    assert_eq!(record2.splits.len(), 2);
    let a2 = record2.splits.iter().find(|s| s.member_id == a.id).unwrap();
    let b2 = record2.splits.iter().find(|s| s.member_id == b.id).unwrap();
    assert!(a2.gross > b2.gross);
    assert_eq!(
        record2.proposer_bonus + record2.total_booked() + record2.total_carried(),
        Decimal::from(1_000u64)
    );
}
