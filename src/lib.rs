//! Club Core - Investment Club Pipeline
//!
//! This crate provides the core pipeline of a member-run investment club:
//! business-plan voting, funding-round share allocation, and profit
//! distribution, backed by append-only share accounting.
//!
//! # Architecture
//!
//! The pipeline consists of four engines over a single ledger store:
//!
//! - **Voting Engine**: opens plans, records votes, resolves outcomes
//! - **Funding Allocator**: turns an approved vote into share allocations
//! - **Profit Distributor**: splits realized profit across shareholders
//! - **Share Accounting**: balance queries, base-share grants, monthly payments
//!
//! `ClubService` composes the four over one `LedgerStore` and adds the member
//! registry. A `ResolutionSweeper` closes out due plans in the background.
//!
//! # Pipeline
//!
//! ```text
//! open_plan ──▶ cast_vote* ──▶ resolve ──▶ allocate ──▶ record_profit
//!   (Open)      (3-day window)  (Closed /    (Funded)    (shares for
//!                                Rejected)                carry-forward)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use club_core::{ClubConfig, ClubService, MemoryLedger, VoteChoice};
//! use rust_decimal::Decimal;
//!
//! async fn example() {
//!     let service = ClubService::new(Arc::new(MemoryLedger::new()), ClubConfig::default());
//!
//!     let admin = service
//!         .bootstrap_top_member(club_core::Registration {
//!             name: "admin".into(),
//!             email: "admin@example.com".into(),
//!             phone: None,
//!             location: "mumbai".into(),
//!             introduced_by: None,
//!         })
//!         .await
//!         .unwrap();
//!
//!     let plan = service
//!         .open_plan(
//!             &admin.principal(),
//!             "dairy expansion".into(),
//!             "second milk route".into(),
//!             Decimal::from(50_000u64),
//!         )
//!         .await
//!         .unwrap();
//!
//!     service
//!         .cast_vote(&admin.principal(), plan.id, VoteChoice::Yes)
//!         .await
//!         .unwrap();
//!
//!     let _sweeper = service.start_sweeper();
//! }
//! ```

pub mod config;
pub mod error;
pub mod ops;
pub mod service;
pub mod storage;
pub mod types;

pub use config::ClubConfig;
pub use error::{ClubError, ClubResult};
pub use ops::{FundingAllocator, ProfitDistributor, ShareAccounting, VotingEngine};
pub use service::{ClubService, Registration, ResolutionSweeper, SweepReport, SweeperHandle};
pub use storage::{LedgerStats, LedgerStore, MemoryLedger};
pub use types::{
    AllocationSummary, BookSchedule, BusinessPlan, FundingAllocation, Member, MemberId,
    MemberProfitShare, MemberRole, MemberStatement, MonthlyPayment, PlanId, PlanProof, PlanStatus,
    Principal, ProfitRecord, ProfitShareEntry, ShareBalance, ShareLot, ShareType, Vote,
    VoteChoice, VoteOutcome, VoteTally,
};
