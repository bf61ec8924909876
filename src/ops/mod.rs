//! Pipeline Operations
//!
//! One module per pipeline stage: voting, funding allocation, profit
//! distribution, and the share-accounting read path. Each engine owns an
//! `Arc` of the ledger store and takes an explicit [`crate::types::Principal`]
//! for every privileged call.

pub mod accounting;
pub mod funding;
pub mod profit;
pub mod voting;

pub use accounting::ShareAccounting;
pub use funding::FundingAllocator;
pub use profit::ProfitDistributor;
pub use voting::VotingEngine;
