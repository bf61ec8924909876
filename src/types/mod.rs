//! Club Core Domain Types
//!
//! Ledger records for members, shares, business plans, votes, funding
//! allocations and profit distributions. All records are serde-serializable
//! and append-only except where a state machine explicitly allows mutation.

mod allocation;
mod member;
mod plan;
mod profit;
mod share;
mod statement;
mod vote;

pub use allocation::*;
pub use member::*;
pub use plan::*;
pub use profit::*;
pub use share::*;
pub use statement::*;
pub use vote::*;

/// Member primary key
pub type MemberId = u64;

/// Business plan primary key
pub type PlanId = u64;
