//! Member and Principal
//!
//! Club membership records and the explicit caller identity passed into every
//! mutating operation. There is no ambient "current member" session: each
//! operation receives a [`Principal`] and checks it against the access it needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::error::{ClubError, ClubResult};

/// Membership role
///
/// New registrations start as `New` and take no part in voting, allocation or
/// distribution until a top member approves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Administrative member: may propose plans, approve members, record
    /// profit and payments
    Top,
    /// Approved member: votes and participates in funding rounds
    Regular,
    /// Registered but not yet approved
    New,
}

/// Club member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Member id
    pub id: MemberId,
    /// Display name
    pub name: String,
    /// Contact email (unique)
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Home chapter location
    pub location: String,
    /// Membership role
    pub role: MemberRole,
    /// Referring member, if any
    pub introduced_by: Option<MemberId>,
    /// Registration time
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Whether this member holds administrative rights
    pub fn is_top(&self) -> bool {
        self.role == MemberRole::Top
    }

    /// Whether this member participates in voting and funding rounds
    pub fn is_eligible(&self) -> bool {
        self.role != MemberRole::New
    }

    /// The principal acting as this member
    pub fn principal(&self) -> Principal {
        Principal {
            member_id: self.id,
            role: self.role,
        }
    }
}

/// Authenticated caller identity
///
/// Produced by the (out-of-scope) API layer after authentication and passed
/// into every operation that mutates the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Acting member id
    pub member_id: MemberId,
    /// Acting member's role at authentication time
    pub role: MemberRole,
}

impl Principal {
    /// Require administrative rights
    pub fn require_top(&self) -> ClubResult<()> {
        if self.role == MemberRole::Top {
            Ok(())
        } else {
            Err(ClubError::NotTopMember(self.member_id))
        }
    }
}
