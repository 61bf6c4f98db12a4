use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::database::manager::DatabaseError;

/// One user's relationship to one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub username: String,
    pub group_id: i32,
    pub is_group_admin: bool,
}

/// Persisted source of truth for "is user X an admin of group Y".
///
/// Reads are not linearized against concurrent membership writes; a check
/// that races a revoke may still observe the old row.
#[async_trait]
pub trait MembershipAuthority: Send + Sync {
    async fn find_membership(
        &self,
        username: &str,
        group_id: i32,
    ) -> Result<Option<Membership>, DatabaseError>;
}
