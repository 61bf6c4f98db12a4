//! Test helpers shared by unit tests across the crate.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Identity, Membership, MembershipAuthority};
use crate::config::AppConfig;
use crate::database::DatabaseError;
use crate::state::AppState;

/// Membership authority over a fixed list of rows that counts its lookups
#[derive(Default)]
pub struct InMemoryMemberships {
    rows: Vec<Membership>,
    fail: bool,
    lookups: AtomicUsize,
}

impl InMemoryMemberships {
    /// Rows as `(username, group_id, is_group_admin)`
    pub fn with(rows: &[(&str, i32, bool)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(username, group_id, is_group_admin)| Membership {
                    username: username.to_string(),
                    group_id: *group_id,
                    is_group_admin: *is_group_admin,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Every lookup errors as if storage were down
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipAuthority for InMemoryMemberships {
    async fn find_membership(
        &self,
        username: &str,
        group_id: i32,
    ) -> Result<Option<Membership>, DatabaseError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self
            .rows
            .iter()
            .find(|m| m.username == username && m.group_id == group_id)
            .cloned())
    }
}

/// App state over a pool that never connects unless a handler reaches storage.
/// Must be called inside a tokio runtime.
pub fn test_state(memberships: Arc<InMemoryMemberships>) -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(100))
        .connect_lazy("postgres://saver@127.0.0.1:1/saver")
        .expect("lazy pool");

    AppState::new(AppConfig::development(), pool)
        .expect("development config signs tokens")
        .with_memberships(memberships)
}

/// `Authorization` header value for `identity`, signed with the state's codec
pub fn bearer(state: &AppState, identity: &Identity) -> String {
    let token = state.codec.sign(identity).expect("sign token");
    format!("Bearer {}", token)
}
