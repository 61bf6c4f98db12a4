#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use social_saver::auth::{Identity, Membership, MembershipAuthority, TokenCodec};
use social_saver::database::DatabaseError;

pub const SECRET: &str = "integration-secret";

pub fn codec() -> TokenCodec {
    TokenCodec::new(SECRET, Duration::hours(1)).expect("codec with non-empty secret")
}

pub fn member(name: &str) -> Identity {
    Identity::new(name, false)
}

pub fn site_admin(name: &str) -> Identity {
    Identity::new(name, true)
}

/// Fixed membership rows with a lookup counter
#[derive(Default)]
pub struct StaticMemberships {
    rows: Vec<Membership>,
    lookups: AtomicUsize,
}

impl StaticMemberships {
    pub fn new(rows: &[(&str, i32, bool)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(username, group_id, admin)| Membership {
                    username: username.to_string(),
                    group_id: *group_id,
                    is_group_admin: *admin,
                })
                .collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipAuthority for StaticMemberships {
    async fn find_membership(
        &self,
        username: &str,
        group_id: i32,
    ) -> Result<Option<Membership>, DatabaseError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .iter()
            .find(|m| m.username == username && m.group_id == group_id)
            .cloned())
    }
}
