use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{MembershipAuthority, TokenCodec, TokenError};
use crate::config::AppConfig;
use crate::database::models::PgMembershipAuthority;

/// Everything a request needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub codec: Arc<TokenCodec>,
    pub pool: PgPool,
    pub memberships: Arc<dyn MembershipAuthority>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, TokenError> {
        let codec = TokenCodec::from_config(&config.security)?;
        let memberships = Arc::new(PgMembershipAuthority::new(pool.clone()));

        Ok(Self {
            config: Arc::new(config),
            codec: Arc::new(codec),
            pool,
            memberships,
        })
    }

    /// Swap the membership source, e.g. for an in-memory authority in tests.
    pub fn with_memberships(mut self, memberships: Arc<dyn MembershipAuthority>) -> Self {
        self.memberships = memberships;
        self
    }
}
