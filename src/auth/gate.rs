//! Authorization decisions applied per request after the token has been read.
//!
//! Each stage takes whatever identity the authenticate step attached (or
//! none) and either lets the request continue or rejects it. Stages never
//! write membership state.

use thiserror::Error;

use super::membership::MembershipAuthority;
use super::Identity;
use crate::database::manager::DatabaseError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Membership lookup failed: {0}")]
    Lookup(#[from] DatabaseError),
}

/// Rejects anonymous callers.
pub fn require_logged_in(identity: Option<&Identity>) -> Result<&Identity, AuthError> {
    identity.ok_or(AuthError::Unauthorized)
}

/// Rejects everyone except site admins.
pub fn require_site_admin(identity: Option<&Identity>) -> Result<&Identity, AuthError> {
    let identity = require_logged_in(identity)?;
    if identity.is_admin {
        Ok(identity)
    } else {
        Err(AuthError::Unauthorized)
    }
}

/// Admits site admins, or callers holding an admin membership in `group_id`.
///
/// Site admins pass without touching the authority; everyone else costs
/// exactly one lookup.
pub async fn require_group_admin<'a>(
    identity: Option<&'a Identity>,
    group_id: i32,
    authority: &dyn MembershipAuthority,
) -> Result<&'a Identity, AuthError> {
    let identity = require_logged_in(identity)?;
    if identity.is_admin {
        return Ok(identity);
    }

    let membership = authority
        .find_membership(&identity.username, group_id)
        .await?;

    match membership {
        Some(m) if m.is_group_admin => Ok(identity),
        _ => {
            tracing::debug!(
                "'{}' is not an admin of group {}",
                identity.username,
                group_id
            );
            Err(AuthError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryMemberships;

    fn user(name: &str) -> Identity {
        Identity::new(name, false)
    }

    #[test]
    fn logged_in_requires_identity() {
        assert!(matches!(require_logged_in(None), Err(AuthError::Unauthorized)));
        let u = user("u1");
        assert_eq!(require_logged_in(Some(&u)).unwrap(), &u);
    }

    #[test]
    fn site_admin_requires_flag() {
        let admin = Identity::new("root", true);
        assert!(require_site_admin(Some(&admin)).is_ok());
        let u1 = user("u1");
        assert!(matches!(require_site_admin(Some(&u1)), Err(AuthError::Unauthorized)));
        assert!(matches!(require_site_admin(None), Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn group_admin_site_admin_without_membership() {
        let authority = InMemoryMemberships::default();
        let admin = Identity::new("root", true);

        assert!(require_group_admin(Some(&admin), 5, &authority).await.is_ok());
        assert_eq!(authority.lookups(), 0);
    }

    #[tokio::test]
    async fn group_admin_member_with_admin_flag() {
        let authority = InMemoryMemberships::with(&[("u1", 5, true)]);

        let u1 = user("u1");
        assert!(require_group_admin(Some(&u1), 5, &authority).await.is_ok());
        assert_eq!(authority.lookups(), 1);
    }

    #[tokio::test]
    async fn group_admin_rejects_non_admin_member() {
        let authority = InMemoryMemberships::with(&[("u1", 5, false)]);

        let u1 = user("u1");
        let result = require_group_admin(Some(&u1), 5, &authority).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
        assert_eq!(authority.lookups(), 1);
    }

    #[tokio::test]
    async fn group_admin_rejects_missing_membership() {
        let authority = InMemoryMemberships::with(&[("u1", 5, true)]);

        let (u1, u2) = (user("u1"), user("u2"));
        let result = require_group_admin(Some(&u1), 6, &authority).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
        let result = require_group_admin(Some(&u2), 5, &authority).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn group_admin_rejects_anonymous_without_lookup() {
        let authority = InMemoryMemberships::with(&[("u1", 5, true)]);

        let result = require_group_admin(None, 5, &authority).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
        assert_eq!(authority.lookups(), 0);
    }

    #[tokio::test]
    async fn group_admin_propagates_lookup_failure() {
        let authority = InMemoryMemberships::failing();

        let u1 = user("u1");
        let result = require_group_admin(Some(&u1), 5, &authority).await;
        assert!(matches!(result, Err(AuthError::Lookup(_))));
    }
}
