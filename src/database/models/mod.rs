use serde::{Deserialize, Deserializer};

pub mod group;
pub mod member;
pub mod user;

pub use group::{Group, GroupSearch, GroupUpdate, NewGroup};
pub use member::{Member, MemberSearch, MemberUpdate, MemberWithGroup, NewMember, PgMembershipAuthority};
pub use user::User;

/// Distinguish a missing field (`None`) from an explicit `null` (`Some(None)`).
/// Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
