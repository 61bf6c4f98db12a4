use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};

use super::group::{self, Group};
use crate::auth::{Membership, MembershipAuthority};
use crate::database::manager::DatabaseError;
use crate::database::query_builder::bind_params_as;
use crate::database::sql::{sql_for_update, AttributeMap, ColumnMap, PartialUpdate, SqlFragment};
use crate::filter::{FilterField, FilterOp, FilterParams, FilterTable, FilterWhere};

/// Persisted membership row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i32,
    pub username: String,
    pub group_id: i32,
    pub admin: bool,
}

impl From<Member> for Membership {
    fn from(member: Member) -> Self {
        Self {
            username: member.username,
            group_id: member.group_id,
            is_group_admin: member.admin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberWithGroup {
    #[serde(flatten)]
    pub member: Member,
    pub group: Group,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMember {
    pub username: String,
}

/// Sparse update. `admin` is NOT NULL, so an explicit `null` is rejected by
/// `validate` rather than skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberUpdate {
    #[serde(default, deserialize_with = "super::double_option")]
    pub is_group_admin: Option<Option<bool>>,
}

impl MemberUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(None) = self.is_group_admin {
            return Err("is_group_admin must not be null".to_string());
        }
        Ok(())
    }
}

impl PartialUpdate for MemberUpdate {
    const COLUMNS: ColumnMap = &[("is_group_admin", "admin")];

    fn attributes(&self) -> AttributeMap {
        let mut data = AttributeMap::new();
        data.set_present("is_group_admin", self.is_group_admin);
        data
    }
}

const MEMBER_FILTERS: FilterTable = &[
    FilterField::new("username", "username", FilterOp::EqIgnoreCase),
    FilterField::new("group_id", "group_id", FilterOp::Eq),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberSearch {
    pub username: Option<String>,
    pub group_id: Option<i32>,
}

impl FilterParams for MemberSearch {
    const FIELDS: FilterTable = MEMBER_FILTERS;

    fn filters(&self) -> Vec<(&'static str, Value)> {
        let mut out = vec![];
        if let Some(username) = &self.username {
            out.push(("username", Value::from(username.as_str())));
        }
        if let Some(group_id) = self.group_id {
            out.push(("group_id", Value::from(group_id)));
        }
        out
    }
}

const MEMBER_COLUMNS: &str = "id, username, group_id, admin";

pub(crate) async fn insert(
    conn: &mut PgConnection,
    username: &str,
    group_id: i32,
    admin: bool,
) -> Result<Member, DatabaseError> {
    sqlx::query_as::<_, Member>(
        "INSERT INTO members (username, group_id, admin)
         VALUES ($1, $2, $3)
         RETURNING id, username, group_id, admin",
    )
    .bind(username)
    .bind(group_id)
    .bind(admin)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        DatabaseError::from_insert(e, format!("Duplicate member: {}", username), |constraint| {
            missing_reference(constraint, username, group_id)
        })
    })
}

/// Which side of a members foreign key was missing, by constraint name
/// (`members_username_fkey` / `members_group_id_fkey`).
fn missing_reference(constraint: Option<&str>, username: &str, group_id: i32) -> String {
    match constraint {
        Some(name) if name.contains("group_id") => format!("No group: {}", group_id),
        _ => format!("No user: {}", username),
    }
}

/// Add `username` to a group. The first member of a group becomes its admin.
pub async fn create(pool: &PgPool, username: &str, group_id: i32) -> Result<Member, DatabaseError> {
    let mut tx = pool.begin().await?;

    // Serializes concurrent adds to one group so only one can see it empty
    sqlx::query_scalar::<_, i32>("SELECT id FROM groups WHERE id = $1 FOR UPDATE")
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No group: {}", group_id)))?;

    let existing = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM members WHERE username = $1 AND group_id = $2",
    )
    .bind(username)
    .bind(group_id)
    .fetch_optional(&mut *tx)
    .await?;
    if existing.is_some() {
        return Err(DatabaseError::Duplicate(format!("Duplicate member: {}", username)));
    }

    let member_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members WHERE group_id = $1")
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;

    let member = insert(&mut *tx, username, group_id, member_count == 0).await?;
    tx.commit().await?;

    Ok(member)
}

pub async fn find_all(pool: &PgPool, search: &MemberSearch) -> Result<Vec<Member>, DatabaseError> {
    let clause = FilterWhere::generate_for(search)?;
    let sql = format!(
        "SELECT {} FROM members{} ORDER BY username",
        MEMBER_COLUMNS,
        clause.to_sql()
    );

    let members = bind_params_as(sqlx::query_as::<_, Member>(&sql), &clause.params)
        .fetch_all(pool)
        .await?;
    Ok(members)
}

/// Member by row id, together with the group it belongs to.
pub async fn get(pool: &PgPool, id: i32) -> Result<MemberWithGroup, DatabaseError> {
    let member = sqlx::query_as::<_, Member>(
        "SELECT id, username, group_id, admin
         FROM members
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound(format!("No member with id: {}", id)))?;

    let group = group::get(pool, member.group_id).await?;
    Ok(MemberWithGroup { member, group })
}

pub async fn find_membership(
    pool: &PgPool,
    username: &str,
    group_id: i32,
) -> Result<Option<Member>, DatabaseError> {
    let member = sqlx::query_as::<_, Member>(
        "SELECT id, username, group_id, admin
         FROM members
         WHERE username = $1 AND group_id = $2",
    )
    .bind(username)
    .bind(group_id)
    .fetch_optional(pool)
    .await?;
    Ok(member)
}

/// UPDATE text for `set`, keyed by username at `$N+1` and group at `$N+2`.
fn update_sql(set: &SqlFragment) -> String {
    let username_idx = set.next_placeholder();
    format!(
        "UPDATE members SET {} WHERE username = ${} AND group_id = ${} RETURNING {}",
        set.sql,
        username_idx,
        username_idx + 1,
        MEMBER_COLUMNS
    )
}

pub async fn update(
    pool: &PgPool,
    username: &str,
    group_id: i32,
    data: &MemberUpdate,
) -> Result<Member, DatabaseError> {
    let set = sql_for_update(data)?;
    let sql = update_sql(&set);

    bind_params_as(sqlx::query_as::<_, Member>(&sql), &set.params)
        .bind(username)
        .bind(group_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            DatabaseError::NotFound(format!(
                "No member with username {} in group {}",
                username, group_id
            ))
        })
}

pub async fn remove(pool: &PgPool, username: &str, group_id: i32) -> Result<(), DatabaseError> {
    let deleted = sqlx::query_scalar::<_, i32>(
        "DELETE FROM members WHERE username = $1 AND group_id = $2 RETURNING id",
    )
    .bind(username)
    .bind(group_id)
    .fetch_optional(pool)
    .await?;

    if deleted.is_none() {
        return Err(DatabaseError::NotFound(format!(
            "No member with username {} in group {}",
            username, group_id
        )));
    }
    // TODO: refuse to remove a group's last admin once the recovery rule (reassign vs block) is decided
    Ok(())
}

pub async fn remove_by_id(pool: &PgPool, id: i32) -> Result<(), DatabaseError> {
    let deleted = sqlx::query_scalar::<_, i32>("DELETE FROM members WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match deleted {
        Some(_) => Ok(()),
        None => Err(DatabaseError::NotFound(format!("No member: {}", id))),
    }
}

/// Membership authority backed by the `members` table
#[derive(Clone)]
pub struct PgMembershipAuthority {
    pool: PgPool,
}

impl PgMembershipAuthority {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipAuthority for PgMembershipAuthority {
    async fn find_membership(
        &self,
        username: &str,
        group_id: i32,
    ) -> Result<Option<Membership>, DatabaseError> {
        Ok(find_membership(&self.pool, username, group_id)
            .await?
            .map(Membership::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_flag_maps_to_admin_column() {
        let update = MemberUpdate {
            is_group_admin: Some(Some(true)),
        };
        let set = sql_for_update(&update).unwrap();
        assert_eq!(set.sql, "admin = $1");
        assert_eq!(set.params, vec![json!(true)]);
        assert_eq!(set.next_placeholder(), 2);
    }

    #[test]
    fn update_keys_follow_set_params() {
        let set = sql_for_update(&MemberUpdate {
            is_group_admin: Some(Some(false)),
        })
        .unwrap();
        assert_eq!(
            update_sql(&set),
            "UPDATE members SET admin = $1 WHERE username = $2 AND group_id = $3 \
             RETURNING id, username, group_id, admin"
        );

        // Longer fragments push the keys along with them
        let wide = SqlFragment {
            sql: "admin = $1, username = $2".to_string(),
            params: vec![json!(true), json!("u9")],
        };
        assert!(update_sql(&wide).contains("WHERE username = $3 AND group_id = $4 "));
    }

    #[test]
    fn explicit_null_admin_flag_is_invalid() {
        let update: MemberUpdate = serde_json::from_value(json!({ "is_group_admin": null })).unwrap();
        assert!(update.validate().is_err());

        let update: MemberUpdate = serde_json::from_value(json!({ "is_group_admin": true })).unwrap();
        assert!(update.validate().is_ok());
        let update: MemberUpdate = serde_json::from_value(json!({})).unwrap();
        assert!(update.validate().is_ok());
    }

    #[test]
    fn foreign_key_names_the_missing_side() {
        assert_eq!(
            missing_reference(Some("members_username_fkey"), "ghost", 5),
            "No user: ghost"
        );
        assert_eq!(
            missing_reference(Some("members_group_id_fkey"), "u1", 5),
            "No group: 5"
        );
        assert_eq!(missing_reference(None, "ghost", 5), "No user: ghost");
    }

    #[test]
    fn search_filters_in_declaration_order() {
        let search = MemberSearch {
            username: Some("U1".to_string()),
            group_id: Some(5),
        };
        let clause = FilterWhere::generate_for(&search).unwrap();
        assert_eq!(clause.to_sql(), " WHERE lower(username) = $1 AND group_id = $2");
        assert_eq!(clause.params, vec![json!("u1"), json!(5)]);
    }

    #[test]
    fn membership_from_member_row() {
        let member = Member {
            id: 1,
            username: "u1".to_string(),
            group_id: 5,
            admin: true,
        };
        assert_eq!(
            Membership::from(member),
            Membership {
                username: "u1".to_string(),
                group_id: 5,
                is_group_admin: true,
            }
        );
    }
}
