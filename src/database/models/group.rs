use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use super::member;
use crate::database::manager::DatabaseError;
use crate::database::query_builder::bind_params_as;
use crate::database::sql::{sql_for_update, AttributeMap, ColumnMap, PartialUpdate, SqlFragment};
use crate::filter::{FilterField, FilterOp, FilterParams, FilterTable, FilterWhere};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub target_goal: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewGroup {
    pub title: String,
    pub description: Option<String>,
    pub target_goal: i32,
}

impl NewGroup {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.target_goal < 0 {
            return Err("target_goal must not be negative".to_string());
        }
        Ok(())
    }
}

/// Sparse update: a missing key leaves the column alone, `null` writes NULL.
/// Only `description` is nullable; `validate` rejects `null` elsewhere.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupUpdate {
    #[serde(default, deserialize_with = "super::double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub target_goal: Option<Option<i32>>,
}

impl GroupUpdate {
    pub fn validate(&self) -> Result<(), String> {
        match &self.title {
            Some(None) => return Err("title must not be null".to_string()),
            Some(Some(title)) if title.trim().is_empty() => {
                return Err("title must not be empty".to_string())
            }
            _ => {}
        }
        match self.target_goal {
            Some(None) => Err("target_goal must not be null".to_string()),
            Some(Some(goal)) if goal < 0 => Err("target_goal must not be negative".to_string()),
            _ => Ok(()),
        }
    }
}

impl PartialUpdate for GroupUpdate {
    const COLUMNS: ColumnMap = &[];

    fn attributes(&self) -> AttributeMap {
        let mut data = AttributeMap::new();
        data.set_present("title", self.title.clone())
            .set_present("description", self.description.clone())
            .set_present("target_goal", self.target_goal);
        data
    }
}

const GROUP_FILTERS: FilterTable = &[
    FilterField::new("title", "title", FilterOp::EqIgnoreCase),
    FilterField::new("title_like", "title", FilterOp::ContainsIgnoreCase),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupSearch {
    pub title: Option<String>,
    pub title_like: Option<String>,
}

impl FilterParams for GroupSearch {
    const FIELDS: FilterTable = GROUP_FILTERS;

    fn filters(&self) -> Vec<(&'static str, Value)> {
        let mut out = vec![];
        if let Some(title) = &self.title {
            out.push(("title", Value::from(title.as_str())));
        }
        if let Some(title_like) = &self.title_like {
            out.push(("title_like", Value::from(title_like.as_str())));
        }
        out
    }
}

/// Create a group and admit `creator` as its first (admin) member.
pub async fn create(pool: &PgPool, data: &NewGroup, creator: &str) -> Result<Group, DatabaseError> {
    let mut tx = pool.begin().await?;

    let group = sqlx::query_as::<_, Group>(
        "INSERT INTO groups (title, description, target_goal)
         VALUES ($1, $2, $3)
         RETURNING id, title, description, target_goal",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.target_goal)
    .fetch_one(&mut *tx)
    .await?;

    member::insert(&mut *tx, creator, group.id, true).await?;
    tx.commit().await?;

    tracing::info!("Group {} created by '{}'", group.id, creator);
    Ok(group)
}

pub async fn get(pool: &PgPool, id: i32) -> Result<Group, DatabaseError> {
    sqlx::query_as::<_, Group>(
        "SELECT id, title, description, target_goal
         FROM groups
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound(format!("No group: {}", id)))
}

pub async fn find_all(pool: &PgPool, search: &GroupSearch) -> Result<Vec<Group>, DatabaseError> {
    let clause = FilterWhere::generate_for(search)?;
    let sql = format!(
        "SELECT id, title, description, target_goal FROM groups{} ORDER BY title",
        clause.to_sql()
    );

    let groups = bind_params_as(sqlx::query_as::<_, Group>(&sql), &clause.params)
        .fetch_all(pool)
        .await?;
    Ok(groups)
}

/// UPDATE text for `set`, keyed by row id at `$N+1`.
fn update_sql(set: &SqlFragment) -> String {
    format!(
        "UPDATE groups SET {} WHERE id = ${} RETURNING id, title, description, target_goal",
        set.sql,
        set.next_placeholder()
    )
}

pub async fn update(pool: &PgPool, id: i32, data: &GroupUpdate) -> Result<Group, DatabaseError> {
    let set = sql_for_update(data)?;
    let sql = update_sql(&set);

    bind_params_as(sqlx::query_as::<_, Group>(&sql), &set.params)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No group: {}", id)))
}

/// Delete a group; its memberships go with it.
pub async fn remove(pool: &PgPool, id: i32) -> Result<(), DatabaseError> {
    let deleted = sqlx::query_scalar::<_, i32>("DELETE FROM groups WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match deleted {
        Some(_) => Ok(()),
        None => Err(DatabaseError::NotFound(format!("No group: {}", id))),
    }
}
