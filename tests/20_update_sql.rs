use anyhow::Result;
use serde_json::{json, Value};
use social_saver::database::models::{GroupUpdate, MemberUpdate};
use social_saver::database::{sql_for_partial_update, sql_for_update, AttributeMap, SqlError};

#[test]
fn title_update_yields_single_placeholder() -> Result<()> {
    let mut data = AttributeMap::new();
    data.set("title", "New");

    let set = sql_for_partial_update(&data, &[])?;
    assert_eq!(set.sql, "title = $1");
    assert_eq!(set.params, vec![json!("New")]);
    Ok(())
}

#[test]
fn empty_update_is_no_update_data() {
    assert_eq!(
        sql_for_partial_update(&AttributeMap::new(), &[]),
        Err(SqlError::NoUpdateData)
    );
}

#[test]
fn placeholder_count_matches_params() -> Result<()> {
    for n in 1..=8 {
        let mut data = AttributeMap::new();
        for i in 0..n {
            data.set(format!("f{}", i), i);
        }

        let set = sql_for_partial_update(&data, &[])?;
        let numbers: Vec<usize> = set
            .sql
            .split(", ")
            .filter_map(|clause| clause.split('$').nth(1))
            .map(|n| n.parse())
            .collect::<Result<_, _>>()?;
        assert_eq!(numbers, (1..=n).collect::<Vec<_>>());
        assert_eq!(set.params.len(), n);
        assert_eq!(set.next_placeholder(), n + 1);
    }
    Ok(())
}

#[test]
fn group_update_from_request_body() -> Result<()> {
    let update: GroupUpdate = serde_json::from_value(json!({
        "target_goal": 2500,
        "description": null
    }))?;

    let set = sql_for_update(&update)?;
    assert_eq!(set.sql, "description = $1, target_goal = $2");
    assert_eq!(set.params, vec![Value::Null, json!(2500)]);
    Ok(())
}

#[test]
fn member_update_translates_admin_column() -> Result<()> {
    let update: MemberUpdate = serde_json::from_value(json!({ "is_group_admin": false }))?;

    let set = sql_for_update(&update)?;
    assert_eq!(set.sql, "admin = $1");
    assert_eq!(set.params, vec![json!(false)]);
    Ok(())
}

#[test]
fn empty_member_update_is_rejected() -> Result<()> {
    let update: MemberUpdate = serde_json::from_value(json!({}))?;
    assert_eq!(sql_for_update(&update).unwrap_err(), SqlError::NoUpdateData);
    Ok(())
}
