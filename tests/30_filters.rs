use anyhow::Result;
use serde_json::json;
use social_saver::database::models::{GroupSearch, MemberSearch};
use social_saver::filter::{FilterError, FilterField, FilterOp, FilterTable, FilterWhere};

const TABLE: FilterTable = &[
    FilterField::new("title", "title", FilterOp::EqIgnoreCase),
    FilterField::new("group_id", "group_id", FilterOp::Eq),
];

#[test]
fn no_filters_means_no_where() -> Result<()> {
    let clause = FilterWhere::generate_for(&GroupSearch::default())?;
    assert!(clause.is_empty());
    assert_eq!(clause.to_sql(), "");

    let clause = FilterWhere::generate_for(&MemberSearch::default())?;
    assert_eq!(clause.to_sql(), "");
    Ok(())
}

#[test]
fn string_filters_are_lower_cased() -> Result<()> {
    let search = GroupSearch {
        title: Some("Beach TRIP".to_string()),
        title_like: Some("Trip".to_string()),
    };

    let clause = FilterWhere::generate_for(&search)?;
    assert_eq!(
        clause.to_sql(),
        " WHERE lower(title) = $1 AND lower(title) LIKE $2"
    );
    assert_eq!(clause.params, vec![json!("beach trip"), json!("%trip%")]);
    Ok(())
}

#[test]
fn numbering_follows_present_filters_only() -> Result<()> {
    let search = MemberSearch {
        username: None,
        group_id: Some(5),
    };

    let clause = FilterWhere::generate_for(&search)?;
    assert_eq!(clause.predicates, vec!["group_id = $1".to_string()]);
    assert_eq!(clause.params, vec![json!(5)]);
    Ok(())
}

#[test]
fn generic_table_rejects_unknown_names() {
    let result = FilterWhere::generate(&[("email", json!("x"))], TABLE);
    assert!(matches!(result, Err(FilterError::UnknownFilter(name)) if name == "email"));
}

#[test]
fn case_folding_filter_requires_string() {
    let result = FilterWhere::generate(&[("title", json!(7))], TABLE);
    assert!(matches!(result, Err(FilterError::InvalidOperatorData(_))));
}
