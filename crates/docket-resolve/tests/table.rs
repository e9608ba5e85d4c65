mod common;

use common::*;
use docket_filter::schema::ColumnType;
use docket_filter::{FilterError, FilterWarning, JsonLiteral, MapSetListComponent};
use docket_resolve::{
    ComparisonOperator, DbLogicalOperator, MembershipOperator, SetOperator, TableFilter,
};
use serde_json::json;

fn text(s: &str) -> JsonLiteral {
    JsonLiteral::String(s.into())
}

// ── Scalar columns ─────────────────────────────────────────────

#[test]
fn empty_filter_resolves_to_empty_tree() {
    assert!(compile_table(json!({})).unwrap().is_empty());
}

#[test]
fn scalar_comparisons_carry_the_column_type() {
    let tree = compile_table(json!({ "sensor": "s1", "value": { "$gt": 1.5, "$lte": 9 } }))
        .unwrap()
        .expression;
    assert_eq!(tree.filter_count(), 3);
    assert_eq!(
        tree.filters()[0],
        TableFilter::Native {
            column: "sensor".into(),
            column_type: ColumnType::Text,
            operator: ComparisonOperator::Eq,
            value: text("s1"),
        }
    );
    assert!(matches!(
        &tree.filters()[1],
        TableFilter::Native { column, column_type: ColumnType::Double, operator: ComparisonOperator::Gt, .. }
            if column == "value"
    ));
    assert!(matches!(
        &tree.filters()[2],
        TableFilter::Native { operator: ComparisonOperator::Lte, .. }
    ));
}

#[test]
fn scalar_membership() {
    let tree = compile_table(json!({ "sensor": { "$nin": ["a", "b"] } }))
        .unwrap()
        .expression;
    assert_eq!(
        tree.filters(),
        [TableFilter::In {
            column: "sensor".into(),
            column_type: ColumnType::Text,
            operator: MembershipOperator::NotIn,
            values: vec![text("a"), text("b")],
        }]
    );
}

#[test]
fn or_of_columns() {
    let tree = compile_table(json!({ "$or": [{ "healthy": false }, { "value": { "$lt": 0 } }] }))
        .unwrap()
        .expression;
    let or = &tree.children()[0];
    assert_eq!(or.operator(), DbLogicalOperator::Or);
    assert_eq!(or.filters().len(), 2);
}

// ── Container columns ──────────────────────────────────────────

#[test]
fn list_and_set_elements() {
    let tree = compile_table(json!({
        "tags": { "$all": ["hot", "roof"] },
        "zones": { "$in": [1, 2] }
    }))
    .unwrap()
    .expression;

    assert_eq!(
        tree.filters()[0],
        TableFilter::MapSetList {
            column: "tags".into(),
            component: MapSetListComponent::ListValue,
            operator: SetOperator::ContainsAll,
            values: vec![text("hot"), text("roof")],
        }
    );
    assert!(matches!(
        &tree.filters()[1],
        TableFilter::MapSetList {
            component: MapSetListComponent::SetValue,
            operator: SetOperator::ContainsAny,
            ..
        }
    ));
}

#[test]
fn map_keys_values_and_entries() {
    let tree = compile_table(json!({
        "attrs": {
            "$keys": { "$in": ["floor"] },
            "$values": { "$notany": [0, 1] },
            "$nin": [["floor", 3]]
        }
    }))
    .unwrap()
    .expression;

    let filters = tree.filters();
    assert_eq!(filters.len(), 3);
    assert!(filters.contains(&TableFilter::MapSetList {
        column: "attrs".into(),
        component: MapSetListComponent::MapKey,
        operator: SetOperator::ContainsAny,
        values: vec![text("floor")],
    }));
    assert!(filters.contains(&TableFilter::MapSetList {
        column: "attrs".into(),
        component: MapSetListComponent::MapValue,
        operator: SetOperator::NotContainsAll,
        values: vec![JsonLiteral::Number(0.into()), JsonLiteral::Number(1.into())],
    }));
    assert!(filters.contains(&TableFilter::MapEntries {
        column: "attrs".into(),
        operator: SetOperator::ContainsNone,
        entries: vec![(text("floor"), JsonLiteral::Number(3.into()))],
    }));
}

#[test]
fn negated_contains_all() {
    let tree = compile_table(json!({ "$not": { "tags": { "$all": ["a"] } } }))
        .unwrap()
        .expression;
    assert!(matches!(
        &tree.children()[0].filters()[0],
        TableFilter::MapSetList {
            operator: SetOperator::NotContainsAll,
            ..
        }
    ));
}

// ── Rejections ─────────────────────────────────────────────────

#[test]
fn unknown_column_is_rejected() {
    let err = compile_table(json!({ "missing": 1 })).unwrap_err();
    assert_eq!(
        err,
        FilterError::UnknownTableColumn {
            table: TABLE.into(),
            column: "missing".into()
        }
    );
}

#[test]
fn vector_column_is_rejected() {
    let err = compile_table(json!({ "embedding": { "$exists": true } })).unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_COLUMN_FILTER");
}

#[test]
fn keys_selector_needs_a_map() {
    let err = compile_table(json!({ "tags": { "$keys": { "$in": ["a"] } } })).unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_COLUMN_FILTER");
}

#[test]
fn range_on_list_is_rejected() {
    let err = compile_table(json!({ "tags": { "$gt": "a" } })).unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_COLUMN_FILTER");
}

#[test]
fn exists_has_no_table_rule() {
    let err = compile_table(json!({ "value": { "$exists": true } })).unwrap_err();
    assert_eq!(err.code(), "FILTER_UNRESOLVABLE");
}

#[test]
fn malformed_map_entry_is_rejected() {
    let err = compile_table(json!({ "attrs": { "$all": [["k"]] } })).unwrap_err();
    assert_eq!(err.code(), "INVALID_FILTER_OPERAND");
}

#[test]
fn list_and_set_elements_must_fit_the_element_type() {
    for filter in [
        json!({ "tags": { "$in": [1, true] } }),
        json!({ "tags": { "$all": ["ok", 2] } }),
        json!({ "zones": { "$all": ["x"] } }),
        json!({ "zones": { "$nin": [null] } }),
    ] {
        let err = compile_table(filter.clone()).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_COLUMN_FILTER", "{filter}");
    }
}

#[test]
fn map_keys_and_values_must_fit_their_types() {
    let err = compile_table(json!({ "attrs": { "$keys": { "$in": [1] } } })).unwrap_err();
    assert_eq!(
        err,
        FilterError::UnsupportedColumnFilter {
            column: "attrs".into(),
            message: "number value cannot be compared with a text column".into(),
        }
    );

    let err = compile_table(json!({ "attrs": { "$values": { "$all": ["high"] } } })).unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_COLUMN_FILTER");
}

#[test]
fn map_entry_halves_are_both_checked() {
    for filter in [
        json!({ "attrs": { "$in": [[1, 3]] } }),
        json!({ "attrs": { "$all": [["floor", "three"]] } }),
    ] {
        let err = compile_table(filter.clone()).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_COLUMN_FILTER", "{filter}");
    }
    assert!(compile_table(json!({ "attrs": { "$in": [["floor", 3]] } })).is_ok());
}

// ── Warnings ───────────────────────────────────────────────────

#[test]
fn unindexed_column_resolves_with_a_warning() {
    let resolved = compile_table(json!({ "notes": "x", "$or": [{ "notes": "y" }, { "value": 1 }] }))
        .unwrap();
    assert_eq!(resolved.expression.filter_count(), 3);
    assert_eq!(
        resolved.warnings,
        [FilterWarning::MissingIndex {
            table: TABLE.into(),
            column: "notes".into()
        }]
    );
}

#[test]
fn indexed_columns_have_no_warnings() {
    let resolved = compile_table(json!({ "sensor": "a", "value": 1 })).unwrap();
    assert!(resolved.warnings.is_empty());
}
