mod common;

use common::*;
use docket_filter::{
    CollectionSchema, DocumentId, FilterClauseParser, FilterError, JsonLiteral, OperationsConfig,
};
use docket_resolve::{
    CollectionFilter, CollectionFilterResolver, ComparisonOperator, DbLogicalOperator,
    EqualityOperator, FilterResolver, MembershipOperator,
};
use serde_json::json;

fn id(s: &str) -> DocumentId {
    DocumentId::String(s.into())
}

// ── Empty filter ───────────────────────────────────────────────

#[test]
fn empty_and_absent_filters_resolve_to_empty_tree() {
    let schema = collection();
    let config = OperationsConfig::default();
    let resolver = CollectionFilterResolver::new(&schema, &config);

    assert!(resolver.compile(None).unwrap().is_empty());
    assert!(resolver.compile(Some(&json!(null))).unwrap().is_empty());
    let resolved = resolver.compile(Some(&json!({}))).unwrap();
    assert!(resolved.is_empty());
    assert_eq!(resolved.expression.operator(), DbLogicalOperator::And);
}

// ── Identity rules ─────────────────────────────────────────────

#[test]
fn id_equality_uses_the_id_primitive() {
    let tree = compile_collection(json!({ "_id": "abc" })).unwrap().expression;
    assert_eq!(
        tree.filters(),
        [CollectionFilter::Id {
            operator: EqualityOperator::Eq,
            id: id("abc")
        }]
    );
    assert!(tree.children().is_empty());
}

#[test]
fn id_membership_uses_the_id_in_primitive() {
    let tree = compile_collection(json!({ "_id": { "$in": ["a", "b"] } }))
        .unwrap()
        .expression;
    assert_eq!(
        tree.filters(),
        [CollectionFilter::IdIn {
            operator: MembershipOperator::In,
            ids: vec![id("a"), id("b")]
        }]
    );
}

#[test]
fn id_with_other_field_falls_through_to_greedy_rule() {
    let tree = compile_collection(json!({ "_id": "abc", "status": "active" }))
        .unwrap()
        .expression;
    assert_eq!(tree.filter_count(), 2);
    assert_eq!(
        tree.filters()[0],
        CollectionFilter::Id {
            operator: EqualityOperator::Eq,
            id: id("abc")
        }
    );
    assert_eq!(
        tree.filters()[1],
        CollectionFilter::Text {
            path: "status".into(),
            operator: EqualityOperator::Eq,
            value: "active".into()
        }
    );
}

#[test]
fn id_not_equal_is_resolved_by_greedy_rule() {
    let tree = compile_collection(json!({ "_id": { "$ne": "abc" } }))
        .unwrap()
        .expression;
    assert_eq!(
        tree.filters(),
        [CollectionFilter::Id {
            operator: EqualityOperator::Ne,
            id: id("abc")
        }]
    );
}

#[test]
fn uuid_and_object_id_ids() {
    let tree = compile_collection(json!({
        "_id": { "$nin": [
            { "$uuid": "6ba7b810-9dad-11d1-80b4-00c04fd430c8" },
            { "$objectId": "507f1f77bcf86cd799439011" }
        ] }
    }))
    .unwrap()
    .expression;
    match &tree.filters()[0] {
        CollectionFilter::IdIn { operator, ids } => {
            assert_eq!(*operator, MembershipOperator::NotIn);
            assert!(matches!(ids[0], DocumentId::Uuid(_)));
            assert!(matches!(ids[1], DocumentId::ObjectId(_)));
        }
        other => panic!("unexpected filter {other:?}"),
    }
}

// ── Logical structure ──────────────────────────────────────────

#[test]
fn same_path_under_or_merges_into_one_capture() {
    let tree = compile_collection(json!({ "$or": [{ "x": 1 }, { "x": 2 }] }))
        .unwrap()
        .expression;

    assert_eq!(tree.operator(), DbLogicalOperator::And);
    assert!(tree.filters().is_empty());
    assert_eq!(tree.children().len(), 1);

    let or = &tree.children()[0];
    assert_eq!(or.operator(), DbLogicalOperator::Or);
    let values: Vec<_> = or
        .filters()
        .iter()
        .map(|f| match f {
            CollectionFilter::Number { path, value, .. } => (path.as_str(), value.as_i64()),
            other => panic!("unexpected filter {other:?}"),
        })
        .collect();
    assert_eq!(values, [("x", Some(1)), ("x", Some(2))]);
}

#[test]
fn nested_and_inside_or() {
    let tree = compile_collection(json!({
        "status": "active",
        "$or": [
            { "score": { "$gt": 90 } },
            { "$and": [{ "verified": true }, { "tags": { "$exists": true } }] }
        ]
    }))
    .unwrap()
    .expression;

    assert_eq!(tree.filter_count(), 4);
    assert_eq!(tree.filters().len(), 1);
    let or = &tree.children()[0];
    assert_eq!(or.operator(), DbLogicalOperator::Or);
    assert_eq!(or.filters().len(), 1);
    // The `$and` element is an implicit AND wrapping the explicit one.
    let and = &or.children()[0].children()[0];
    assert_eq!(and.operator(), DbLogicalOperator::And);
    assert_eq!(and.filters().len(), 2);
}

#[test]
fn not_is_resolved_through_flipped_operators() {
    let tree = compile_collection(json!({
        "$not": { "age": { "$gte": 18 }, "name": null }
    }))
    .unwrap()
    .expression;

    let or = &tree.children()[0];
    assert_eq!(or.operator(), DbLogicalOperator::Or);
    assert!(or.filters().contains(&CollectionFilter::Number {
        path: "age".into(),
        operator: ComparisonOperator::Lt,
        value: 18.into()
    }));
    assert!(or.filters().contains(&CollectionFilter::IsNull {
        path: "name".into(),
        operator: EqualityOperator::Ne
    }));
}

#[test]
fn every_value_kind_has_a_primitive() {
    let tree = compile_collection(json!({
        "ids": { "$in": [1, 2] },
        "name": "n",
        "flag": false,
        "gone": null,
        "at": { "$date": 5 },
        "opt": { "$exists": false },
        "tags": { "$all": ["a"] },
        "list": { "$size": 3 },
        "pair": [1, 2],
        "address": { "city": "Austin" }
    }))
    .unwrap()
    .expression;

    assert_eq!(tree.filter_count(), 10);
    let kinds: Vec<_> = tree
        .filters()
        .iter()
        .map(|f| serde_json::to_value(f).unwrap()["filter"].as_str().unwrap().to_string())
        .collect();
    for kind in [
        "in",
        "text",
        "bool",
        "is_null",
        "date",
        "exists",
        "all",
        "size",
        "array_equals",
        "sub_doc_equals",
    ] {
        assert!(kinds.iter().any(|k| k == kind), "missing {kind} in {kinds:?}");
    }
}

// ── Validation ─────────────────────────────────────────────────

#[test]
fn validation_is_idempotent() {
    let schema = collection();
    let config = OperationsConfig::default();
    let mut clause = FilterClauseParser::new(&schema, &config)
        .parse(Some(&json!({ "_id": "a", "n": { "$in": [1] } })))
        .unwrap();
    let before = clause.clone();
    clause.validate().unwrap();
    clause.validate().unwrap();
    assert_eq!(clause, before);

    let resolved = CollectionFilterResolver::new(&schema, &config)
        .resolve(&clause)
        .unwrap();
    assert_eq!(resolved.expression.filter_count(), 2);
}

#[test]
fn in_limit_is_enforced_before_matching() {
    let config = OperationsConfig {
        max_in_operator_value_size: 3,
        ..Default::default()
    };
    let err = compile_collection_with(&collection(), &config, json!({ "n": { "$in": [1, 2, 3, 4] } }))
        .unwrap_err();
    assert_eq!(
        err,
        FilterError::InValuesTooMany {
            operator: "$in",
            max: 3,
            actual: 4
        }
    );
    assert!(
        compile_collection_with(&collection(), &config, json!({ "n": { "$in": [1, 2, 3] } }))
            .is_ok()
    );
}

#[test]
fn primitive_limit_is_enforced_after_resolution() {
    let config = OperationsConfig {
        max_filter_object_properties: 2,
        ..Default::default()
    };
    let err = compile_collection_with(&collection(), &config, json!({ "a": 1, "b": 2, "c": 3 }))
        .unwrap_err();
    assert_eq!(err, FilterError::TooManyFilterProperties { max: 2, actual: 3 });
    assert!(compile_collection_with(&collection(), &config, json!({ "a": 1, "b": 2 })).is_ok());
}

#[test]
fn negative_size_is_rejected_even_with_valid_id() {
    let err = compile_collection(json!({ "_id": "x", "unrelated": { "$size": -1 } })).unwrap_err();
    assert_eq!(err.code(), "INVALID_FILTER_OPERAND");
    assert!(err.to_string().contains("non-negative integer"), "{err}");
}

#[test]
fn oversized_size_is_rejected() {
    let err = compile_collection(json!({ "tags": { "$size": 1e20 } })).unwrap_err();
    assert_eq!(err.code(), "INVALID_FILTER_OPERAND");
    assert!(err.to_string().contains("too large"), "{err}");
}

#[test]
fn id_inside_and_branch_of_or_is_accepted() {
    let tree = compile_collection(json!({ "$or": [{ "_id": "x", "a": 1 }, { "b": 2 }] }))
        .unwrap()
        .expression;
    assert_eq!(tree.filter_count(), 3);
}

#[test]
fn id_under_or_is_rejected() {
    let err = compile_collection(json!({ "$or": [{ "_id": "x" }] })).unwrap_err();
    assert_eq!(err, FilterError::IdFilterUnderOr("_id".into()));
}

#[test]
fn two_id_comparisons_are_rejected() {
    let err = compile_collection(json!({ "$and": [{ "_id": "a" }, { "_id": "b" }] })).unwrap_err();
    assert_eq!(err.code(), "FILTER_MULTIPLE_ID_FILTER");
}

#[test]
fn id_range_is_rejected() {
    let err = compile_collection(json!({ "_id": { "$gt": "a" } })).unwrap_err();
    assert_eq!(err.code(), "FILTER_INVALID_ID_OPERATOR");
}

#[test]
fn exists_needs_a_boolean() {
    let err = compile_collection(json!({ "a": { "$exists": 1 } })).unwrap_err();
    assert_eq!(err.code(), "INVALID_FILTER_OPERAND");
}

#[test]
fn date_needs_integral_millis() {
    let err = compile_collection(json!({ "at": { "$date": 1.5 } })).unwrap_err();
    assert_eq!(err.code(), "INVALID_EXTENDED_JSON");
}

#[test]
fn non_object_filter_is_rejected() {
    let err = compile_collection(json!(["a"])).unwrap_err();
    assert_eq!(err, FilterError::FilterNotObject("array"));
}

// ── Indexing and reserved fields ───────────────────────────────

#[test]
fn unindexed_paths_are_rejected() {
    let schema = partially_indexed_collection();
    let config = OperationsConfig::default();

    assert!(compile_collection_with(&schema, &config, json!({ "address.city": "Austin" })).is_ok());
    let err = compile_collection_with(&schema, &config, json!({ "name": "x" })).unwrap_err();
    assert_eq!(err, FilterError::UnindexedFilterPath("name".into()));
}

#[test]
fn unindexed_id_has_a_dedicated_error() {
    let schema = CollectionSchema {
        indexing: docket_filter::schema::IndexingConfig {
            allow: Some(vec!["status".into()]),
            deny: None,
        },
        ..collection()
    };
    let err = compile_collection_with(&schema, &OperationsConfig::default(), json!({ "_id": "a" }))
        .unwrap_err();
    assert_eq!(err.code(), "ID_NOT_INDEXED");
}

#[test]
fn vector_exists_filter() {
    let schema = CollectionSchema {
        vector_enabled: true,
        ..collection()
    };
    let config = OperationsConfig::default();
    let tree = compile_collection_with(&schema, &config, json!({ "$vector": { "$exists": true } }))
        .unwrap()
        .expression;
    assert_eq!(
        tree.filters(),
        [CollectionFilter::Exists {
            path: "$vector".into(),
            exists: true
        }]
    );

    let err = compile_collection_with(&schema, &config, json!({ "$vector": [0.1, 0.2] })).unwrap_err();
    assert_eq!(err.code(), "FILTER_RESERVED_FIELD_ARRAY");
}

// ── Serialization ──────────────────────────────────────────────

#[test]
fn resolved_tree_serializes() {
    let resolved = compile_collection(json!({ "$or": [{ "a": 1 }, { "b": "x" }] })).unwrap();
    let value = serde_json::to_value(&resolved).unwrap();
    assert_eq!(value["expression"]["operator"], "and");
    assert_eq!(value["expression"]["children"][0]["operator"], "or");
    assert_eq!(value["expression"]["children"][0]["filters"][1]["filter"], "text");
    assert_eq!(value["warnings"], json!([]));
}

#[test]
fn literal_operands_keep_their_values() {
    let tree = compile_collection(json!({ "tags": { "$in": ["a", 1, true] } }))
        .unwrap()
        .expression;
    assert_eq!(
        tree.filters(),
        [CollectionFilter::In {
            path: "tags".into(),
            operator: MembershipOperator::In,
            values: vec![
                JsonLiteral::String("a".into()),
                JsonLiteral::Number(1.into()),
                JsonLiteral::Boolean(true)
            ]
        }]
    );
}
