#![allow(dead_code)]

use docket_filter::schema::{ColumnDef, ColumnType, IndexingConfig};
use docket_filter::{CollectionSchema, FilterError, OperationsConfig, TableSchema};
use docket_resolve::{
    CollectionFilter, CollectionFilterResolver, FilterResolver, ResolvedFilter, TableFilter,
    TableFilterResolver,
};
use serde_json::Value;

pub const COLLECTION: &str = "accounts";
pub const TABLE: &str = "readings";

pub fn collection() -> CollectionSchema {
    CollectionSchema::new(COLLECTION)
}

/// Collection that only indexes `_id`, `status` and everything under `address`.
pub fn partially_indexed_collection() -> CollectionSchema {
    CollectionSchema {
        indexing: IndexingConfig {
            allow: Some(vec!["_id".into(), "status".into(), "address".into()]),
            deny: None,
        },
        ..CollectionSchema::new(COLLECTION)
    }
}

/// Table keyed by `sensor` with a mix of scalar, container and vector columns.
pub fn table() -> TableSchema {
    TableSchema {
        name: TABLE.into(),
        columns: vec![
            ColumnDef::new("sensor", ColumnType::Text),
            ColumnDef::new("value", ColumnType::Double),
            ColumnDef::new("taken", ColumnType::Timestamp),
            ColumnDef::new("healthy", ColumnType::Boolean),
            ColumnDef::new("notes", ColumnType::Text),
            ColumnDef::new("tags", ColumnType::List(Box::new(ColumnType::Text))),
            ColumnDef::new("zones", ColumnType::Set(Box::new(ColumnType::Int))),
            ColumnDef::new(
                "attrs",
                ColumnType::Map(Box::new(ColumnType::Text), Box::new(ColumnType::Int)),
            ),
            ColumnDef::new("embedding", ColumnType::Vector { dimension: 4 }),
        ],
        primary_key: vec!["sensor".into()],
        indexes: vec![
            "value".into(),
            "taken".into(),
            "healthy".into(),
            "tags".into(),
            "zones".into(),
            "attrs".into(),
        ],
    }
}

pub fn compile_collection(filter: Value) -> Result<ResolvedFilter<CollectionFilter>, FilterError> {
    compile_collection_with(&collection(), &OperationsConfig::default(), filter)
}

pub fn compile_collection_with(
    schema: &CollectionSchema,
    config: &OperationsConfig,
    filter: Value,
) -> Result<ResolvedFilter<CollectionFilter>, FilterError> {
    CollectionFilterResolver::new(schema, config).compile(Some(&filter))
}

pub fn compile_table(filter: Value) -> Result<ResolvedFilter<TableFilter>, FilterError> {
    let schema = table();
    let config = OperationsConfig::default();
    TableFilterResolver::new(&schema, &config).compile(Some(&filter))
}
