mod collection;
mod table;

use std::fmt;

use serde::Serialize;

use crate::error::FilterError;
use crate::expression::ComparisonExpression;

pub use collection::{
    CollectionSchema, ID_FIELD, IndexingConfig, LEXICAL_FIELD, VECTOR_FIELD, VECTORIZE_FIELD,
};
pub use table::{ColumnDef, ColumnType, TableSchema};

/// Shape of a container column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    List,
    Set,
    Map,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::List => "list",
            ContainerKind::Set => "set",
            ContainerKind::Map => "map",
        };
        f.write_str(name)
    }
}

/// Non-fatal findings collected while parsing a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterWarning {
    MissingIndex { table: String, column: String },
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::MissingIndex { table, column } => write!(
                f,
                "column '{column}' of table '{table}' is not indexed, the filter needs a scan"
            ),
        }
    }
}

/// What a filter target (collection or table) decides about its own paths.
pub trait FilterSchema {
    /// The path identifying a document, if the target has one.
    fn identity_path(&self) -> Option<&str>;

    /// `$`-prefixed keys that name fields rather than operators.
    fn is_reserved_field(&self, key: &str) -> bool;

    /// Container shape of the path, for targets with typed container columns.
    fn container_kind(&self, path: &str) -> Option<ContainerKind>;

    /// Accept or reject a comparison before it is added to the tree.
    fn check_comparison(
        &self,
        comparison: &ComparisonExpression,
    ) -> Result<Option<FilterWarning>, FilterError>;
}
