use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FilterError;
use crate::expression::ComparisonExpression;

use super::{ContainerKind, FilterSchema, FilterWarning};

/// Declared type of a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Date,
    Decimal,
    Double,
    Duration,
    Float,
    Inet,
    Int,
    SmallInt,
    Text,
    Time,
    Timestamp,
    TinyInt,
    Uuid,
    VarInt,
    List(Box<ColumnType>),
    Set(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Vector { dimension: u32 },
}

impl ColumnType {
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            ColumnType::List(_) => Some(ContainerKind::List),
            ColumnType::Set(_) => Some(ContainerKind::Set),
            ColumnType::Map(..) => Some(ContainerKind::Map),
            _ => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, ColumnType::Vector { .. })
    }

    /// True for columns holding a single scalar value.
    pub fn is_scalar(&self) -> bool {
        self.container_kind().is_none() && !self.is_vector()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Ascii => f.write_str("ascii"),
            ColumnType::BigInt => f.write_str("bigint"),
            ColumnType::Blob => f.write_str("blob"),
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::Date => f.write_str("date"),
            ColumnType::Decimal => f.write_str("decimal"),
            ColumnType::Double => f.write_str("double"),
            ColumnType::Duration => f.write_str("duration"),
            ColumnType::Float => f.write_str("float"),
            ColumnType::Inet => f.write_str("inet"),
            ColumnType::Int => f.write_str("int"),
            ColumnType::SmallInt => f.write_str("smallint"),
            ColumnType::Text => f.write_str("text"),
            ColumnType::Time => f.write_str("time"),
            ColumnType::Timestamp => f.write_str("timestamp"),
            ColumnType::TinyInt => f.write_str("tinyint"),
            ColumnType::Uuid => f.write_str("uuid"),
            ColumnType::VarInt => f.write_str("varint"),
            ColumnType::List(elem) => write!(f, "list<{elem}>"),
            ColumnType::Set(elem) => write!(f, "set<{elem}>"),
            ColumnType::Map(key, value) => write!(f, "map<{key}, {value}>"),
            ColumnType::Vector { dimension } => write!(f, "vector<float, {dimension}>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A strongly-typed table with declared columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns count as indexed.
    pub fn is_indexed(&self, column: &str) -> bool {
        self.primary_key.iter().any(|c| c == column) || self.indexes.iter().any(|c| c == column)
    }

    fn unknown_column(&self, column: &str) -> FilterError {
        FilterError::UnknownTableColumn {
            table: self.name.clone(),
            column: column.to_string(),
        }
    }
}

impl FilterSchema for TableSchema {
    fn identity_path(&self) -> Option<&str> {
        None
    }

    fn is_reserved_field(&self, _key: &str) -> bool {
        false
    }

    fn container_kind(&self, path: &str) -> Option<ContainerKind> {
        self.column(path)
            .and_then(|c| c.column_type.container_kind())
    }

    fn check_comparison(
        &self,
        comparison: &ComparisonExpression,
    ) -> Result<Option<FilterWarning>, FilterError> {
        let name = comparison.path();
        let column = self.column(name).ok_or_else(|| self.unknown_column(name))?;

        if column.column_type.is_vector() {
            return Err(FilterError::UnsupportedColumnFilter {
                column: name.to_string(),
                message: format!("{} columns cannot be filtered", column.column_type),
            });
        }

        if self.is_indexed(name) {
            return Ok(None);
        }
        warn!(table = %self.name, column = name, "filter on column without index");
        Ok(Some(FilterWarning::MissingIndex {
            table: self.name.clone(),
            column: name.to_string(),
        }))
    }
}
