mod clause;
mod config;
mod error;
mod expression;
mod literal;
mod operator;
mod parse_filter;
pub mod schema;
mod validate;

pub use clause::FilterClause;
pub use config::OperationsConfig;
pub use error::FilterError;
pub use expression::{
    ComparisonExpression, FilterOperation, LogicalExpression, LogicalOperator, MapSetListComponent,
};
pub use literal::{DocumentId, JsonLiteral, JsonType};
pub use operator::{
    ArrayComparisonOperator, ElementComparisonOperator, FilterOperator, ValueComparisonOperator,
};
pub use parse_filter::FilterClauseParser;
pub use schema::{
    CollectionSchema, ColumnDef, ColumnType, ContainerKind, FilterSchema, FilterWarning,
    IndexingConfig, TableSchema,
};
