mod capture;
mod collection;
mod db_expression;
mod matcher;
mod operators;
mod resolver;
mod rule;
mod table;

pub use capture::{ANY_PATH, Capture, CaptureGroup, CaptureGroups, CapturedPath};
pub use collection::{CollectionCapture, CollectionFilter, CollectionFilterResolver};
pub use db_expression::{DbLogicalExpression, DbLogicalOperator};
pub use matcher::{CaptureBuilder, FilterMatcher, MatchFailure, MatchStrategy};
pub use operators::{ComparisonOperator, EqualityOperator, MembershipOperator, SetOperator};
pub use resolver::{FilterResolver, ResolvedFilter};
pub use rule::{BuildFn, RuleTable, RuleTableBuilder};
pub use table::{TableCapture, TableFilter, TableFilterResolver};
