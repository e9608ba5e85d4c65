use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use docket_filter::{
    FilterClause, FilterClauseParser, FilterError, FilterSchema, FilterWarning, OperationsConfig,
};

use crate::db_expression::DbLogicalExpression;

/// A resolved filter plus the warnings raised while parsing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFilter<F> {
    pub expression: DbLogicalExpression<F>,
    pub warnings: Vec<FilterWarning>,
}

impl<F> ResolvedFilter<F> {
    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }
}

/// Compiles filters for one target into backend primitives.
pub trait FilterResolver {
    type Schema: FilterSchema;
    type Filter;

    fn schema(&self) -> &Self::Schema;

    fn config(&self) -> &OperationsConfig;

    /// Resolve an already parsed clause.
    fn resolve(&self, clause: &FilterClause) -> Result<ResolvedFilter<Self::Filter>, FilterError>;

    /// Parse and resolve a JSON filter in one step.
    fn compile(&self, filter: Option<&Value>) -> Result<ResolvedFilter<Self::Filter>, FilterError> {
        let clause = FilterClauseParser::new(self.schema(), self.config()).parse(filter)?;
        self.resolve(&clause)
    }
}

/// Enforce the primitive limit on a resolved tree.
pub(crate) fn finish<F>(
    expression: DbLogicalExpression<F>,
    clause: &FilterClause,
    config: &OperationsConfig,
) -> Result<ResolvedFilter<F>, FilterError> {
    let count = expression.filter_count();
    if count > config.max_filter_object_properties {
        return Err(FilterError::TooManyFilterProperties {
            max: config.max_filter_object_properties,
            actual: count,
        });
    }
    debug!(filters = count, "resolved filter");
    Ok(ResolvedFilter {
        expression,
        warnings: clause.warnings().to_vec(),
    })
}
