use crate::error::FilterError;
use crate::expression::LogicalExpression;
use crate::schema::FilterWarning;
use crate::validate;

/// A parsed, normalized filter ready for resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    expression: LogicalExpression,
    identity_path: Option<String>,
    warnings: Vec<FilterWarning>,
    validated: bool,
}

impl FilterClause {
    /// The "no filter" clause.
    pub fn empty() -> Self {
        Self {
            expression: LogicalExpression::and(),
            identity_path: None,
            warnings: Vec::new(),
            validated: true,
        }
    }

    pub(crate) fn new(
        expression: LogicalExpression,
        identity_path: Option<String>,
        warnings: Vec<FilterWarning>,
    ) -> Self {
        Self {
            expression: expression.normalized(),
            identity_path,
            warnings,
            validated: false,
        }
    }

    pub fn expression(&self) -> &LogicalExpression {
        &self.expression
    }

    pub fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }

    pub fn warnings(&self) -> &[FilterWarning] {
        &self.warnings
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Apply the tree-wide identity rules. Once a clause has validated,
    /// calling this again does nothing.
    pub fn validate(&mut self) -> Result<(), FilterError> {
        if self.validated {
            return Ok(());
        }
        if let Some(identity) = &self.identity_path {
            validate::check_identity(&self.expression, identity)?;
        }
        self.validated = true;
        Ok(())
    }
}

impl Default for FilterClause {
    fn default() -> Self {
        Self::empty()
    }
}
