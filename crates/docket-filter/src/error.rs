use thiserror::Error;

/// Every way a filter can be rejected, from parsing through resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter clause must be a JSON object or null, got {0}")]
    FilterNotObject(&'static str),
    #[error("invalid filter expression: {0}")]
    InvalidFilterExpression(String),
    #[error("unsupported filter operator '{0}'")]
    UnsupportedOperator(String),
    #[error("invalid operand for '{operator}': {message}")]
    InvalidOperand {
        operator: &'static str,
        message: String,
    },
    #[error("'{operator}' has {actual} values, the maximum allowed is {max}")]
    InValuesTooMany {
        operator: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("filter may contain at most one comparison on '{0}'")]
    MultipleIdFilters(String),
    #[error("comparison on '{0}' is not allowed directly inside '$or'")]
    IdFilterUnderOr(String),
    #[error("operator '{operator}' is not supported on '{path}', use $eq, $ne, $in or $nin")]
    InvalidIdOperator {
        path: String,
        operator: &'static str,
    },
    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),
    #[error("invalid extended JSON value: {0}")]
    InvalidExtendedJson(String),
    #[error("cannot filter on reserved field '{0}' by array value")]
    ReservedFieldArray(String),
    #[error("filter path '{0}' is not indexed")]
    UnindexedFilterPath(String),
    #[error("'{0}' is not indexed, filtering on it is not allowed")]
    IdNotIndexed(String),
    #[error("table '{table}' has no column '{column}'")]
    UnknownTableColumn { table: String, column: String },
    #[error("unsupported filter on column '{column}': {message}")]
    UnsupportedColumnFilter { column: String, message: String },
    #[error("filter cannot be resolved: {0}")]
    UnresolvableFilter(String),
    #[error("filter has {actual} comparisons, the maximum allowed is {max}")]
    TooManyFilterProperties { max: usize, actual: usize },
}

impl FilterError {
    /// Stable, machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            FilterError::FilterNotObject(_) => "FILTER_NOT_OBJECT",
            FilterError::InvalidFilterExpression(_) => "INVALID_FILTER_EXPRESSION",
            FilterError::UnsupportedOperator(_) => "UNSUPPORTED_FILTER_OPERATION",
            FilterError::InvalidOperand { .. } => "INVALID_FILTER_OPERAND",
            FilterError::InValuesTooMany { .. } => "FILTER_IN_VALUES_TOO_MANY",
            FilterError::MultipleIdFilters(_) => "FILTER_MULTIPLE_ID_FILTER",
            FilterError::IdFilterUnderOr(_) => "FILTER_ID_UNDER_OR",
            FilterError::InvalidIdOperator { .. } => "FILTER_INVALID_ID_OPERATOR",
            FilterError::InvalidDocumentId(_) => "INVALID_DOCUMENT_ID",
            FilterError::InvalidExtendedJson(_) => "INVALID_EXTENDED_JSON",
            FilterError::ReservedFieldArray(_) => "FILTER_RESERVED_FIELD_ARRAY",
            FilterError::UnindexedFilterPath(_) => "UNINDEXED_FILTER_PATH",
            FilterError::IdNotIndexed(_) => "ID_NOT_INDEXED",
            FilterError::UnknownTableColumn { .. } => "UNKNOWN_TABLE_COLUMN",
            FilterError::UnsupportedColumnFilter { .. } => "UNSUPPORTED_COLUMN_FILTER",
            FilterError::UnresolvableFilter(_) => "FILTER_UNRESOLVABLE",
            FilterError::TooManyFilterProperties { .. } => "FILTER_TOO_MANY_PROPERTIES",
        }
    }
}
