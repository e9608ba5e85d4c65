use serde::Serialize;

use docket_filter::{FilterError, FilterOperator};

// ── Backend operator vocabularies ──────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityOperator {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOperator {
    In,
    NotIn,
}

/// Set predicate on the elements of a list, set or map column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperator {
    ContainsAny,
    ContainsNone,
    ContainsAll,
    NotContainsAll,
}

// ── Translation from filter operators ──────────────────────────

fn unsupported(operator: FilterOperator, target: &str) -> FilterError {
    FilterError::UnresolvableFilter(format!("'{operator}' cannot be used as {target}"))
}

impl TryFrom<FilterOperator> for EqualityOperator {
    type Error = FilterError;

    fn try_from(operator: FilterOperator) -> Result<Self, FilterError> {
        match operator {
            FilterOperator::EQ => Ok(Self::Eq),
            FilterOperator::NE => Ok(Self::Ne),
            other => Err(unsupported(other, "an equality")),
        }
    }
}

impl TryFrom<FilterOperator> for ComparisonOperator {
    type Error = FilterError;

    fn try_from(operator: FilterOperator) -> Result<Self, FilterError> {
        match operator {
            FilterOperator::EQ => Ok(Self::Eq),
            FilterOperator::NE => Ok(Self::Ne),
            FilterOperator::GT => Ok(Self::Gt),
            FilterOperator::GTE => Ok(Self::Gte),
            FilterOperator::LT => Ok(Self::Lt),
            FilterOperator::LTE => Ok(Self::Lte),
            other => Err(unsupported(other, "a comparison")),
        }
    }
}

impl TryFrom<FilterOperator> for MembershipOperator {
    type Error = FilterError;

    fn try_from(operator: FilterOperator) -> Result<Self, FilterError> {
        match operator {
            FilterOperator::IN => Ok(Self::In),
            FilterOperator::NIN => Ok(Self::NotIn),
            other => Err(unsupported(other, "a membership test")),
        }
    }
}

impl TryFrom<FilterOperator> for SetOperator {
    type Error = FilterError;

    fn try_from(operator: FilterOperator) -> Result<Self, FilterError> {
        match operator {
            FilterOperator::IN => Ok(Self::ContainsAny),
            FilterOperator::NIN => Ok(Self::ContainsNone),
            FilterOperator::ALL => Ok(Self::ContainsAll),
            FilterOperator::NOT_ANY => Ok(Self::NotContainsAll),
            other => Err(unsupported(other, "a container test")),
        }
    }
}
