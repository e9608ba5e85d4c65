use std::fmt;

use serde::Serialize;

/// Operators that compare a field against a single value or a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
}

/// Operators that test for the presence of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementComparisonOperator {
    Exists,
}

/// Operators that look inside array values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayComparisonOperator {
    All,
    Size,
    NotAny,
}

/// A filter operator, grouped by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Value(ValueComparisonOperator),
    Element(ElementComparisonOperator),
    Array(ArrayComparisonOperator),
}

impl FilterOperator {
    pub const EQ: Self = Self::Value(ValueComparisonOperator::Eq);
    pub const NE: Self = Self::Value(ValueComparisonOperator::Ne);
    pub const GT: Self = Self::Value(ValueComparisonOperator::Gt);
    pub const GTE: Self = Self::Value(ValueComparisonOperator::Gte);
    pub const LT: Self = Self::Value(ValueComparisonOperator::Lt);
    pub const LTE: Self = Self::Value(ValueComparisonOperator::Lte);
    pub const IN: Self = Self::Value(ValueComparisonOperator::In);
    pub const NIN: Self = Self::Value(ValueComparisonOperator::Nin);
    pub const EXISTS: Self = Self::Element(ElementComparisonOperator::Exists);
    pub const ALL: Self = Self::Array(ArrayComparisonOperator::All);
    pub const SIZE: Self = Self::Array(ArrayComparisonOperator::Size);
    pub const NOT_ANY: Self = Self::Array(ArrayComparisonOperator::NotAny);

    /// Resolve an operator key such as `"$gte"`.
    pub fn from_key(key: &str) -> Option<Self> {
        let op = match key {
            "$eq" => Self::EQ,
            "$ne" => Self::NE,
            "$gt" => Self::GT,
            "$gte" => Self::GTE,
            "$lt" => Self::LT,
            "$lte" => Self::LTE,
            "$in" => Self::IN,
            "$nin" => Self::NIN,
            "$exists" => Self::EXISTS,
            "$all" => Self::ALL,
            "$size" => Self::SIZE,
            "$notany" => Self::NOT_ANY,
            _ => return None,
        };
        Some(op)
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Value(op) => match op {
                ValueComparisonOperator::Eq => "$eq",
                ValueComparisonOperator::Ne => "$ne",
                ValueComparisonOperator::Gt => "$gt",
                ValueComparisonOperator::Gte => "$gte",
                ValueComparisonOperator::Lt => "$lt",
                ValueComparisonOperator::Lte => "$lte",
                ValueComparisonOperator::In => "$in",
                ValueComparisonOperator::Nin => "$nin",
            },
            Self::Element(ElementComparisonOperator::Exists) => "$exists",
            Self::Array(op) => match op {
                ArrayComparisonOperator::All => "$all",
                ArrayComparisonOperator::Size => "$size",
                ArrayComparisonOperator::NotAny => "$notany",
            },
        }
    }

    /// The operator that selects exactly the complement of this one.
    ///
    /// `$exists` and `$size` keep their operator; their operand is flipped
    /// instead (see `FilterOperation::negated`).
    pub fn negated(self) -> Self {
        match self {
            Self::Value(op) => Self::Value(match op {
                ValueComparisonOperator::Eq => ValueComparisonOperator::Ne,
                ValueComparisonOperator::Ne => ValueComparisonOperator::Eq,
                ValueComparisonOperator::Gt => ValueComparisonOperator::Lte,
                ValueComparisonOperator::Gte => ValueComparisonOperator::Lt,
                ValueComparisonOperator::Lt => ValueComparisonOperator::Gte,
                ValueComparisonOperator::Lte => ValueComparisonOperator::Gt,
                ValueComparisonOperator::In => ValueComparisonOperator::Nin,
                ValueComparisonOperator::Nin => ValueComparisonOperator::In,
            }),
            Self::Element(ElementComparisonOperator::Exists) => self,
            Self::Array(op) => Self::Array(match op {
                ArrayComparisonOperator::All => ArrayComparisonOperator::NotAny,
                ArrayComparisonOperator::NotAny => ArrayComparisonOperator::All,
                ArrayComparisonOperator::Size => ArrayComparisonOperator::Size,
            }),
        }
    }

    /// True for the operators allowed on the identity field.
    pub fn is_equality_or_membership(self) -> bool {
        matches!(self, Self::EQ | Self::NE | Self::IN | Self::NIN)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
