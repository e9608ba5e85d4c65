use std::sync::LazyLock;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use docket_filter::schema::ID_FIELD;
use docket_filter::{
    CollectionSchema, DocumentId, FilterClause, FilterError, FilterOperation, FilterOperator,
    JsonLiteral, JsonType, OperationsConfig,
};

use crate::capture::{ANY_PATH, CaptureGroup, CaptureGroups};
use crate::db_expression::DbLogicalExpression;
use crate::matcher::{FilterMatcher, MatchStrategy};
use crate::operators::{ComparisonOperator, EqualityOperator, MembershipOperator};
use crate::resolver::{self, FilterResolver, ResolvedFilter};
use crate::rule::RuleTable;

/// Capture markers of the collection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionCapture {
    Id,
    IdIn,
    Membership,
    Number,
    Text,
    Bool,
    Null,
    Date,
    Exists,
    Array,
    Size,
    ArrayEquals,
    SubDocEquals,
}

/// Filter primitive over a document collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum CollectionFilter {
    Id {
        operator: EqualityOperator,
        id: DocumentId,
    },
    IdIn {
        operator: MembershipOperator,
        ids: Vec<DocumentId>,
    },
    In {
        path: String,
        operator: MembershipOperator,
        values: Vec<JsonLiteral>,
    },
    Number {
        path: String,
        operator: ComparisonOperator,
        value: Number,
    },
    Text {
        path: String,
        operator: EqualityOperator,
        value: String,
    },
    Bool {
        path: String,
        operator: EqualityOperator,
        value: bool,
    },
    IsNull {
        path: String,
        operator: EqualityOperator,
    },
    Date {
        path: String,
        operator: ComparisonOperator,
        value: bson::DateTime,
    },
    Exists {
        path: String,
        exists: bool,
    },
    /// Array holds every value; `negated` for `$notany`.
    All {
        path: String,
        values: Vec<JsonLiteral>,
        negated: bool,
    },
    /// Array length equals `size`, or differs from it when `negated`.
    Size {
        path: String,
        size: u64,
        negated: bool,
    },
    ArrayEquals {
        path: String,
        operator: EqualityOperator,
        values: Vec<JsonLiteral>,
    },
    SubDocEquals {
        path: String,
        operator: EqualityOperator,
        value: Map<String, Value>,
    },
}

// ── Rules ──────────────────────────────────────────────────────

const EQUALITY: &[FilterOperator] = &[FilterOperator::EQ, FilterOperator::NE];
const MEMBERSHIP: &[FilterOperator] = &[FilterOperator::IN, FilterOperator::NIN];
const RANGE: &[FilterOperator] = &[
    FilterOperator::EQ,
    FilterOperator::NE,
    FilterOperator::GT,
    FilterOperator::GTE,
    FilterOperator::LT,
    FilterOperator::LTE,
];

type CollectionRules = RuleTable<CollectionCapture, CollectionSchema, CollectionFilter>;

static RULES: LazyLock<CollectionRules> = LazyLock::new(|| {
    use CollectionCapture as C;

    RuleTable::builder("collection")
        .rule(FilterMatcher::new(MatchStrategy::Empty), build_empty)
        .rule(
            FilterMatcher::new(MatchStrategy::Strict)
                .capture(C::Id)
                .compare_values(ID_FIELD, &[FilterOperator::EQ], JsonType::DocumentId),
            build_filters,
        )
        .rule(
            FilterMatcher::new(MatchStrategy::Strict)
                .capture(C::IdIn)
                .compare_values(ID_FIELD, &[FilterOperator::IN], JsonType::Array),
            build_filters,
        )
        .rule(
            FilterMatcher::new(MatchStrategy::Greedy)
                .capture(C::Id)
                .compare_values(ID_FIELD, EQUALITY, JsonType::DocumentId)
                .capture(C::IdIn)
                .compare_values(ID_FIELD, MEMBERSHIP, JsonType::Array)
                .capture(C::Membership)
                .compare_values(ANY_PATH, MEMBERSHIP, JsonType::Array)
                .capture(C::Number)
                .compare_values(ANY_PATH, RANGE, JsonType::Number)
                .capture(C::Text)
                .compare_values(ANY_PATH, EQUALITY, JsonType::String)
                .capture(C::Bool)
                .compare_values(ANY_PATH, EQUALITY, JsonType::Boolean)
                .capture(C::Null)
                .compare_values(ANY_PATH, EQUALITY, JsonType::Null)
                .capture(C::Date)
                .compare_values(ANY_PATH, RANGE, JsonType::Date)
                .capture(C::Exists)
                .compare_values(ANY_PATH, &[FilterOperator::EXISTS], JsonType::Boolean)
                .capture(C::Array)
                .compare_values(
                    ANY_PATH,
                    &[FilterOperator::ALL, FilterOperator::NOT_ANY],
                    JsonType::Array,
                )
                .capture(C::Size)
                .compare_values(ANY_PATH, &[FilterOperator::SIZE], JsonType::Number)
                .capture(C::ArrayEquals)
                .compare_values(ANY_PATH, EQUALITY, JsonType::Array)
                .capture(C::SubDocEquals)
                .compare_values(ANY_PATH, EQUALITY, JsonType::SubDoc),
            build_filters,
        )
        .build()
});

fn build_empty(
    _: CaptureGroups<CollectionCapture>,
    _: &CollectionSchema,
) -> Result<DbLogicalExpression<CollectionFilter>, FilterError> {
    Ok(DbLogicalExpression::empty())
}

fn build_filters(
    groups: CaptureGroups<CollectionCapture>,
    _: &CollectionSchema,
) -> Result<DbLogicalExpression<CollectionFilter>, FilterError> {
    DbLogicalExpression::build(groups, &mut translate_group)
}

// ── Translation ────────────────────────────────────────────────

fn translate_group(
    group: CaptureGroup<CollectionCapture>,
) -> Result<Vec<CollectionFilter>, FilterError> {
    let marker = group.marker();
    let mut filters = Vec::with_capacity(group.len());
    for captured in group.into_paths() {
        for operation in captured.operations {
            filters.push(translate(marker, &captured.path, operation)?);
        }
    }
    Ok(filters)
}

fn translate(
    marker: CollectionCapture,
    path: &str,
    operation: FilterOperation,
) -> Result<CollectionFilter, FilterError> {
    use CollectionCapture as C;

    let FilterOperation { operator, operand } = operation;
    let path_string = || path.to_string();

    let filter = match (marker, operand) {
        (C::Id, JsonLiteral::DocumentId(id)) => CollectionFilter::Id {
            operator: operator.try_into()?,
            id,
        },
        (C::IdIn, JsonLiteral::Array(values)) => CollectionFilter::IdIn {
            operator: operator.try_into()?,
            ids: document_ids(values)?,
        },
        (C::Membership, JsonLiteral::Array(values)) => CollectionFilter::In {
            path: path_string(),
            operator: operator.try_into()?,
            values,
        },
        (C::Number, JsonLiteral::Number(value)) => CollectionFilter::Number {
            path: path_string(),
            operator: operator.try_into()?,
            value,
        },
        (C::Text, JsonLiteral::String(value)) => CollectionFilter::Text {
            path: path_string(),
            operator: operator.try_into()?,
            value,
        },
        (C::Bool, JsonLiteral::Boolean(value)) => CollectionFilter::Bool {
            path: path_string(),
            operator: operator.try_into()?,
            value,
        },
        (C::Null, JsonLiteral::Null) => CollectionFilter::IsNull {
            path: path_string(),
            operator: operator.try_into()?,
        },
        (C::Date, JsonLiteral::Date(value)) => CollectionFilter::Date {
            path: path_string(),
            operator: operator.try_into()?,
            value,
        },
        (C::Exists, JsonLiteral::Boolean(exists)) => CollectionFilter::Exists {
            path: path_string(),
            exists,
        },
        (C::Array, JsonLiteral::Array(values)) => CollectionFilter::All {
            path: path_string(),
            values,
            negated: operator == FilterOperator::NOT_ANY,
        },
        (C::Size, JsonLiteral::Number(count)) => size_filter(path, &count)?,
        (C::ArrayEquals, JsonLiteral::Array(values)) => CollectionFilter::ArrayEquals {
            path: path_string(),
            operator: operator.try_into()?,
            values,
        },
        (C::SubDocEquals, JsonLiteral::SubDoc(value)) => CollectionFilter::SubDocEquals {
            path: path_string(),
            operator: operator.try_into()?,
            value,
        },
        (marker, operand) => {
            return Err(FilterError::UnresolvableFilter(format!(
                "'{path}' {operator} {} does not fit {marker:?}",
                operand.json_type()
            )));
        }
    };
    Ok(filter)
}

fn document_ids(values: Vec<JsonLiteral>) -> Result<Vec<DocumentId>, FilterError> {
    values
        .into_iter()
        .map(|value| match value {
            JsonLiteral::DocumentId(id) => Ok(id),
            other => Err(FilterError::InvalidDocumentId(other.to_string())),
        })
        .collect()
}

/// A negative count, `-0` included, stands for "length is not `|count|`".
fn size_filter(path: &str, count: &Number) -> Result<CollectionFilter, FilterError> {
    let invalid = || FilterError::InvalidOperand {
        operator: FilterOperator::SIZE.key(),
        message: format!("{count} is not a valid size"),
    };
    let value = count.as_f64().ok_or_else(invalid)?;
    let size = value.abs();
    if size.fract() != 0.0 || size >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(CollectionFilter::Size {
        path: path.to_string(),
        size: size as u64,
        negated: value.is_sign_negative(),
    })
}

// ── Resolver ───────────────────────────────────────────────────

/// Compiles collection filters into [`CollectionFilter`] trees.
pub struct CollectionFilterResolver<'a> {
    schema: &'a CollectionSchema,
    config: &'a OperationsConfig,
}

impl<'a> CollectionFilterResolver<'a> {
    pub fn new(schema: &'a CollectionSchema, config: &'a OperationsConfig) -> Self {
        Self { schema, config }
    }
}

impl FilterResolver for CollectionFilterResolver<'_> {
    type Schema = CollectionSchema;
    type Filter = CollectionFilter;

    fn schema(&self) -> &CollectionSchema {
        self.schema
    }

    fn config(&self) -> &OperationsConfig {
        self.config
    }

    fn resolve(&self, clause: &FilterClause) -> Result<ResolvedFilter<CollectionFilter>, FilterError> {
        let expression = RULES.apply(clause, self.schema)?;
        resolver::finish(expression, clause, self.config)
    }
}
