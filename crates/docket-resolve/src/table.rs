use std::sync::LazyLock;

use serde::Serialize;

use docket_filter::schema::ColumnType;
use docket_filter::{
    FilterClause, FilterError, FilterOperation, FilterOperator, JsonLiteral, JsonType,
    MapSetListComponent, OperationsConfig, TableSchema,
};

use crate::capture::{ANY_PATH, CaptureGroup, CaptureGroups, CapturedPath};
use crate::db_expression::DbLogicalExpression;
use crate::matcher::{FilterMatcher, MatchStrategy};
use crate::operators::{ComparisonOperator, EqualityOperator, MembershipOperator, SetOperator};
use crate::resolver::{self, FilterResolver, ResolvedFilter};
use crate::rule::RuleTable;

/// Capture markers of the table rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableCapture {
    Text,
    Number,
    Boolean,
    Date,
    Null,
    Membership,
    Contains,
}

/// Filter primitive over a typed table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum TableFilter {
    /// Comparison of a scalar column with one value.
    Native {
        column: String,
        column_type: ColumnType,
        operator: ComparisonOperator,
        value: JsonLiteral,
    },
    IsNull {
        column: String,
        operator: EqualityOperator,
    },
    In {
        column: String,
        column_type: ColumnType,
        operator: MembershipOperator,
        values: Vec<JsonLiteral>,
    },
    /// Element test on a list, set, or on map keys or values.
    MapSetList {
        column: String,
        component: MapSetListComponent,
        operator: SetOperator,
        values: Vec<JsonLiteral>,
    },
    /// Entry test on a map column.
    MapEntries {
        column: String,
        operator: SetOperator,
        entries: Vec<(JsonLiteral, JsonLiteral)>,
    },
}

// ── Rules ──────────────────────────────────────────────────────

const RANGE: &[FilterOperator] = &[
    FilterOperator::EQ,
    FilterOperator::NE,
    FilterOperator::GT,
    FilterOperator::GTE,
    FilterOperator::LT,
    FilterOperator::LTE,
];

type TableRules = RuleTable<TableCapture, TableSchema, TableFilter>;

static RULES: LazyLock<TableRules> = LazyLock::new(|| {
    use TableCapture as C;

    RuleTable::builder("table")
        .rule(FilterMatcher::new(MatchStrategy::Empty), build_empty)
        .rule(
            FilterMatcher::new(MatchStrategy::Greedy)
                .capture(C::Text)
                .compare_values(ANY_PATH, RANGE, JsonType::String)
                .capture(C::Number)
                .compare_values(ANY_PATH, RANGE, JsonType::Number)
                .capture(C::Boolean)
                .compare_values(ANY_PATH, RANGE, JsonType::Boolean)
                .capture(C::Date)
                .compare_values(ANY_PATH, RANGE, JsonType::Date)
                .capture(C::Null)
                .compare_values(
                    ANY_PATH,
                    &[FilterOperator::EQ, FilterOperator::NE],
                    JsonType::Null,
                )
                .capture(C::Membership)
                .compare_values(
                    ANY_PATH,
                    &[FilterOperator::IN, FilterOperator::NIN],
                    JsonType::Array,
                )
                .capture(C::Contains)
                .compare_values(
                    ANY_PATH,
                    &[FilterOperator::ALL, FilterOperator::NOT_ANY],
                    JsonType::Array,
                ),
            build_filters,
        )
        .build()
});

fn build_empty(
    _: CaptureGroups<TableCapture>,
    _: &TableSchema,
) -> Result<DbLogicalExpression<TableFilter>, FilterError> {
    Ok(DbLogicalExpression::empty())
}

fn build_filters(
    groups: CaptureGroups<TableCapture>,
    table: &TableSchema,
) -> Result<DbLogicalExpression<TableFilter>, FilterError> {
    DbLogicalExpression::build(groups, &mut |group| translate_group(table, group))
}

// ── Translation ────────────────────────────────────────────────

fn translate_group(
    table: &TableSchema,
    group: CaptureGroup<TableCapture>,
) -> Result<Vec<TableFilter>, FilterError> {
    let marker = group.marker();
    let mut filters = Vec::with_capacity(group.len());
    for captured in group.into_paths() {
        let CapturedPath {
            path,
            component,
            operations,
        } = captured;
        let column_type = column_type(table, &path)?;
        for operation in operations {
            filters.push(translate(marker, &path, column_type, component, operation)?);
        }
    }
    Ok(filters)
}

fn column_type<'t>(table: &'t TableSchema, column: &str) -> Result<&'t ColumnType, FilterError> {
    table
        .column(column)
        .map(|c| &c.column_type)
        .ok_or_else(|| FilterError::UnknownTableColumn {
            table: table.name.clone(),
            column: column.to_string(),
        })
}

fn translate(
    marker: TableCapture,
    column: &str,
    column_type: &ColumnType,
    component: Option<MapSetListComponent>,
    operation: FilterOperation,
) -> Result<TableFilter, FilterError> {
    let FilterOperation { operator, operand } = operation;

    match (marker, component) {
        (TableCapture::Membership | TableCapture::Contains, Some(component)) => {
            container_filter(column, column_type, component, operator, operand)
        }
        (TableCapture::Contains, None) => Err(unsupported(
            column,
            format!("'{operator}' needs a list, set or map column, not {column_type}"),
        )),
        (_, Some(component)) => Err(unsupported(
            column,
            format!("'{operator}' cannot be applied to {component:?} of a {column_type} column"),
        )),
        (TableCapture::Membership, None) => {
            require_scalar(column, column_type, operator)?;
            let values = match operand {
                JsonLiteral::Array(values) => values,
                other => return Err(operand_mismatch(column, operator, &other)),
            };
            check_values(column, column_type, &values)?;
            Ok(TableFilter::In {
                column: column.to_string(),
                column_type: column_type.clone(),
                operator: operator.try_into()?,
                values,
            })
        }
        (TableCapture::Null, None) => Ok(TableFilter::IsNull {
            column: column.to_string(),
            operator: operator.try_into()?,
        }),
        (TableCapture::Text | TableCapture::Number | TableCapture::Boolean | TableCapture::Date, None) => {
            require_scalar(column, column_type, operator)?;
            if !accepts(column_type, operand.json_type()) {
                return Err(value_mismatch(column, column_type, operand.json_type()));
            }
            Ok(TableFilter::Native {
                column: column.to_string(),
                column_type: column_type.clone(),
                operator: operator.try_into()?,
                value: operand,
            })
        }
    }
}

fn container_filter(
    column: &str,
    column_type: &ColumnType,
    component: MapSetListComponent,
    operator: FilterOperator,
    operand: JsonLiteral,
) -> Result<TableFilter, FilterError> {
    let values = match operand {
        JsonLiteral::Array(values) => values,
        other => return Err(operand_mismatch(column, operator, &other)),
    };
    let set_operator = SetOperator::try_from(operator)?;

    if let (MapSetListComponent::MapEntry, ColumnType::Map(key_type, value_type)) =
        (component, column_type)
    {
        let entries = values
            .into_iter()
            .map(|entry| map_entry(column, key_type, value_type, operator, entry))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TableFilter::MapEntries {
            column: column.to_string(),
            operator: set_operator,
            entries,
        });
    }

    let element_type = component_type(column_type, component).ok_or_else(|| {
        unsupported(
            column,
            format!("'{operator}' cannot be applied to {component:?} of a {column_type} column"),
        )
    })?;
    check_values(column, element_type, &values)?;

    Ok(TableFilter::MapSetList {
        column: column.to_string(),
        component,
        operator: set_operator,
        values,
    })
}

/// Type of the elements `component` selects from a container column.
fn component_type(column_type: &ColumnType, component: MapSetListComponent) -> Option<&ColumnType> {
    use MapSetListComponent as M;

    match (column_type, component) {
        (ColumnType::List(element), M::ListValue)
        | (ColumnType::Set(element), M::SetValue)
        | (ColumnType::Map(element, _), M::MapKey)
        | (ColumnType::Map(_, element), M::MapValue) => Some(element.as_ref()),
        _ => None,
    }
}

fn map_entry(
    column: &str,
    key_type: &ColumnType,
    value_type: &ColumnType,
    operator: FilterOperator,
    entry: JsonLiteral,
) -> Result<(JsonLiteral, JsonLiteral), FilterError> {
    let (key, value) = match entry {
        JsonLiteral::Array(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            match (pair.next(), pair.next()) {
                (Some(key), Some(value)) => (key, value),
                _ => return Err(entry_error(operator)),
            }
        }
        _ => return Err(entry_error(operator)),
    };
    check_values(column, key_type, std::slice::from_ref(&key))?;
    check_values(column, value_type, std::slice::from_ref(&value))?;
    Ok((key, value))
}

fn check_values(
    column: &str,
    column_type: &ColumnType,
    values: &[JsonLiteral],
) -> Result<(), FilterError> {
    match values.iter().find(|v| !accepts(column_type, v.json_type())) {
        Some(value) => Err(value_mismatch(column, column_type, value.json_type())),
        None => Ok(()),
    }
}

fn require_scalar(
    column: &str,
    column_type: &ColumnType,
    operator: FilterOperator,
) -> Result<(), FilterError> {
    if column_type.is_scalar() {
        Ok(())
    } else {
        Err(unsupported(
            column,
            format!("'{operator}' cannot compare a whole {column_type} column"),
        ))
    }
}

/// Whether values of `kind` can be bound to a column of `column_type`.
fn accepts(column_type: &ColumnType, kind: JsonType) -> bool {
    use ColumnType as T;

    match column_type {
        T::Ascii | T::Text | T::Inet | T::Uuid | T::Duration | T::Blob | T::Time => {
            kind == JsonType::String
        }
        T::BigInt
        | T::Decimal
        | T::Double
        | T::Float
        | T::Int
        | T::SmallInt
        | T::TinyInt
        | T::VarInt => kind == JsonType::Number,
        T::Boolean => kind == JsonType::Boolean,
        T::Date | T::Timestamp => matches!(kind, JsonType::Date | JsonType::String),
        T::List(_) | T::Set(_) | T::Map(..) | T::Vector { .. } => false,
    }
}

fn unsupported(column: &str, message: String) -> FilterError {
    FilterError::UnsupportedColumnFilter {
        column: column.to_string(),
        message,
    }
}

fn value_mismatch(column: &str, column_type: &ColumnType, kind: JsonType) -> FilterError {
    unsupported(
        column,
        format!("{kind} value cannot be compared with a {column_type} column"),
    )
}

fn operand_mismatch(column: &str, operator: FilterOperator, operand: &JsonLiteral) -> FilterError {
    unsupported(
        column,
        format!("'{operator}' cannot take a {} operand", operand.json_type()),
    )
}

fn entry_error(operator: FilterOperator) -> FilterError {
    FilterError::InvalidOperand {
        operator: operator.key(),
        message: "map entries must be [key, value] pairs".into(),
    }
}

// ── Resolver ───────────────────────────────────────────────────

/// Compiles table filters into [`TableFilter`] trees.
pub struct TableFilterResolver<'a> {
    schema: &'a TableSchema,
    config: &'a OperationsConfig,
}

impl<'a> TableFilterResolver<'a> {
    pub fn new(schema: &'a TableSchema, config: &'a OperationsConfig) -> Self {
        Self { schema, config }
    }
}

impl FilterResolver for TableFilterResolver<'_> {
    type Schema = TableSchema;
    type Filter = TableFilter;

    fn schema(&self) -> &TableSchema {
        self.schema
    }

    fn config(&self) -> &OperationsConfig {
        self.config
    }

    fn resolve(&self, clause: &FilterClause) -> Result<ResolvedFilter<TableFilter>, FilterError> {
        let expression = RULES.apply(clause, self.schema)?;
        resolver::finish(expression, clause, self.config)
    }
}
