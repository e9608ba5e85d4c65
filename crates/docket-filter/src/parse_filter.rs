use serde_json::{Map, Value};
use tracing::debug;

use crate::clause::FilterClause;
use crate::config::OperationsConfig;
use crate::error::FilterError;
use crate::expression::{ComparisonExpression, LogicalExpression, LogicalOperator, MapSetListComponent};
use crate::literal::{self, DocumentId, JsonLiteral};
use crate::operator::FilterOperator;
use crate::schema::{ContainerKind, FilterSchema, FilterWarning};
use crate::validate;

const KEYS_SELECTOR: &str = "$keys";
const VALUES_SELECTOR: &str = "$values";

/// Parses JSON filter documents for one filter target.
pub struct FilterClauseParser<'a, S: FilterSchema + ?Sized> {
    schema: &'a S,
    config: &'a OperationsConfig,
}

impl<'a, S: FilterSchema + ?Sized> FilterClauseParser<'a, S> {
    pub fn new(schema: &'a S, config: &'a OperationsConfig) -> Self {
        Self { schema, config }
    }

    /// Parse a filter into a validated, normalized clause.
    ///
    /// - `null` or no filter at all is the empty clause
    /// - the top-level object is an implicit AND of its entries
    /// - `{ "field": value }` is implicit `$eq`
    /// - `{ "field": { "$gt": v, "$lt": w } }` yields one comparison per operator
    /// - `{ "$or": [...] }` / `{ "$and": [...] }` for explicit logical ops
    /// - `{ "$not": { ... } }` negates an implicit AND
    pub fn parse(&self, filter: Option<&Value>) -> Result<FilterClause, FilterError> {
        let doc = match filter {
            None | Some(Value::Null) => return Ok(FilterClause::empty()),
            Some(Value::Object(doc)) => doc,
            Some(other) => return Err(FilterError::FilterNotObject(json_type_name(other))),
        };

        let mut warnings = Vec::new();
        let expression = self.parse_document(doc, &mut warnings)?;
        validate::check_operands(&expression, self.config)?;

        let identity = self.schema.identity_path().map(str::to_string);
        let mut clause = FilterClause::new(expression, identity, warnings);
        clause.validate()?;
        debug!(
            comparisons = clause.expression().total_comparisons(),
            warnings = clause.warnings().len(),
            "parsed filter clause"
        );
        Ok(clause)
    }

    /// Parse one filter object as an implicit AND.
    fn parse_document(
        &self,
        doc: &Map<String, Value>,
        warnings: &mut Vec<FilterWarning>,
    ) -> Result<LogicalExpression, FilterError> {
        let mut node = LogicalExpression::and();

        for (key, value) in doc {
            match key.as_str() {
                "$and" => {
                    node.add_child(self.parse_logical_array(key, value, LogicalOperator::And, warnings)?)
                }
                "$or" => {
                    node.add_child(self.parse_logical_array(key, value, LogicalOperator::Or, warnings)?)
                }
                "$not" => node.add_child(self.parse_not(value, warnings)?),
                k if k.starts_with('$') && !self.schema.is_reserved_field(k) => {
                    return Err(FilterError::UnsupportedOperator(k.to_string()));
                }
                _ => {
                    for comparison in self.parse_field(key, value, warnings)? {
                        node.add_comparison(comparison);
                    }
                }
            }
        }

        Ok(node)
    }

    /// Parse a `$and` or `$or` array value into a logical expression.
    fn parse_logical_array(
        &self,
        key: &str,
        value: &Value,
        operator: LogicalOperator,
        warnings: &mut Vec<FilterWarning>,
    ) -> Result<LogicalExpression, FilterError> {
        let Value::Array(items) = value else {
            return Err(FilterError::InvalidFilterExpression(format!(
                "'{key}' value must be an array"
            )));
        };
        if items.is_empty() {
            return Err(FilterError::InvalidFilterExpression(format!(
                "'{key}' array must not be empty"
            )));
        }

        let mut node = LogicalExpression::new(operator);
        for item in items {
            match item {
                Value::Object(doc) if !doc.is_empty() => {
                    node.absorb(self.parse_document(doc, warnings)?);
                }
                _ => {
                    return Err(FilterError::InvalidFilterExpression(format!(
                        "'{key}' array elements must be non-empty objects"
                    )));
                }
            }
        }
        Ok(node)
    }

    fn parse_not(
        &self,
        value: &Value,
        warnings: &mut Vec<FilterWarning>,
    ) -> Result<LogicalExpression, FilterError> {
        match value {
            Value::Object(doc) if !doc.is_empty() => {
                Ok(LogicalExpression::not(self.parse_document(doc, warnings)?))
            }
            _ => Err(FilterError::InvalidFilterExpression(
                "'$not' value must be a non-empty object".into(),
            )),
        }
    }

    /// Parse a field condition: implicit `$eq`, an operator object, or a
    /// container selector object.
    fn parse_field(
        &self,
        path: &str,
        value: &Value,
        warnings: &mut Vec<FilterWarning>,
    ) -> Result<Vec<ComparisonExpression>, FilterError> {
        if self.schema.is_reserved_field(path) {
            if value.is_array() {
                return Err(FilterError::ReservedFieldArray(path.to_string()));
            }
        } else {
            validate_path(path)?;
        }

        let comparisons = match value {
            Value::Object(obj) if is_operator_object(obj) => match self.schema.container_kind(path) {
                Some(kind) => self.parse_container_operators(path, kind, obj)?,
                None => self.parse_operators(path, obj)?,
            },
            _ => vec![ComparisonExpression::single(
                path,
                FilterOperator::EQ,
                self.operand(path, FilterOperator::EQ, value)?,
            )],
        };

        for comparison in &comparisons {
            if let Some(warning) = self.schema.check_comparison(comparison)? {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }
        Ok(comparisons)
    }

    /// Parse an operator object like `{ "$gt": 21, "$lte": 100 }`.
    fn parse_operators(
        &self,
        path: &str,
        obj: &Map<String, Value>,
    ) -> Result<Vec<ComparisonExpression>, FilterError> {
        obj.iter()
            .map(|(key, operand)| {
                let operator = operator(path, key)?;
                let operand = self.operand(path, operator, operand)?;
                Ok(ComparisonExpression::single(path, operator, operand))
            })
            .collect()
    }

    /// Parse the operator object of a list, set or map column.
    ///
    /// Membership and array operators look at the elements of lists and sets
    /// and at `[key, value]` entries of maps; `$keys` / `$values` select map
    /// keys or values instead.
    fn parse_container_operators(
        &self,
        path: &str,
        kind: ContainerKind,
        obj: &Map<String, Value>,
    ) -> Result<Vec<ComparisonExpression>, FilterError> {
        let mut comparisons = Vec::new();

        for (key, operand) in obj {
            match key.as_str() {
                KEYS_SELECTOR | VALUES_SELECTOR => {
                    if kind != ContainerKind::Map {
                        return Err(FilterError::UnsupportedColumnFilter {
                            column: path.to_string(),
                            message: format!("'{key}' can only be used on map columns, not {kind}"),
                        });
                    }
                    let component = if key == KEYS_SELECTOR {
                        MapSetListComponent::MapKey
                    } else {
                        MapSetListComponent::MapValue
                    };
                    let inner = match operand {
                        Value::Object(inner) if !inner.is_empty() => inner,
                        _ => {
                            return Err(FilterError::InvalidFilterExpression(format!(
                                "'{key}' on '{path}' requires an operator object"
                            )));
                        }
                    };
                    for (inner_key, inner_operand) in inner {
                        let operator = operator(path, inner_key)?;
                        if !is_container_operator(operator) {
                            return Err(FilterError::UnsupportedColumnFilter {
                                column: path.to_string(),
                                message: format!("'{operator}' cannot be used with '{key}'"),
                            });
                        }
                        let literal = JsonLiteral::from_json(inner_operand)?;
                        comparisons.push(
                            ComparisonExpression::single(path, operator, literal)
                                .with_component(component),
                        );
                    }
                }
                _ => {
                    let operator = operator(path, key)?;
                    if !is_container_operator(operator) {
                        let literal = self.operand(path, operator, operand)?;
                        comparisons.push(ComparisonExpression::single(path, operator, literal));
                        continue;
                    }
                    let component = match kind {
                        ContainerKind::List => MapSetListComponent::ListValue,
                        ContainerKind::Set => MapSetListComponent::SetValue,
                        ContainerKind::Map => {
                            check_map_entries(operator, operand)?;
                            MapSetListComponent::MapEntry
                        }
                    };
                    let literal = JsonLiteral::from_json(operand)?;
                    comparisons.push(
                        ComparisonExpression::single(path, operator, literal).with_component(component),
                    );
                }
            }
        }

        Ok(comparisons)
    }

    /// Decode an operand. Equality and membership operands on the identity
    /// path become document ids.
    fn operand(
        &self,
        path: &str,
        operator: FilterOperator,
        value: &Value,
    ) -> Result<JsonLiteral, FilterError> {
        if self.schema.identity_path() == Some(path) {
            match (operator, value) {
                (FilterOperator::EQ | FilterOperator::NE, _) => {
                    return Ok(JsonLiteral::DocumentId(DocumentId::from_json(value)?));
                }
                (FilterOperator::IN | FilterOperator::NIN, Value::Array(items)) => {
                    return items
                        .iter()
                        .map(|item| DocumentId::from_json(item).map(JsonLiteral::DocumentId))
                        .collect::<Result<Vec<_>, _>>()
                        .map(JsonLiteral::Array);
                }
                _ => {}
            }
        }
        JsonLiteral::from_json(value)
    }
}

fn operator(path: &str, key: &str) -> Result<FilterOperator, FilterError> {
    if !key.starts_with('$') {
        return Err(FilterError::InvalidFilterExpression(format!(
            "cannot mix operators and field names in the condition for '{path}'"
        )));
    }
    FilterOperator::from_key(key).ok_or_else(|| FilterError::UnsupportedOperator(key.to_string()))
}

/// An object is an operator object when any key starts with `$`, unless it
/// is an extended-JSON literal such as `{"$date": 0}`.
fn is_operator_object(obj: &Map<String, Value>) -> bool {
    !literal::is_extended_json(obj) && obj.keys().any(|k| k.starts_with('$'))
}

fn is_container_operator(operator: FilterOperator) -> bool {
    matches!(
        operator,
        FilterOperator::IN | FilterOperator::NIN | FilterOperator::ALL | FilterOperator::NOT_ANY
    )
}

fn check_map_entries(operator: FilterOperator, operand: &Value) -> Result<(), FilterError> {
    let Value::Array(entries) = operand else {
        // Non-array operands are reported by the operand checks.
        return Ok(());
    };
    let well_formed = entries
        .iter()
        .all(|entry| matches!(entry, Value::Array(pair) if pair.len() == 2));
    if well_formed {
        Ok(())
    } else {
        Err(FilterError::InvalidOperand {
            operator: operator.key(),
            message: "map entries must be [key, value] pairs".into(),
        })
    }
}

/// Check a dotted path: no empty segments, and `&` only as the escape in
/// `&.` or `&&`.
fn validate_path(path: &str) -> Result<(), FilterError> {
    if path.is_empty() {
        return Err(FilterError::InvalidFilterExpression(
            "filter path must not be empty".into(),
        ));
    }

    let mut chars = path.chars();
    let mut segment_len = 0;
    while let Some(c) = chars.next() {
        match c {
            '&' => match chars.next() {
                Some('.') | Some('&') => segment_len += 1,
                _ => {
                    return Err(FilterError::InvalidFilterExpression(format!(
                        "filter path '{path}' has an invalid '&' escape"
                    )));
                }
            },
            '.' => {
                if segment_len == 0 {
                    break;
                }
                segment_len = 0;
            }
            _ => segment_len += 1,
        }
    }

    if segment_len == 0 {
        return Err(FilterError::InvalidFilterExpression(format!(
            "filter path '{path}' has an empty segment"
        )));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
