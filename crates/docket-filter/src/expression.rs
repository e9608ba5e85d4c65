use std::fmt;

use serde::Serialize;
use serde_json::Number;

use crate::literal::JsonLiteral;
use crate::operator::FilterOperator;

/// Logical operator of a `LogicalExpression` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

/// Which part of a list, set or map column a comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSetListComponent {
    ListValue,
    SetValue,
    MapKey,
    MapValue,
    MapEntry,
}

/// One operator applied to one operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOperation {
    pub operator: FilterOperator,
    pub operand: JsonLiteral,
}

impl FilterOperation {
    pub fn new(operator: FilterOperator, operand: JsonLiteral) -> Self {
        Self { operator, operand }
    }

    /// The operation selecting the complement of this one.
    ///
    /// `$exists` flips its boolean and `$size` flips the sign of its count,
    /// so `$size: 0` negates to `-0.0`.
    pub fn negated(&self) -> Self {
        let operand = match (self.operator, &self.operand) {
            (FilterOperator::EXISTS, JsonLiteral::Boolean(b)) => JsonLiteral::Boolean(!b),
            (FilterOperator::SIZE, JsonLiteral::Number(n)) => JsonLiteral::Number(negate(n)),
            (_, operand) => operand.clone(),
        };
        Self {
            operator: self.operator.negated(),
            operand,
        }
    }
}

fn negate(n: &Number) -> Number {
    if let Some(i) = n.as_i64() {
        if i != 0 {
            if let Some(neg) = i.checked_neg() {
                return Number::from(neg);
            }
        }
    }
    let f = n.as_f64().unwrap_or(0.0);
    Number::from_f64(-f).unwrap_or_else(|| n.clone())
}

/// A field path with the operations applied to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonExpression {
    path: String,
    operations: Vec<FilterOperation>,
    component: Option<MapSetListComponent>,
}

impl ComparisonExpression {
    pub fn new(path: impl Into<String>, operations: Vec<FilterOperation>) -> Self {
        Self {
            path: path.into(),
            operations,
            component: None,
        }
    }

    pub fn single(path: impl Into<String>, operator: FilterOperator, operand: JsonLiteral) -> Self {
        Self::new(path, vec![FilterOperation::new(operator, operand)])
    }

    pub fn with_component(mut self, component: MapSetListComponent) -> Self {
        self.component = Some(component);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn operations(&self) -> &[FilterOperation] {
        &self.operations
    }

    pub fn component(&self) -> Option<MapSetListComponent> {
        self.component
    }

    /// Negate into one single-operation comparison per operation; the caller
    /// joins them with OR.
    fn negated(&self) -> impl Iterator<Item = ComparisonExpression> + '_ {
        self.operations.iter().map(|op| ComparisonExpression {
            path: self.path.clone(),
            operations: vec![op.negated()],
            component: self.component,
        })
    }
}

impl fmt::Display for ComparisonExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.path)?;
        for op in &self.operations {
            write!(f, " {} {}", op.operator, op.operand.json_type())?;
        }
        Ok(())
    }
}

/// A node of the normalized filter tree.
///
/// Children and comparisons keep the order they had in the source JSON.
/// A `Not` node always holds exactly one implicit-AND child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalExpression {
    operator: LogicalOperator,
    children: Vec<LogicalExpression>,
    comparisons: Vec<ComparisonExpression>,
}

impl LogicalExpression {
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            operator,
            children: Vec::new(),
            comparisons: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(LogicalOperator::And)
    }

    pub fn or() -> Self {
        Self::new(LogicalOperator::Or)
    }

    pub fn not(inner: LogicalExpression) -> Self {
        Self {
            operator: LogicalOperator::Not,
            children: vec![inner],
            comparisons: Vec::new(),
        }
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn children(&self) -> &[LogicalExpression] {
        &self.children
    }

    pub fn comparisons(&self) -> &[ComparisonExpression] {
        &self.comparisons
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.comparisons.is_empty()
    }

    /// Number of comparisons in this node and all its descendants.
    pub fn total_comparisons(&self) -> usize {
        self.comparisons.len()
            + self
                .children
                .iter()
                .map(LogicalExpression::total_comparisons)
                .sum::<usize>()
    }

    pub fn add_child(&mut self, child: LogicalExpression) {
        self.children.push(child);
    }

    pub fn add_comparison(&mut self, comparison: ComparisonExpression) {
        self.comparisons.push(comparison);
    }

    /// Add a parsed `$and`/`$or` element. An element holding a single
    /// comparison joins this node directly.
    pub(crate) fn absorb(&mut self, mut element: LogicalExpression) {
        if element.children.is_empty() && element.comparisons.len() == 1 {
            self.comparisons.append(&mut element.comparisons);
        } else {
            self.children.push(element);
        }
    }

    /// Remove every `Not` node by pushing the negation down to the
    /// comparisons. The result only contains `And` and `Or` nodes.
    pub fn normalized(self) -> Self {
        match self.operator {
            LogicalOperator::Not => self.into_not_inner().negated(),
            operator => Self {
                operator,
                children: self
                    .children
                    .into_iter()
                    .map(LogicalExpression::normalized)
                    .collect(),
                comparisons: self.comparisons,
            },
        }
    }

    fn negated(self) -> Self {
        let flipped = match self.operator {
            LogicalOperator::Not => return self.into_not_inner().normalized(),
            LogicalOperator::And => LogicalOperator::Or,
            LogicalOperator::Or => LogicalOperator::And,
        };
        let children: Vec<_> = self
            .children
            .into_iter()
            .map(LogicalExpression::negated)
            .collect();
        let comparisons: Vec<_> = self
            .comparisons
            .iter()
            .flat_map(ComparisonExpression::negated)
            .collect();
        // A single term is its own conjunction; keep it an implicit AND.
        let operator = if children.len() + comparisons.len() > 1 {
            flipped
        } else {
            LogicalOperator::And
        };
        Self {
            operator,
            children,
            comparisons,
        }
    }

    fn into_not_inner(self) -> Self {
        self.children
            .into_iter()
            .next()
            .unwrap_or_else(LogicalExpression::and)
    }

    /// True when no `Not` node remains anywhere in the tree.
    pub fn is_normalized(&self) -> bool {
        self.operator != LogicalOperator::Not
            && self.children.iter().all(LogicalExpression::is_normalized)
    }
}
