use docket_filter::{
    ComparisonExpression, FilterOperation, FilterOperator, JsonType, MapSetListComponent,
};

use crate::db_expression::DbLogicalOperator;

/// Path pattern matching every path.
pub const ANY_PATH: &str = "*";

/// A pattern a rule expects to find among the comparisons of a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture<M> {
    marker: M,
    path: String,
    operators: Vec<FilterOperator>,
    kind: JsonType,
}

impl<M: Copy> Capture<M> {
    pub fn new(
        marker: M,
        path: impl Into<String>,
        operators: &[FilterOperator],
        kind: JsonType,
    ) -> Self {
        Self {
            marker,
            path: path.into(),
            operators: operators.to_vec(),
            kind,
        }
    }

    pub fn marker(&self) -> M {
        self.marker
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn operators(&self) -> &[FilterOperator] {
        &self.operators
    }

    pub fn kind(&self) -> JsonType {
        self.kind
    }

    /// True when the path fits the pattern and every operation uses an
    /// allowed operator with an operand of the expected kind.
    pub fn matches(&self, comparison: &ComparisonExpression) -> bool {
        (self.path == ANY_PATH || self.path == comparison.path())
            && comparison.operations().iter().all(|op| {
                self.operators.contains(&op.operator) && op.operand.json_type() == self.kind
            })
    }
}

/// Operations captured on one path (and container component).
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPath {
    pub path: String,
    pub component: Option<MapSetListComponent>,
    pub operations: Vec<FilterOperation>,
}

/// Everything one capture marker claimed in one logical node.
///
/// Comparisons on the same path accumulate into one operation list.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureGroup<M> {
    marker: M,
    paths: Vec<CapturedPath>,
}

impl<M: Copy> CaptureGroup<M> {
    fn new(marker: M) -> Self {
        Self {
            marker,
            paths: Vec::new(),
        }
    }

    pub fn marker(&self) -> M {
        self.marker
    }

    pub fn paths(&self) -> &[CapturedPath] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<CapturedPath> {
        self.paths
    }

    /// Number of operations captured across all paths.
    pub fn len(&self) -> usize {
        self.paths.iter().map(|p| p.operations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn push(&mut self, comparison: &ComparisonExpression) {
        let existing = self
            .paths
            .iter_mut()
            .find(|p| p.path == comparison.path() && p.component == comparison.component());
        match existing {
            Some(captured) => captured
                .operations
                .extend_from_slice(comparison.operations()),
            None => self.paths.push(CapturedPath {
                path: comparison.path().to_string(),
                component: comparison.component(),
                operations: comparison.operations().to_vec(),
            }),
        }
    }
}

/// Capture groups for one logical node, shaped like the matched filter tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureGroups<M> {
    operator: DbLogicalOperator,
    groups: Vec<CaptureGroup<M>>,
    children: Vec<CaptureGroups<M>>,
}

impl<M: Copy + PartialEq> CaptureGroups<M> {
    pub fn new(operator: DbLogicalOperator) -> Self {
        Self {
            operator,
            groups: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn operator(&self) -> DbLogicalOperator {
        self.operator
    }

    /// Groups in the order their marker first captured something.
    pub fn groups(&self) -> &[CaptureGroup<M>] {
        &self.groups
    }

    pub fn group(&self, marker: M) -> Option<&CaptureGroup<M>> {
        self.groups.iter().find(|g| g.marker == marker)
    }

    pub fn children(&self) -> &[CaptureGroups<M>] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.children.is_empty()
    }

    /// Record a comparison under `marker`.
    pub fn capture(&mut self, marker: M, comparison: &ComparisonExpression) {
        let index = match self.groups.iter().position(|g| g.marker == marker) {
            Some(index) => index,
            None => {
                self.groups.push(CaptureGroup::new(marker));
                self.groups.len() - 1
            }
        };
        self.groups[index].push(comparison);
    }

    pub fn add_child(&mut self, child: CaptureGroups<M>) {
        self.children.push(child);
    }

    pub(crate) fn into_parts(
        self,
    ) -> (DbLogicalOperator, Vec<CaptureGroup<M>>, Vec<CaptureGroups<M>>) {
        (self.operator, self.groups, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_filter::JsonLiteral;

    fn num(path: &str, op: FilterOperator, n: i64) -> ComparisonExpression {
        ComparisonExpression::single(path, op, JsonLiteral::Number(n.into()))
    }

    #[test]
    fn wildcard_and_exact_paths() {
        let any = Capture::new('a', ANY_PATH, &[FilterOperator::EQ], JsonType::Number);
        let exact = Capture::new('b', "age", &[FilterOperator::EQ], JsonType::Number);
        let cmp = num("age", FilterOperator::EQ, 1);
        assert!(any.matches(&cmp));
        assert!(exact.matches(&cmp));
        assert!(!exact.matches(&num("size", FilterOperator::EQ, 1)));
    }

    #[test]
    fn operator_and_kind_must_both_fit() {
        let capture = Capture::new((), ANY_PATH, &[FilterOperator::GT], JsonType::Number);
        assert!(!capture.matches(&num("a", FilterOperator::LT, 1)));
        assert!(!capture.matches(&ComparisonExpression::single(
            "a",
            FilterOperator::GT,
            JsonLiteral::String("1".into())
        )));
    }

    #[test]
    fn same_path_accumulates_in_one_list() {
        let mut groups = CaptureGroups::new(DbLogicalOperator::Or);
        groups.capture(1, &num("x", FilterOperator::EQ, 1));
        groups.capture(1, &num("x", FilterOperator::EQ, 2));
        groups.capture(2, &num("y", FilterOperator::EQ, 3));

        assert_eq!(groups.groups().len(), 2);
        let group = groups.group(1).unwrap();
        assert_eq!(group.paths().len(), 1);
        assert_eq!(group.len(), 2);
        assert_eq!(groups.groups()[1].marker(), 2);
    }

    #[test]
    fn components_are_kept_apart() {
        let keys = ComparisonExpression::single(
            "m",
            FilterOperator::IN,
            JsonLiteral::Array(vec![]),
        )
        .with_component(MapSetListComponent::MapKey);
        let values = ComparisonExpression::single(
            "m",
            FilterOperator::IN,
            JsonLiteral::Array(vec![]),
        )
        .with_component(MapSetListComponent::MapValue);

        let mut groups = CaptureGroups::new(DbLogicalOperator::And);
        groups.capture(0, &keys);
        groups.capture(0, &values);
        assert_eq!(groups.group(0).unwrap().paths().len(), 2);
    }
}
