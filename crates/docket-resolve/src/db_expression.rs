use serde::Serialize;

use docket_filter::FilterError;

use crate::capture::{CaptureGroup, CaptureGroups};

/// Logical operator of a resolved node. NOT never survives normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DbLogicalOperator {
    And,
    Or,
}

/// A resolved filter tree of backend primitives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbLogicalExpression<F> {
    operator: DbLogicalOperator,
    filters: Vec<F>,
    children: Vec<DbLogicalExpression<F>>,
}

impl<F> DbLogicalExpression<F> {
    /// The AND root with nothing in it.
    pub fn empty() -> Self {
        Self {
            operator: DbLogicalOperator::And,
            filters: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Build the tree for a matched capture tree, one node per capture node.
    ///
    /// Children are built first; `translate` then turns each capture group of
    /// the node into primitives.
    pub fn build<M, T>(groups: CaptureGroups<M>, translate: &mut T) -> Result<Self, FilterError>
    where
        M: Copy + PartialEq,
        T: FnMut(CaptureGroup<M>) -> Result<Vec<F>, FilterError>,
    {
        let (operator, groups, children) = groups.into_parts();

        let children = children
            .into_iter()
            .map(|child| Self::build(child, translate))
            .collect::<Result<Vec<_>, _>>()?;

        let mut filters = Vec::new();
        for group in groups {
            filters.extend(translate(group)?);
        }

        Ok(Self {
            operator,
            filters,
            children,
        })
    }

    pub fn operator(&self) -> DbLogicalOperator {
        self.operator
    }

    pub fn filters(&self) -> &[F] {
        &self.filters
    }

    pub fn children(&self) -> &[DbLogicalExpression<F>] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.children.is_empty()
    }

    /// Number of primitives in the whole tree.
    pub fn filter_count(&self) -> usize {
        self.filters.len() + self.children.iter().map(Self::filter_count).sum::<usize>()
    }

    /// Every primitive, depth first, node filters before children.
    pub fn iter_filters(&self) -> Box<dyn Iterator<Item = &F> + '_> {
        Box::new(
            self.filters
                .iter()
                .chain(self.children.iter().flat_map(|c| c.iter_filters())),
        )
    }
}

impl<F> Default for DbLogicalExpression<F> {
    fn default() -> Self {
        Self::empty()
    }
}
