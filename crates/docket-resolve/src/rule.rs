use std::fmt;

use tracing::{debug, trace};

use docket_filter::{FilterClause, FilterError};

use crate::capture::CaptureGroups;
use crate::db_expression::DbLogicalExpression;
use crate::matcher::{FilterMatcher, MatchFailure};

/// Turns the capture groups of a matched rule into a resolved tree. `C` is
/// the target the filter runs against (a collection or table schema).
pub type BuildFn<M, C, F> =
    fn(CaptureGroups<M>, &C) -> Result<DbLogicalExpression<F>, FilterError>;

struct Rule<M, C, F> {
    matcher: FilterMatcher<M>,
    build: BuildFn<M, C, F>,
}

/// Ordered rules; the first whose matcher accepts a filter builds it.
pub struct RuleTable<M, C, F> {
    name: &'static str,
    rules: Vec<Rule<M, C, F>>,
}

pub struct RuleTableBuilder<M, C, F> {
    name: &'static str,
    rules: Vec<Rule<M, C, F>>,
}

impl<M, C, F> RuleTableBuilder<M, C, F> {
    pub fn rule(mut self, matcher: FilterMatcher<M>, build: BuildFn<M, C, F>) -> Self {
        self.rules.push(Rule { matcher, build });
        self
    }

    /// Finish the table.
    ///
    /// # Panics
    ///
    /// When no rule was added. Rule tables are built once at startup.
    pub fn build(self) -> RuleTable<M, C, F> {
        assert!(
            !self.rules.is_empty(),
            "rule table '{}' has no rules",
            self.name
        );
        RuleTable {
            name: self.name,
            rules: self.rules,
        }
    }
}

impl<M, C, F> RuleTable<M, C, F>
where
    M: Copy + PartialEq + fmt::Debug,
{
    pub fn builder(name: &'static str) -> RuleTableBuilder<M, C, F> {
        RuleTableBuilder {
            name,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve a clause with the first rule that matches it. Later rules
    /// are never tried.
    pub fn apply(
        &self,
        clause: &FilterClause,
        target: &C,
    ) -> Result<DbLogicalExpression<F>, FilterError> {
        let expr = clause.expression();
        let mut last_failure: Option<MatchFailure> = None;

        for (index, rule) in self.rules.iter().enumerate() {
            match rule.matcher.apply(expr) {
                Ok(groups) => {
                    debug!(
                        table = self.name,
                        rule = index,
                        strategy = ?rule.matcher.strategy(),
                        "filter rule matched"
                    );
                    return (rule.build)(groups, target);
                }
                Err(failure) => {
                    trace!(table = self.name, rule = index, %failure, "filter rule skipped");
                    last_failure = Some(failure);
                }
            }
        }

        let reason = last_failure
            .map(|failure| failure.to_string())
            .unwrap_or_else(|| "no rules".to_string());
        debug!(table = self.name, %reason, "no filter rule matched");
        Err(FilterError::UnresolvableFilter(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchStrategy;
    use docket_filter::{
        CollectionSchema, FilterClauseParser, FilterOperator, JsonType, OperationsConfig,
    };
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Marker {
        Any,
    }

    fn build_empty(
        _: CaptureGroups<Marker>,
        _: &(),
    ) -> Result<DbLogicalExpression<usize>, FilterError> {
        Ok(DbLogicalExpression::empty())
    }

    /// One primitive per group holding the number of captured operations.
    fn build_counts(
        groups: CaptureGroups<Marker>,
        _: &(),
    ) -> Result<DbLogicalExpression<usize>, FilterError> {
        DbLogicalExpression::build(groups, &mut |group| Ok(vec![group.len()]))
    }

    fn table() -> RuleTable<Marker, (), usize> {
        RuleTable::builder("test")
            .rule(FilterMatcher::new(MatchStrategy::Empty), build_empty)
            .rule(
                FilterMatcher::new(MatchStrategy::Greedy)
                    .capture(Marker::Any)
                    .compare_values("*", &[FilterOperator::EQ], JsonType::Number),
                build_counts,
            )
            .build()
    }

    fn clause(filter: serde_json::Value) -> FilterClause {
        let schema = CollectionSchema::new("c");
        let config = OperationsConfig::default();
        FilterClauseParser::new(&schema, &config)
            .parse(Some(&filter))
            .unwrap()
    }

    #[test]
    fn first_matching_rule_wins() {
        let empty = table().apply(&clause(json!({})), &()).unwrap();
        assert!(empty.is_empty());

        let tree = table().apply(&clause(json!({ "a": 1, "b": 2 })), &()).unwrap();
        assert_eq!(tree.filters(), [2]);
    }

    #[test]
    fn unmatched_filter_is_unresolvable() {
        let err = table().apply(&clause(json!({ "a": "text" })), &()).unwrap_err();
        match err {
            FilterError::UnresolvableFilter(reason) => assert!(reason.contains("'a'"), "{reason}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "has no rules")]
    fn empty_table_panics_at_build() {
        let _ = RuleTable::<Marker, (), usize>::builder("empty").build();
    }
}
