use std::fmt;

use tracing::trace;

use docket_filter::{FilterOperator, JsonType, LogicalExpression, LogicalOperator};

use crate::capture::{Capture, CaptureGroups};
use crate::db_expression::DbLogicalOperator;

/// How completely a matcher's captures must cover a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Only the empty filter matches.
    Empty,
    /// Each capture claims exactly one comparison and every comparison is
    /// claimed.
    Strict,
    /// Every comparison is claimed; captures may claim none or many.
    Greedy,
}

/// Why a matcher rejected a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub unmatched_captures: usize,
    pub unmatched_comparisons: usize,
    /// Description of the first comparison no capture accepted.
    pub first_unclaimed: Option<String>,
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.first_unclaimed {
            Some(comparison) => write!(f, "no supported filter for {comparison}"),
            None if self.unmatched_captures > 0 => write!(
                f,
                "{} expected comparison(s) missing",
                self.unmatched_captures
            ),
            None => f.write_str("filter shape is not supported"),
        }
    }
}

/// An ordered set of captures plus the strategy deciding success.
#[derive(Debug, Clone)]
pub struct FilterMatcher<M> {
    strategy: MatchStrategy,
    captures: Vec<Capture<M>>,
}

/// Pending capture declaration, finished by [`CaptureBuilder::compare_values`].
pub struct CaptureBuilder<M> {
    matcher: FilterMatcher<M>,
    marker: M,
}

impl<M: Copy> CaptureBuilder<M> {
    /// Accept comparisons on `path` (or any path for `*`) using only
    /// `operators` with operands of `kind`.
    pub fn compare_values(
        mut self,
        path: &str,
        operators: &[FilterOperator],
        kind: JsonType,
    ) -> FilterMatcher<M> {
        self.matcher
            .captures
            .push(Capture::new(self.marker, path, operators, kind));
        self.matcher
    }
}

struct MatchState {
    available: Vec<bool>,
    unmatched_comparisons: usize,
    first_unclaimed: Option<String>,
    strict: bool,
}

impl<M: Copy + PartialEq + fmt::Debug> FilterMatcher<M> {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self {
            strategy,
            captures: Vec::new(),
        }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn captures(&self) -> &[Capture<M>] {
        &self.captures
    }

    /// Start declaring a capture tagged with `marker`.
    pub fn capture(self, marker: M) -> CaptureBuilder<M> {
        CaptureBuilder {
            matcher: self,
            marker,
        }
    }

    /// Assign every comparison of a normalized filter to a capture.
    pub fn apply(&self, expr: &LogicalExpression) -> Result<CaptureGroups<M>, MatchFailure> {
        if self.strategy == MatchStrategy::Empty {
            return if expr.is_empty() {
                Ok(CaptureGroups::new(DbLogicalOperator::And))
            } else {
                Err(MatchFailure {
                    unmatched_captures: 0,
                    unmatched_comparisons: expr.total_comparisons(),
                    first_unclaimed: None,
                })
            };
        }

        let mut state = MatchState {
            available: vec![true; self.captures.len()],
            unmatched_comparisons: 0,
            first_unclaimed: None,
            strict: self.strategy == MatchStrategy::Strict,
        };

        let groups = self.match_node(expr, &mut state);

        let unmatched_captures = if state.strict {
            state.available.iter().filter(|a| **a).count()
        } else {
            0
        };
        let failure = MatchFailure {
            unmatched_captures,
            unmatched_comparisons: state.unmatched_comparisons,
            first_unclaimed: state.first_unclaimed,
        };

        match groups {
            Some(groups) if unmatched_captures == 0 && failure.unmatched_comparisons == 0 => {
                Ok(groups)
            }
            _ => {
                trace!(
                    strategy = ?self.strategy,
                    unmatched_captures,
                    unmatched_comparisons = failure.unmatched_comparisons,
                    "matcher rejected filter"
                );
                Err(failure)
            }
        }
    }

    /// Children first, then this node's comparisons in source order. `None`
    /// when a NOT node is found.
    fn match_node(
        &self,
        expr: &LogicalExpression,
        state: &mut MatchState,
    ) -> Option<CaptureGroups<M>> {
        let operator = match expr.operator() {
            LogicalOperator::And => DbLogicalOperator::And,
            LogicalOperator::Or => DbLogicalOperator::Or,
            LogicalOperator::Not => {
                trace!("NOT node reached the matcher");
                return None;
            }
        };

        let mut groups = CaptureGroups::new(operator);
        for child in expr.children() {
            groups.add_child(self.match_node(child, state)?);
        }

        for comparison in expr.comparisons() {
            let claimed = self
                .captures
                .iter()
                .enumerate()
                .find(|(i, capture)| state.available[*i] && capture.matches(comparison));

            match claimed {
                Some((index, capture)) => {
                    trace!(marker = ?capture.marker(), %comparison, "captured");
                    if state.strict {
                        state.available[index] = false;
                    }
                    groups.capture(capture.marker(), comparison);
                }
                None => {
                    state.unmatched_comparisons += 1;
                    if state.first_unclaimed.is_none() {
                        state.first_unclaimed = Some(comparison.to_string());
                    }
                }
            }
        }

        Some(groups)
    }
}
