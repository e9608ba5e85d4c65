use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::expression::ComparisonExpression;
use crate::operator::FilterOperator;

use super::{ContainerKind, FilterSchema, FilterWarning};

pub const ID_FIELD: &str = "_id";
pub const VECTOR_FIELD: &str = "$vector";
pub const VECTORIZE_FIELD: &str = "$vectorize";
pub const LEXICAL_FIELD: &str = "$lexical";

const WILDCARD: &str = "*";

/// Which document paths a collection indexes.
///
/// With neither list every path is indexed. `allow` wins over `deny`.
/// A rule covers its own path and everything below it, `"*"` covers all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default)]
    pub allow: Option<Vec<String>>,
    #[serde(default)]
    pub deny: Option<Vec<String>>,
}

impl IndexingConfig {
    pub fn is_indexed(&self, path: &str) -> bool {
        if let Some(allow) = &self.allow {
            return allow.iter().any(|rule| covers(rule, path));
        }
        if let Some(deny) = &self.deny {
            return !deny.iter().any(|rule| covers(rule, path));
        }
        true
    }
}

fn covers(rule: &str, path: &str) -> bool {
    rule == WILDCARD
        || rule == path
        || path
            .strip_prefix(rule)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// A schemaless document collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub vector_enabled: bool,
    #[serde(default)]
    pub lexical_enabled: bool,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn reserved_field_enabled(&self, field: &str) -> bool {
        match field {
            VECTOR_FIELD | VECTORIZE_FIELD => self.vector_enabled,
            LEXICAL_FIELD => self.lexical_enabled,
            _ => false,
        }
    }
}

impl FilterSchema for CollectionSchema {
    fn identity_path(&self) -> Option<&str> {
        Some(ID_FIELD)
    }

    fn is_reserved_field(&self, key: &str) -> bool {
        matches!(key, VECTOR_FIELD | VECTORIZE_FIELD | LEXICAL_FIELD)
    }

    fn container_kind(&self, _path: &str) -> Option<ContainerKind> {
        None
    }

    fn check_comparison(
        &self,
        comparison: &ComparisonExpression,
    ) -> Result<Option<FilterWarning>, FilterError> {
        let path = comparison.path();

        if self.is_reserved_field(path) {
            if !self.reserved_field_enabled(path) {
                return Err(FilterError::InvalidFilterExpression(format!(
                    "'{path}' is not enabled for collection '{}'",
                    self.name
                )));
            }
            if comparison
                .operations()
                .iter()
                .any(|op| op.operator != FilterOperator::EXISTS)
            {
                return Err(FilterError::InvalidFilterExpression(format!(
                    "only '$exists' can be used on '{path}'"
                )));
            }
            return Ok(None);
        }

        if !self.indexing.is_indexed(path) {
            if path == ID_FIELD {
                return Err(FilterError::IdNotIndexed(path.to_string()));
            }
            return Err(FilterError::UnindexedFilterPath(path.to_string()));
        }
        Ok(None)
    }
}
