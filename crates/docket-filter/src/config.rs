use serde::{Deserialize, Serialize};

/// Limits applied while compiling filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Maximum number of values in a `$in` / `$nin` array.
    pub max_in_operator_value_size: usize,
    /// Maximum number of filter primitives in a resolved filter.
    pub max_filter_object_properties: usize,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            max_in_operator_value_size: 100,
            max_filter_object_properties: 64,
        }
    }
}
