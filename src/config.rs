//! Builder configuration.

use serde::{Deserialize, Serialize};

/// Largest `size` (and `from + size` window) the backend serves by default.
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// Suffix `term()` appends to target the unanalyzed sub-field.
pub const KEYWORD_SUFFIX: &str = ".keyword";

/// Configuration shared by a builder and every sub-builder it spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBuilderConfig {
    /// Upper bound accepted by `size()`.
    pub max_result_window: u64,

    /// Suffix appended by `term()` unless the field already ends with it.
    pub keyword_suffix: String,
}

impl Default for QueryBuilderConfig {
    fn default() -> Self {
        QueryBuilderConfig {
            max_result_window: MAX_RESULT_WINDOW,
            keyword_suffix: KEYWORD_SUFFIX.to_string(),
        }
    }
}

impl QueryBuilderConfig {
    /// Set the upper bound accepted by `size()`.
    pub fn with_max_result_window(mut self, max: u64) -> Self {
        self.max_result_window = max;
        self
    }

    /// Set the suffix used by `term()`.
    pub fn with_keyword_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.keyword_suffix = suffix.into();
        self
    }

    /// Apply the keyword convention to a field name.
    pub fn keyword_field(&self, field: &str) -> String {
        if field.ends_with(&self.keyword_suffix) {
            field.to_string()
        } else {
            format!("{field}{}", self.keyword_suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryBuilderConfig::default();
        assert_eq!(config.max_result_window, 10_000);
        assert_eq!(config.keyword_suffix, ".keyword");
    }

    #[test]
    fn test_keyword_field() {
        let config = QueryBuilderConfig::default();
        assert_eq!(config.keyword_field("brand"), "brand.keyword");
        assert_eq!(config.keyword_field("brand.keyword"), "brand.keyword");

        let config = config.with_keyword_suffix(".raw");
        assert_eq!(config.keyword_field("brand"), "brand.raw");
    }

    #[test]
    fn test_config_deserialization() {
        let config: QueryBuilderConfig =
            serde_json::from_str(r#"{"max_result_window": 500, "keyword_suffix": ".kw"}"#)
                .unwrap();
        assert_eq!(config.max_result_window, 500);
        assert_eq!(config.keyword_field("tag"), "tag.kw");
    }
}
