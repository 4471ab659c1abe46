//! Error types for the QueryKit library.
//!
//! Every argument check performed by the builder produces a [`ValidationError`],
//! which carries a message, the offending field (when there is one), a
//! machine-readable [`ErrorCode`] and the name of the operation that rejected
//! the input. It is wrapped by [`QueryKitError`], the crate-wide error type.
//!
//! # Examples
//!
//! ```
//! use querykit::error::{ErrorCode, QueryKitError};
//! use querykit::query::QueryBuilder;
//!
//! let mut builder = QueryBuilder::new();
//! match builder.size(10_001) {
//!     Err(QueryKitError::Validation(e)) => assert_eq!(e.code(), ErrorCode::SizeExceedsLimit),
//!     _ => unreachable!(),
//! }
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Machine-readable reason attached to a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FieldNameEmpty,
    QueryValueMissing,
    QueryValueEmpty,
    InvalidRangeType,
    EmptyRange,
    InvalidRangeKeys,
    ConflictingRangeBounds,
    InvalidFrom,
    InvalidSize,
    SizeExceedsLimit,
    InvalidSortOrder,
    EmptyArray,
    InvalidArrayElement,
    InvalidMultiMatchType,
    AggregationNameEmpty,
    InvalidAggregation,
    AggregationNotFound,
    EmptyTermsValues,
    InvalidIndexName,
    IndexNameTooLong,
    InvalidPositiveInteger,
    EmptyString,
    InvalidBoost,
    InvalidNumber,
    InvalidGeoPoint,
    InvalidDistance,
    InvalidPolygon,
    InvalidQueryObject,
    InvalidSection,
}

impl ErrorCode {
    /// The code as it appears in logs and serialized errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FieldNameEmpty => "FIELD_NAME_EMPTY",
            ErrorCode::QueryValueMissing => "QUERY_VALUE_MISSING",
            ErrorCode::QueryValueEmpty => "QUERY_VALUE_EMPTY",
            ErrorCode::InvalidRangeType => "INVALID_RANGE_TYPE",
            ErrorCode::EmptyRange => "EMPTY_RANGE",
            ErrorCode::InvalidRangeKeys => "INVALID_RANGE_KEYS",
            ErrorCode::ConflictingRangeBounds => "CONFLICTING_RANGE_BOUNDS",
            ErrorCode::InvalidFrom => "INVALID_FROM",
            ErrorCode::InvalidSize => "INVALID_SIZE",
            ErrorCode::SizeExceedsLimit => "SIZE_EXCEEDS_LIMIT",
            ErrorCode::InvalidSortOrder => "INVALID_SORT_ORDER",
            ErrorCode::EmptyArray => "EMPTY_ARRAY",
            ErrorCode::InvalidArrayElement => "INVALID_ARRAY_ELEMENT",
            ErrorCode::InvalidMultiMatchType => "INVALID_MULTI_MATCH_TYPE",
            ErrorCode::AggregationNameEmpty => "AGGREGATION_NAME_EMPTY",
            ErrorCode::InvalidAggregation => "INVALID_AGGREGATION",
            ErrorCode::AggregationNotFound => "AGGREGATION_NOT_FOUND",
            ErrorCode::EmptyTermsValues => "EMPTY_TERMS_VALUES",
            ErrorCode::InvalidIndexName => "INVALID_INDEX_NAME",
            ErrorCode::IndexNameTooLong => "INDEX_NAME_TOO_LONG",
            ErrorCode::InvalidPositiveInteger => "INVALID_POSITIVE_INTEGER",
            ErrorCode::EmptyString => "EMPTY_STRING",
            ErrorCode::InvalidBoost => "INVALID_BOOST",
            ErrorCode::InvalidNumber => "INVALID_NUMBER",
            ErrorCode::InvalidGeoPoint => "INVALID_GEO_POINT",
            ErrorCode::InvalidDistance => "INVALID_DISTANCE",
            ErrorCode::InvalidPolygon => "INVALID_POLYGON",
            ErrorCode::InvalidQueryObject => "INVALID_QUERY_OBJECT",
            ErrorCode::InvalidSection => "INVALID_SECTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected builder argument.
///
/// Raised before any part of the document is touched, so a failed call leaves
/// the builder exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    message: String,
    field: Option<String>,
    code: ErrorCode,
    context: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new<M, C>(code: ErrorCode, message: M, context: C) -> Self
    where
        M: Into<String>,
        C: Into<String>,
    {
        ValidationError {
            message: message.into(),
            field: None,
            code,
            context: context.into(),
        }
    }

    /// Attach the name of the offending field or argument.
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Human-readable description of the problem.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The offending field or argument, if any.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Machine-readable reason.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The operation that raised the error.
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.context, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The main error type for QueryKit operations.
#[derive(Error, Debug)]
pub enum QueryKitError {
    /// An argument failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with QueryKitError.
pub type Result<T> = std::result::Result<T, QueryKitError>;

/// Result type alias used by the validator functions.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

impl QueryKitError {
    /// Create a new validation error.
    pub fn validation<M, C>(code: ErrorCode, message: M, context: C) -> Self
    where
        M: Into<String>,
        C: Into<String>,
    {
        QueryKitError::Validation(ValidationError::new(code, message, context))
    }

    /// Borrow the structured validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            QueryKitError::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// The machine-readable code of a validation error.
    pub fn code(&self) -> Option<ErrorCode> {
        self.as_validation().map(ValidationError::code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ValidationError::new(ErrorCode::FieldNameEmpty, "Field name is empty", "term")
            .with_field("brand");

        assert_eq!(error.code(), ErrorCode::FieldNameEmpty);
        assert_eq!(error.field(), Some("brand"));
        assert_eq!(error.context(), "term");
        assert_eq!(
            error.to_string(),
            "[FIELD_NAME_EMPTY] term: Field name is empty (field: brand)"
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let error = ValidationError::new(ErrorCode::InvalidSize, "bad size", "size");
        let wrapped = QueryKitError::from(error.clone());

        match &wrapped {
            QueryKitError::Validation(inner) => assert_eq!(inner, &error),
            _ => panic!("Expected validation error variant"),
        }
        assert_eq!(wrapped.code(), Some(ErrorCode::InvalidSize));
        assert!(wrapped.to_string().starts_with("Validation error: [INVALID_SIZE]"));
    }

    #[test]
    fn test_json_error_is_not_validation() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = QueryKitError::from(json_error);

        assert!(error.as_validation().is_none());
        assert_eq!(error.code(), None);
    }

    #[test]
    fn test_error_code_serialization() {
        let value = serde_json::to_value(ErrorCode::SizeExceedsLimit).unwrap();
        assert_eq!(value, serde_json::json!("SIZE_EXCEEDS_LIMIT"));
        assert_eq!(ErrorCode::InvalidRangeKeys.to_string(), "INVALID_RANGE_KEYS");
    }
}
