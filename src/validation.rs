//! Argument validation shared by every builder operation.
//!
//! Each function is a pure check that either returns the (possibly parsed)
//! argument or a [`ValidationError`] tagged with the operation named by
//! `context`. Builder methods run all of their checks before touching the
//! document.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{ErrorCode, ValidationError, ValidationResult};
use crate::query::{MultiMatchType, SortOrder};

/// Keys accepted inside a range specification.
pub const RANGE_KEYS: [&str; 5] = ["gte", "gt", "lte", "lt", "boost"];

/// Longest index name the backend accepts, in bytes.
pub const MAX_INDEX_NAME_LENGTH: usize = 255;

lazy_static! {
    static ref INDEX_NAME_PATTERN: Regex = Regex::new(r"^[a-z0-9._-]+$").unwrap();
    static ref DISTANCE_PATTERN: Regex = Regex::new(
        r"^\d+(\.\d+)?\s*(mi|miles|yd|yards|ft|feet|in|inch|km|kilometers|m|meters|cm|centimeters|mm|millimeters|NM|nmi|nauticalmiles)?$"
    )
    .unwrap();
}

/// Check that a field name is non-empty after trimming.
pub fn validate_field_name(field: &str, context: &str) -> ValidationResult<()> {
    if field.trim().is_empty() {
        return Err(ValidationError::new(
            ErrorCode::FieldNameEmpty,
            "Field name must be a non-empty string",
            context,
        )
        .with_field(field));
    }
    Ok(())
}

/// Check a query value: not null, and not blank when it is a string.
///
/// Numbers, booleans, arrays and objects are accepted as they are.
pub fn validate_query_value(value: &Value, field: &str, context: &str) -> ValidationResult<()> {
    match value {
        Value::Null => Err(ValidationError::new(
            ErrorCode::QueryValueMissing,
            "Query value must not be null",
            context,
        )
        .with_field(field)),
        Value::String(s) if s.trim().is_empty() => Err(ValidationError::new(
            ErrorCode::QueryValueEmpty,
            "Query value must not be an empty string",
            context,
        )
        .with_field(field)),
        _ => Ok(()),
    }
}

/// Check a range specification and return its bounds.
///
/// The value must be an object holding at least one of [`RANGE_KEYS`], no other
/// keys, and never both an inclusive and an exclusive bound on the same side.
pub fn validate_range(range: &Value, field: &str, context: &str) -> ValidationResult<Map<String, Value>> {
    let bounds = match range {
        Value::Object(bounds) => bounds,
        _ => {
            return Err(ValidationError::new(
                ErrorCode::InvalidRangeType,
                "Range specification must be an object",
                context,
            )
            .with_field(field));
        }
    };

    let unknown: Vec<&str> = bounds
        .keys()
        .map(String::as_str)
        .filter(|key| !RANGE_KEYS.contains(key))
        .collect();
    if !unknown.is_empty() {
        return Err(ValidationError::new(
            ErrorCode::InvalidRangeKeys,
            format!(
                "Unknown range keys: {}. Allowed keys: {}",
                unknown.join(", "),
                RANGE_KEYS.join(", ")
            ),
            context,
        )
        .with_field(field));
    }

    if bounds.is_empty() {
        return Err(ValidationError::new(
            ErrorCode::EmptyRange,
            format!("Range must contain at least one of: {}", RANGE_KEYS.join(", ")),
            context,
        )
        .with_field(field));
    }

    for (inclusive, exclusive) in [("gte", "gt"), ("lte", "lt")] {
        if bounds.contains_key(inclusive) && bounds.contains_key(exclusive) {
            return Err(ValidationError::new(
                ErrorCode::ConflictingRangeBounds,
                format!("Range cannot contain both '{inclusive}' and '{exclusive}'"),
                context,
            )
            .with_field(field));
        }
    }

    Ok(bounds.clone())
}

/// Check a result offset.
pub fn validate_from(from: i64, context: &str) -> ValidationResult<u64> {
    u64::try_from(from).map_err(|_| {
        ValidationError::new(
            ErrorCode::InvalidFrom,
            format!("'from' must be a non-negative integer, got {from}"),
            context,
        )
        .with_field("from")
    })
}

/// Check a page size against the result window.
pub fn validate_size(size: i64, max: u64, context: &str) -> ValidationResult<u64> {
    let size = u64::try_from(size).map_err(|_| {
        ValidationError::new(
            ErrorCode::InvalidSize,
            format!("'size' must be a non-negative integer, got {size}"),
            context,
        )
        .with_field("size")
    })?;
    if size > max {
        return Err(ValidationError::new(
            ErrorCode::SizeExceedsLimit,
            format!("'size' must not exceed {max}, got {size}"),
            context,
        )
        .with_field("size"));
    }
    Ok(size)
}

/// Parse a sort direction token.
pub fn validate_sort_order(order: &str, context: &str) -> ValidationResult<SortOrder> {
    SortOrder::parse(order).ok_or_else(|| {
        ValidationError::new(
            ErrorCode::InvalidSortOrder,
            format!("Sort order must be 'asc' or 'desc', got '{order}'"),
            context,
        )
        .with_field("order")
    })
}

/// Check a non-empty list of non-blank strings and take ownership of it.
pub fn validate_string_array<S: AsRef<str>>(
    values: &[S],
    argument: &str,
    context: &str,
) -> ValidationResult<Vec<String>> {
    if values.is_empty() {
        return Err(ValidationError::new(
            ErrorCode::EmptyArray,
            format!("'{argument}' must be a non-empty array"),
            context,
        )
        .with_field(argument));
    }
    let mut owned = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let value = value.as_ref();
        if value.trim().is_empty() {
            return Err(ValidationError::new(
                ErrorCode::InvalidArrayElement,
                format!("'{argument}[{i}]' must be a non-empty string"),
                context,
            )
            .with_field(argument));
        }
        owned.push(value.to_string());
    }
    Ok(owned)
}

/// Parse an optional multi-match strategy; `None` keeps the backend default.
pub fn validate_multi_match_type(
    match_type: Option<&str>,
    context: &str,
) -> ValidationResult<Option<MultiMatchType>> {
    match match_type {
        None => Ok(None),
        Some(raw) => MultiMatchType::parse(raw).map(Some).ok_or_else(|| {
            let allowed: Vec<&str> = MultiMatchType::ALL.iter().map(|t| t.as_str()).collect();
            ValidationError::new(
                ErrorCode::InvalidMultiMatchType,
                format!(
                    "Invalid multi_match type '{raw}'. Allowed types: {}",
                    allowed.join(", ")
                ),
                context,
            )
            .with_field("type")
        }),
    }
}

/// Check an aggregation name.
pub fn validate_aggregation_name(name: &str, context: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::new(
            ErrorCode::AggregationNameEmpty,
            "Aggregation name must be a non-empty string",
            context,
        )
        .with_field("name"));
    }
    Ok(())
}

/// Check that an aggregation specification is a JSON object.
pub fn validate_aggregation_spec(spec: &Value, name: &str, context: &str) -> ValidationResult<()> {
    if !spec.is_object() {
        return Err(ValidationError::new(
            ErrorCode::InvalidAggregation,
            format!("Aggregation '{name}' must be an object"),
            context,
        )
        .with_field(name));
    }
    Ok(())
}

/// Check the value list of a terms filter. Elements may be of any type.
pub fn validate_terms_values(values: &[Value], field: &str, context: &str) -> ValidationResult<()> {
    if values.is_empty() {
        return Err(ValidationError::new(
            ErrorCode::EmptyTermsValues,
            "Terms values must be a non-empty array",
            context,
        )
        .with_field(field));
    }
    Ok(())
}

/// Check an index name: lowercase alphanumerics plus `.`, `_` and `-`, not
/// starting with `-`, `_` or `+`, not `.` or `..`, at most 255 bytes.
pub fn validate_index_name(name: &str) -> ValidationResult<()> {
    const CONTEXT: &str = "index";

    if name.len() > MAX_INDEX_NAME_LENGTH {
        return Err(ValidationError::new(
            ErrorCode::IndexNameTooLong,
            format!("Index name must be at most {MAX_INDEX_NAME_LENGTH} bytes"),
            CONTEXT,
        )
        .with_field("index"));
    }

    let invalid = |reason: &str| {
        Err(ValidationError::new(
            ErrorCode::InvalidIndexName,
            format!("Invalid index name '{name}': {reason}"),
            CONTEXT,
        )
        .with_field("index"))
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name == "." || name == ".." {
        return invalid("must not be '.' or '..'");
    }
    if name.starts_with(['-', '_', '+']) {
        return invalid("must not start with '-', '_' or '+'");
    }
    if !INDEX_NAME_PATTERN.is_match(name) {
        return invalid("only lowercase letters, digits, '.', '_' and '-' are allowed");
    }
    Ok(())
}

/// Check a strictly positive integer argument such as a bucket count.
pub fn validate_positive_integer(value: i64, argument: &str, context: &str) -> ValidationResult<u64> {
    if value <= 0 {
        return Err(ValidationError::new(
            ErrorCode::InvalidPositiveInteger,
            format!("'{argument}' must be a positive integer, got {value}"),
            context,
        )
        .with_field(argument));
    }
    Ok(value as u64)
}

/// Check a string argument that must not be blank.
pub fn validate_non_empty_string(value: &str, argument: &str, context: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            ErrorCode::EmptyString,
            format!("'{argument}' must be a non-empty string"),
            context,
        )
        .with_field(argument));
    }
    Ok(())
}

/// Check the length of an array argument of arbitrary element type.
pub fn validate_non_empty<T>(values: &[T], argument: &str, context: &str) -> ValidationResult<()> {
    if values.is_empty() {
        return Err(ValidationError::new(
            ErrorCode::EmptyArray,
            format!("'{argument}' must be a non-empty array"),
            context,
        )
        .with_field(argument));
    }
    Ok(())
}

/// Check a boost or score factor: finite and non-negative.
pub fn validate_boost(boost: f64, context: &str) -> ValidationResult<()> {
    if !boost.is_finite() || boost < 0.0 {
        return Err(ValidationError::new(
            ErrorCode::InvalidBoost,
            format!("Boost must be a finite, non-negative number, got {boost}"),
            context,
        )
        .with_field("boost"));
    }
    Ok(())
}

/// Check that a number has a JSON representation (not NaN or infinite).
pub fn validate_finite_number(value: f64, argument: &str, context: &str) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::new(
            ErrorCode::InvalidNumber,
            format!("'{argument}' must be a finite number, got {value}"),
            context,
        )
        .with_field(argument));
    }
    Ok(())
}

/// Check a latitude/longitude pair.
pub fn validate_geo_point(lat: f64, lon: f64, context: &str) -> ValidationResult<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::new(
            ErrorCode::InvalidGeoPoint,
            format!("Invalid latitude: {lat} (must be between -90 and 90)"),
            context,
        )
        .with_field("lat"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ValidationError::new(
            ErrorCode::InvalidGeoPoint,
            format!("Invalid longitude: {lon} (must be between -180 and 180)"),
            context,
        )
        .with_field("lon"));
    }
    Ok(())
}

/// Check a geo distance such as `"10km"` or `"1.5mi"`. A bare number means meters.
pub fn validate_distance(distance: &str, field: &str, context: &str) -> ValidationResult<()> {
    if !DISTANCE_PATTERN.is_match(distance.trim()) {
        return Err(ValidationError::new(
            ErrorCode::InvalidDistance,
            format!("Invalid distance '{distance}', expected a number with an optional unit"),
            context,
        )
        .with_field(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_field_name() {
        assert!(validate_field_name("title", "match_query").is_ok());

        let err = validate_field_name("   ", "match_query").unwrap_err();
        assert_eq!(err.code(), ErrorCode::FieldNameEmpty);
        assert_eq!(err.context(), "match_query");
        assert!(validate_field_name("", "term").is_err());
    }

    #[test]
    fn test_query_value() {
        assert!(validate_query_value(&json!("laptop"), "title", "match_query").is_ok());
        assert!(validate_query_value(&json!(0), "count", "term").is_ok());
        assert!(validate_query_value(&json!(false), "flag", "term").is_ok());
        assert!(validate_query_value(&json!([]), "tags", "term").is_ok());

        let err = validate_query_value(&Value::Null, "title", "match_query").unwrap_err();
        assert_eq!(err.code(), ErrorCode::QueryValueMissing);
        assert_eq!(err.field(), Some("title"));

        let err = validate_query_value(&json!("  "), "title", "match_query").unwrap_err();
        assert_eq!(err.code(), ErrorCode::QueryValueEmpty);
    }

    #[test]
    fn test_range() {
        let bounds = validate_range(&json!({"gte": 10, "lte": 20}), "price", "range").unwrap();
        assert_eq!(bounds.len(), 2);
        assert!(validate_range(&json!({"boost": 2.0}), "price", "range").is_ok());

        let cases = [
            (json!(null), ErrorCode::InvalidRangeType),
            (json!([1, 2]), ErrorCode::InvalidRangeType),
            (json!({}), ErrorCode::EmptyRange),
            (json!({"gte": 1, "from": 2}), ErrorCode::InvalidRangeKeys),
            (json!({"gte": 10, "gt": 20}), ErrorCode::ConflictingRangeBounds),
            (json!({"lte": 10, "lt": 20}), ErrorCode::ConflictingRangeBounds),
        ];
        for (range, code) in cases {
            let err = validate_range(&range, "price", "range").unwrap_err();
            assert_eq!(err.code(), code, "range {range}");
        }
    }

    #[test]
    fn test_pagination() {
        assert_eq!(validate_from(0, "from").unwrap(), 0);
        assert_eq!(validate_from(-1, "from").unwrap_err().code(), ErrorCode::InvalidFrom);

        assert_eq!(validate_size(0, 10_000, "size").unwrap(), 0);
        assert_eq!(validate_size(10_000, 10_000, "size").unwrap(), 10_000);
        assert_eq!(
            validate_size(10_001, 10_000, "size").unwrap_err().code(),
            ErrorCode::SizeExceedsLimit
        );
        assert_eq!(validate_size(-5, 10_000, "size").unwrap_err().code(), ErrorCode::InvalidSize);
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(validate_sort_order("asc", "sort").unwrap(), SortOrder::Asc);
        assert_eq!(validate_sort_order("desc", "sort").unwrap(), SortOrder::Desc);
        assert!(validate_sort_order("DESC", "sort").is_err());
        assert!(validate_sort_order("ascending", "sort").is_err());
    }

    #[test]
    fn test_string_array() {
        let fields = validate_string_array(&["title", "body"], "fields", "multi_match").unwrap();
        assert_eq!(fields, vec!["title".to_string(), "body".to_string()]);

        let empty: [&str; 0] = [];
        assert_eq!(
            validate_string_array(&empty, "fields", "multi_match").unwrap_err().code(),
            ErrorCode::EmptyArray
        );
        assert_eq!(
            validate_string_array(&["title", " "], "fields", "multi_match")
                .unwrap_err()
                .code(),
            ErrorCode::InvalidArrayElement
        );
    }

    #[test]
    fn test_multi_match_type() {
        assert_eq!(validate_multi_match_type(None, "multi_match").unwrap(), None);
        assert_eq!(
            validate_multi_match_type(Some("cross_fields"), "multi_match").unwrap(),
            Some(MultiMatchType::CrossFields)
        );
        assert_eq!(
            validate_multi_match_type(Some("fuzzy_fields"), "multi_match")
                .unwrap_err()
                .code(),
            ErrorCode::InvalidMultiMatchType
        );
    }

    #[test]
    fn test_aggregation_checks() {
        assert!(validate_aggregation_name("by_brand", "aggregate").is_ok());
        assert_eq!(
            validate_aggregation_name(" ", "aggregate").unwrap_err().code(),
            ErrorCode::AggregationNameEmpty
        );
        assert!(validate_aggregation_spec(&json!({"avg": {"field": "price"}}), "a", "aggregate").is_ok());
        assert_eq!(
            validate_aggregation_spec(&Value::Null, "a", "aggregate").unwrap_err().code(),
            ErrorCode::InvalidAggregation
        );
    }

    #[test]
    fn test_terms_values() {
        assert!(validate_terms_values(&[json!(1), json!("a")], "brand", "terms").is_ok());
        assert_eq!(
            validate_terms_values(&[], "brand", "terms").unwrap_err().code(),
            ErrorCode::EmptyTermsValues
        );
    }

    #[test]
    fn test_index_name() {
        assert!(validate_index_name("products").is_ok());
        assert!(validate_index_name("logs-2024.01.01").is_ok());
        assert!(validate_index_name(".kibana").is_ok());

        for name in ["", ".", "..", "Products", "-logs", "_logs", "+logs", "logs*", "a b"] {
            assert_eq!(
                validate_index_name(name).unwrap_err().code(),
                ErrorCode::InvalidIndexName,
                "index name {name:?}"
            );
        }

        let long = "a".repeat(256);
        assert_eq!(validate_index_name(&long).unwrap_err().code(), ErrorCode::IndexNameTooLong);
        assert!(validate_index_name(&"a".repeat(255)).is_ok());
    }

    #[test]
    fn test_numeric_and_string_arguments() {
        assert_eq!(validate_positive_integer(5, "size", "terms_agg").unwrap(), 5);
        assert!(validate_positive_integer(0, "size", "terms_agg").is_err());
        assert!(validate_non_empty_string("1d", "interval", "date_histogram_agg").is_ok());
        assert!(validate_non_empty_string("", "interval", "date_histogram_agg").is_err());
        assert!(validate_non_empty(&[1], "ranges", "range_agg").is_ok());
        assert!(validate_non_empty::<Value>(&[], "ranges", "range_agg").is_err());
        assert!(validate_boost(1.5, "constant_score").is_ok());
        assert!(validate_boost(-1.0, "constant_score").is_err());
        assert!(validate_boost(f64::NAN, "constant_score").is_err());
    }

    #[test]
    fn test_validate_finite_number() {
        assert!(validate_finite_number(-2.5, "min_score", "min_score").is_ok());

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = validate_finite_number(bad, "min", "price_range").unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidNumber);
            assert_eq!(err.field(), Some("min"));
            assert_eq!(err.context(), "price_range");
        }
    }

    #[test]
    fn test_distance() {
        for distance in ["10km", "1.5mi", "200m", "300", "12 km", "5NM"] {
            assert!(validate_distance(distance, "location", "geo_distance").is_ok(), "{distance}");
        }
        for distance in ["", "km", "ten km", "10 parsecs", "-5km"] {
            assert_eq!(
                validate_distance(distance, "location", "geo_distance").unwrap_err().code(),
                ErrorCode::InvalidDistance,
                "{distance}"
            );
        }
    }
}
