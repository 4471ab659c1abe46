//! Aggregation composer.
//!
//! Every helper is a thin constructor over [`QueryBuilder::aggregate`], which
//! owns the name check and the write into the document's aggregation map.

use serde_json::{Map, Value, json};

use crate::error::{ErrorCode, Result, ValidationError};
use crate::query::builder::QueryBuilder;
use crate::validation::{
    validate_aggregation_name, validate_aggregation_spec, validate_field_name,
    validate_non_empty, validate_non_empty_string, validate_positive_integer,
};

/// Interval units accepted by `calendar_interval`, in both long and short form.
const CALENDAR_UNITS: [&str; 16] = [
    "minute", "1m", "hour", "1h", "day", "1d", "week", "1w", "month", "1M", "quarter", "1q",
    "year", "1y", "second", "1s",
];

impl QueryBuilder {
    /// Attach a named aggregation. A second call with the same name replaces
    /// the first.
    pub fn aggregate(&mut self, name: &str, spec: Value) -> Result<&mut Self> {
        const CONTEXT: &str = "aggregate";
        validate_aggregation_name(name, CONTEXT)?;
        validate_aggregation_spec(&spec, name, CONTEXT)?;
        Ok(self.insert_aggregation(name, spec))
    }

    fn insert_aggregation(&mut self, name: &str, spec: Value) -> &mut Self {
        self.document
            .aggregations
            .get_or_insert_with(Map::new)
            .insert(name.to_string(), spec);
        self
    }

    /// One aggregation body of the form `{kind: {field}}`.
    fn field_aggregation(&mut self, context: &str, name: &str, kind: &str, field: &str) -> Result<&mut Self> {
        validate_aggregation_name(name, context)?;
        validate_field_name(field, context)?;
        Ok(self.insert_aggregation(name, json!({ kind: { "field": field } })))
    }

    /// Bucket per distinct value, top `size` buckets.
    pub fn terms_agg(&mut self, name: &str, field: &str, size: i64) -> Result<&mut Self> {
        const CONTEXT: &str = "terms_agg";
        validate_aggregation_name(name, CONTEXT)?;
        validate_field_name(field, CONTEXT)?;
        let size = validate_positive_integer(size, "size", CONTEXT)?;
        self.aggregate(name, json!({ "terms": { "field": field, "size": size } }))
    }

    /// Time buckets. A single calendar unit (`"day"`, `"1M"`, ...) becomes a
    /// `calendar_interval`; anything else (`"90m"`, `"12h"`) a `fixed_interval`.
    pub fn date_histogram_agg(&mut self, name: &str, field: &str, interval: &str) -> Result<&mut Self> {
        const CONTEXT: &str = "date_histogram_agg";
        validate_aggregation_name(name, CONTEXT)?;
        validate_field_name(field, CONTEXT)?;
        validate_non_empty_string(interval, "interval", CONTEXT)?;

        let interval = interval.trim();
        let key = if CALENDAR_UNITS.contains(&interval) {
            "calendar_interval"
        } else {
            "fixed_interval"
        };
        self.aggregate(name, json!({ "date_histogram": { "field": field, key: interval } }))
    }

    pub fn histogram_agg(&mut self, name: &str, field: &str, interval: i64) -> Result<&mut Self> {
        const CONTEXT: &str = "histogram_agg";
        validate_aggregation_name(name, CONTEXT)?;
        validate_field_name(field, CONTEXT)?;
        let interval = validate_positive_integer(interval, "interval", CONTEXT)?;
        self.aggregate(name, json!({ "histogram": { "field": field, "interval": interval } }))
    }

    /// Buckets over explicit ranges, e.g. `json!({"to": 50})`.
    pub fn range_agg(&mut self, name: &str, field: &str, ranges: Vec<Value>) -> Result<&mut Self> {
        const CONTEXT: &str = "range_agg";
        validate_aggregation_name(name, CONTEXT)?;
        validate_field_name(field, CONTEXT)?;
        validate_non_empty(&ranges, "ranges", CONTEXT)?;
        self.aggregate(name, json!({ "range": { "field": field, "ranges": ranges } }))
    }

    /// One bucket per named filter clause.
    pub fn filters_agg(&mut self, name: &str, filters: Map<String, Value>) -> Result<&mut Self> {
        const CONTEXT: &str = "filters_agg";
        validate_aggregation_name(name, CONTEXT)?;
        if filters.is_empty() {
            return Err(ValidationError::new(
                ErrorCode::EmptyArray,
                "'filters' must contain at least one filter",
                CONTEXT,
            )
            .with_field("filters")
            .into());
        }
        self.aggregate(name, json!({ "filters": { "filters": filters } }))
    }

    /// Aggregate over nested objects under `path`, with the given child aggregations.
    pub fn nested_agg(&mut self, name: &str, path: &str, aggs: Map<String, Value>) -> Result<&mut Self> {
        const CONTEXT: &str = "nested_agg";
        validate_aggregation_name(name, CONTEXT)?;
        validate_field_name(path, CONTEXT)?;
        self.aggregate(name, json!({ "nested": { "path": path }, "aggs": aggs }))
    }

    pub fn avg_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("avg_agg", name, "avg", field)
    }

    pub fn sum_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("sum_agg", name, "sum", field)
    }

    pub fn min_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("min_agg", name, "min", field)
    }

    pub fn max_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("max_agg", name, "max", field)
    }

    /// Approximate distinct count.
    pub fn cardinality_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("cardinality_agg", name, "cardinality", field)
    }

    pub fn value_count_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("value_count_agg", name, "value_count", field)
    }

    /// min, max, avg, sum and count in one aggregation.
    pub fn stats_agg(&mut self, name: &str, field: &str) -> Result<&mut Self> {
        self.field_aggregation("stats_agg", name, "stats", field)
    }

    /// Percentiles of a numeric field; `None` keeps the backend's default set.
    pub fn percentiles_agg(&mut self, name: &str, field: &str, percents: Option<Vec<f64>>) -> Result<&mut Self> {
        const CONTEXT: &str = "percentiles_agg";
        validate_aggregation_name(name, CONTEXT)?;
        validate_field_name(field, CONTEXT)?;

        let mut body = Map::new();
        body.insert("field".to_string(), json!(field));
        if let Some(percents) = percents {
            validate_non_empty(&percents, "percents", CONTEXT)?;
            if let Some(bad) = percents.iter().find(|p| !(0.0..=100.0).contains(*p)) {
                return Err(ValidationError::new(
                    ErrorCode::InvalidArrayElement,
                    format!("Percentile {bad} is outside 0..=100"),
                    CONTEXT,
                )
                .with_field("percents")
                .into());
            }
            body.insert("percents".to_string(), json!(percents));
        }
        self.aggregate(name, json!({ "percentiles": body }))
    }

    /// Attach `name` as a child of the existing aggregation `parent`.
    pub fn sub_aggregate(&mut self, parent: &str, name: &str, spec: Value) -> Result<&mut Self> {
        const CONTEXT: &str = "sub_aggregate";
        validate_aggregation_name(parent, CONTEXT)?;
        validate_aggregation_name(name, CONTEXT)?;
        validate_aggregation_spec(&spec, name, CONTEXT)?;

        let parent_spec = self
            .document
            .aggregations
            .as_mut()
            .and_then(|aggs| aggs.get_mut(parent))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                ValidationError::new(
                    ErrorCode::AggregationNotFound,
                    format!("No aggregation named '{parent}'"),
                    CONTEXT,
                )
                .with_field(parent)
            })?;

        let children = parent_spec
            .entry("aggs")
            .or_insert_with(|| Value::Object(Map::new()));
        if !children.is_object() {
            *children = Value::Object(Map::new());
        }
        if let Value::Object(children) = children {
            children.insert(name.to_string(), spec);
        }
        Ok(self)
    }
}
