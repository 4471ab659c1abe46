//! Reporting queries: aggregation-only documents over a time window.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::query::QueryBuilder;

/// Single-value and multi-value metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Avg,
    Sum,
    Min,
    Max,
    Cardinality,
    ValueCount,
    Stats,
}

#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    builder: QueryBuilder,
}

super::preset_builder!(AnalyticsQuery);

impl AnalyticsQuery {
    /// Return aggregations only, no hits.
    pub fn aggregations_only(&mut self) -> Result<&mut Self> {
        self.builder.size(0)?;
        Ok(self)
    }

    pub fn date_range(
        &mut self,
        field: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<&mut Self> {
        let window = super::time_window(from, to, field, "date_range")?;
        self.builder.range(field, window)?;
        Ok(self)
    }

    pub fn group_by(&mut self, name: &str, field: &str, size: i64) -> Result<&mut Self> {
        self.builder.terms_agg(name, field, size)?;
        Ok(self)
    }

    pub fn over_time(&mut self, name: &str, field: &str, interval: &str) -> Result<&mut Self> {
        self.builder.date_histogram_agg(name, field, interval)?;
        Ok(self)
    }

    pub fn metric(&mut self, name: &str, metric: Metric, field: &str) -> Result<&mut Self> {
        let builder = &mut self.builder;
        match metric {
            Metric::Avg => builder.avg_agg(name, field)?,
            Metric::Sum => builder.sum_agg(name, field)?,
            Metric::Min => builder.min_agg(name, field)?,
            Metric::Max => builder.max_agg(name, field)?,
            Metric::Cardinality => builder.cardinality_agg(name, field)?,
            Metric::ValueCount => builder.value_count_agg(name, field)?,
            Metric::Stats => builder.stats_agg(name, field)?,
        };
        Ok(self)
    }

    /// Attach a metric under an existing bucket aggregation.
    pub fn metric_per_bucket(
        &mut self,
        bucket: &str,
        name: &str,
        metric: Metric,
        field: &str,
    ) -> Result<&mut Self> {
        let kind = match metric {
            Metric::Avg => "avg",
            Metric::Sum => "sum",
            Metric::Min => "min",
            Metric::Max => "max",
            Metric::Cardinality => "cardinality",
            Metric::ValueCount => "value_count",
            Metric::Stats => "stats",
        };
        self.builder
            .sub_aggregate(bucket, name, serde_json::json!({ kind: { "field": field } }))?;
        Ok(self)
    }
}
