//! Log search over `@timestamp`, `level`, `service` and `message`.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::query::QueryBuilder;

pub const TIMESTAMP_FIELD: &str = "@timestamp";

#[derive(Debug, Clone)]
pub struct LogsQuery {
    builder: QueryBuilder,
}

super::preset_builder!(LogsQuery);

impl LogsQuery {
    /// Entries between `from` and `to`, inclusive.
    pub fn time_range(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<&mut Self> {
        let window = super::time_window(from, to, TIMESTAMP_FIELD, "time_range")?;
        self.builder.range(TIMESTAMP_FIELD, window)?;
        Ok(self)
    }

    /// Entries from the trailing `window` up to now.
    pub fn last(&mut self, window: Duration) -> Result<&mut Self> {
        let now = Utc::now();
        self.time_range(now - window, now)
    }

    pub fn level(&mut self, level: &str) -> Result<&mut Self> {
        self.builder.term("level", level)?;
        Ok(self)
    }

    pub fn levels<S: AsRef<str>>(&mut self, levels: &[S]) -> Result<&mut Self> {
        let levels: Vec<&str> = levels.iter().map(AsRef::as_ref).collect();
        self.builder.terms("level", levels)?;
        Ok(self)
    }

    /// `error` and `fatal` entries.
    pub fn errors_only(&mut self) -> Result<&mut Self> {
        self.levels(&["error", "fatal"])
    }

    pub fn service(&mut self, service: &str) -> Result<&mut Self> {
        self.builder.term("service", service)?;
        Ok(self)
    }

    pub fn message_contains(&mut self, text: &str) -> Result<&mut Self> {
        self.builder.match_query("message", text)?;
        Ok(self)
    }

    pub fn exclude_service(&mut self, service: &str) -> Result<&mut Self> {
        self.builder.must_not(|q| q.term("service", service))?;
        Ok(self)
    }

    pub fn newest_first(&mut self) -> Result<&mut Self> {
        self.builder.sort(TIMESTAMP_FIELD, "desc")?;
        Ok(self)
    }

    /// Entry counts over time plus a per-level breakdown.
    pub fn with_timeline(&mut self, interval: &str) -> Result<&mut Self> {
        self.builder
            .date_histogram_agg("timeline", TIMESTAMP_FIELD, interval)?
            .terms_agg("levels", "level", 10)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_error_search() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

        let mut query = LogsQuery::new();
        query
            .time_range(from, to)
            .unwrap()
            .errors_only()
            .unwrap()
            .service("checkout")
            .unwrap()
            .exclude_service("healthcheck")
            .unwrap()
            .newest_first()
            .unwrap();

        let value = query.to_value().unwrap();
        let bool_query = &value["query"]["bool"];
        assert_eq!(
            bool_query["filter"],
            json!([
                {"range": {"@timestamp": {
                    "gte": "2024-03-01T00:00:00.000Z",
                    "lte": "2024-03-02T00:00:00.000Z"
                }}},
                {"terms": {"level": ["error", "fatal"]}},
                {"term": {"service.keyword": "checkout"}}
            ])
        );
        assert_eq!(
            bool_query["must_not"],
            json!([{"term": {"service.keyword": "healthcheck"}}])
        );
        assert_eq!(value["sort"], json!([{"@timestamp": "desc"}]));
    }

    #[test]
    fn test_last_window() {
        let mut query = LogsQuery::new();
        query.last(Duration::minutes(15)).unwrap();

        let bounds = query.to_value().unwrap()["query"]["bool"]["filter"][0]["range"]
            ["@timestamp"]
            .clone();
        assert!(bounds["gte"].is_string());
        assert!(bounds["lte"].is_string());
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let from = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let mut query = LogsQuery::new();
        assert!(query.time_range(from, to).is_err());
        assert_eq!(query.complexity(), 1);
    }

    #[test]
    fn test_timeline() {
        let mut query = LogsQuery::new();
        query.message_contains("timeout").unwrap().with_timeline("1h").unwrap();

        let aggs = query.to_value().unwrap()["aggregations"].clone();
        assert_eq!(
            aggs["timeline"],
            json!({"date_histogram": {"field": "@timestamp", "calendar_interval": "1h"}})
        );
        assert_eq!(aggs["levels"]["terms"]["field"], json!("level"));
    }
}
