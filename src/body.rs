//! Conversion of builders and documents into request bodies.
//!
//! A transport layer accepts anything implementing [`SearchBody`]: a builder is
//! finalized on the way out, an already-built document or a raw JSON value is
//! passed through as is.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::query::{QueryBuilder, QueryDocument};

/// Something that can be sent as the body of a search or count request.
pub trait SearchBody {
    /// The full search body.
    fn into_search_body(self) -> Result<Value>;

    /// The body of a count request: only the `query` key is kept.
    fn into_count_body(self) -> Result<Value>
    where
        Self: Sized,
    {
        Ok(count_body(self.into_search_body()?))
    }
}

fn count_body(body: Value) -> Value {
    let mut count = Map::new();
    if let Value::Object(mut obj) = body {
        if let Some(query) = obj.remove("query") {
            count.insert("query".to_string(), query);
        }
    }
    Value::Object(count)
}

impl SearchBody for &QueryBuilder {
    fn into_search_body(self) -> Result<Value> {
        self.to_value()
    }
}

impl SearchBody for QueryBuilder {
    fn into_search_body(self) -> Result<Value> {
        (&self).into_search_body()
    }
}

impl SearchBody for QueryDocument {
    fn into_search_body(self) -> Result<Value> {
        Ok(self.to_value()?)
    }
}

impl SearchBody for Value {
    fn into_search_body(self) -> Result<Value> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QueryBuilder {
        let mut builder = QueryBuilder::new();
        builder
            .match_query("title", "rust")
            .unwrap()
            .size(5)
            .unwrap()
            .avg_agg("avg_len", "length")
            .unwrap();
        builder
    }

    #[test]
    fn test_builder_is_finalized() {
        let builder = sample();
        let body = (&builder).into_search_body().unwrap();
        assert_eq!(body, builder.to_value().unwrap());
        assert!(body["query"]["bool"].get("filter").is_none());

        let owned = builder.clone().into_search_body().unwrap();
        assert_eq!(owned, body);
    }

    #[test]
    fn test_built_document_and_raw_value_pass_through() {
        let builder = sample();
        let doc = builder.build();
        let from_doc = doc.into_search_body().unwrap();
        assert_eq!(from_doc, builder.to_value().unwrap());

        let raw = json!({"query": {"ids": {"values": ["1"]}}, "size": 1});
        assert_eq!(raw.clone().into_search_body().unwrap(), raw);
    }

    #[test]
    fn test_count_body_keeps_only_query() {
        let body = sample().into_count_body().unwrap();
        assert_eq!(
            body,
            json!({"query": {"bool": {"must": [{"match": {"title": {"query": "rust"}}}]}}})
        );

        assert_eq!(json!({"size": 3}).into_count_body().unwrap(), json!({}));
    }
}
