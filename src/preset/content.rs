//! Article and page search.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::error::Result;
use crate::query::{FunctionScoreOptions, HighlightOptions, QueryBuilder};

const SEARCH_FIELDS: [&str; 3] = ["title^3", "summary^2", "body"];

#[derive(Debug, Clone)]
pub struct ContentQuery {
    builder: QueryBuilder,
}

super::preset_builder!(ContentQuery);

impl ContentQuery {
    /// Free-text search over title, summary and body.
    pub fn search<V: Into<Value>>(&mut self, text: V) -> Result<&mut Self> {
        self.builder
            .multi_match(&SEARCH_FIELDS, text, Some("best_fields"))?;
        Ok(self)
    }

    pub fn phrase<V: Into<Value>>(&mut self, text: V) -> Result<&mut Self> {
        self.builder.match_phrase("body", text, None)?;
        Ok(self)
    }

    pub fn author(&mut self, author: &str) -> Result<&mut Self> {
        self.builder.term("author", author)?;
        Ok(self)
    }

    pub fn tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<&mut Self> {
        let tags: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
        self.builder.terms("tags", tags)?;
        Ok(self)
    }

    pub fn published_between(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<&mut Self> {
        let window = super::time_window(from, to, "published_at", "published_between")?;
        self.builder.range("published_at", window)?;
        Ok(self)
    }

    pub fn exclude_drafts(&mut self) -> Result<&mut Self> {
        self.builder.must_not(|q| q.term("status", "draft"))?;
        Ok(self)
    }

    pub fn highlight_matches(&mut self) -> Result<&mut Self> {
        self.builder.highlight(
            &["title", "body"],
            HighlightOptions::default()
                .with_tags("<mark>", "</mark>")
                .with_fragment_size(150)
                .with_number_of_fragments(3),
        )?;
        Ok(self)
    }

    /// Decay scores of older content around `origin` with the given half-life
    /// scale (e.g. `"30d"`). Wraps the whole query, so call it last.
    pub fn boost_recent(&mut self, origin: DateTime<Utc>, scale: &str) -> Result<&mut Self> {
        crate::validation::validate_non_empty_string(scale, "scale", "boost_recent")?;
        self.builder.function_score(
            vec![json!({
                "gauss": {
                    "published_at": {
                        "origin": super::rfc3339(origin),
                        "scale": scale,
                        "decay": 0.5
                    }
                }
            })],
            FunctionScoreOptions::default().with_boost_mode("multiply"),
        )?;
        Ok(self)
    }
}
