//! # QueryKit
//!
//! A fluent, validating builder for search-engine query DSL documents.
//!
//! ## Features
//!
//! - Bool queries with `must`, `filter`, `should` and `must_not` sections
//! - Full-text, term-level, geo, joining and scoring clauses
//! - Bucket and metric aggregations
//! - Eager argument validation with machine-readable error codes
//! - A finalizer that prunes empty structure before sending
//! - Domain presets for e-commerce, logs, analytics and content search
//!
//! ```
//! use querykit::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> querykit::error::Result<()> {
//! let mut builder = QueryBuilder::new();
//! builder
//!     .match_query("title", "rust")?
//!     .should(|q| q.term("tags", "tutorial")?.term("tags", "guide"))?
//!     .minimum_should_match(1)
//!     .terms_agg("by_author", "author", 10)?;
//!
//! let body = builder.into_search_body()?;
//! assert_eq!(body["query"]["bool"]["minimum_should_match"], json!(1));
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod preset;
pub mod query;
pub mod validation;

pub mod prelude {
    pub use crate::body::SearchBody;
    pub use crate::config::QueryBuilderConfig;
    pub use crate::error::{ErrorCode, QueryKitError, Result, ValidationError};
    pub use crate::query::{
        Clause, FunctionScoreOptions, FuzzyOptions, GeoPoint, HighlightOptions, MatchOperator,
        MoreLikeThisOptions, QueryBuilder, QueryDocument, QueryStringOptions, Section,
        SortOptions, SortOrder,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
