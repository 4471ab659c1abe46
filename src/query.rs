//! Query construction: the document model, the clause types and the builder.

pub mod aggregation;
pub mod builder;
pub mod clause;
pub mod document;
pub mod geo;

pub use builder::{FunctionScoreOptions, QueryBuilder, ValidationReport};
pub use clause::{
    Clause, FuzzyOptions, MatchOperator, MoreLikeThisOptions, MultiMatchType, QueryStringOptions,
    Section,
};
pub use document::{
    BoolQuery, Highlight, HighlightOptions, MATCH_ALL, QueryDocument, QueryRoot, SortOptions,
    SortOrder, SortSpec, SourceFilter,
};
pub use geo::GeoPoint;
