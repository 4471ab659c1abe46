//! Fluent builder for query documents.
//!
//! Every mutating call validates its arguments first, then changes the live
//! document in place and hands the builder back for chaining. [`QueryBuilder::build`]
//! is a read: it returns a cleaned deep copy and leaves the live state alone.
//!
//! # Examples
//!
//! ```
//! use querykit::query::QueryBuilder;
//! use serde_json::json;
//!
//! # fn main() -> querykit::error::Result<()> {
//! let doc = QueryBuilder::new()
//!     .match_query("name", "wireless headphones")?
//!     .range("price", json!({"gte": 50, "lte": 300}))?
//!     .term("in_stock", true)?
//!     .sort("rating", "desc")?
//!     .size(24)?
//!     .build();
//!
//! let filter = doc.to_value()?["query"]["bool"]["filter"].clone();
//! assert_eq!(filter[1], json!({"term": {"in_stock.keyword": true}}));
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::QueryBuilderConfig;
use crate::error::{ErrorCode, Result, ValidationError};
use crate::query::clause::{
    Clause, FuzzyOptions, MatchOperator, MoreLikeThisOptions, QueryStringOptions, Section,
};
use crate::query::document::{
    BoolQuery, Highlight, HighlightOptions, QueryDocument, QueryRoot, SortOptions, SortSpec,
    SourceFilter,
};
use crate::query::geo::GeoPoint;
use crate::validation::{
    validate_boost, validate_distance, validate_field_name, validate_finite_number,
    validate_from, validate_multi_match_type, validate_non_empty, validate_non_empty_string,
    validate_query_value, validate_range, validate_size, validate_sort_order,
    validate_string_array, validate_terms_values,
};

/// Optional parameters of a `function_score` rewrap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionScoreOptions {
    /// How function scores combine (`multiply`, `sum`, `avg`, `first`, `max`, `min`).
    pub score_mode: Option<String>,
    /// How the combined function score merges with the query score.
    pub boost_mode: Option<String>,
    pub max_boost: Option<f64>,
    pub min_score: Option<f64>,
    pub boost: Option<f64>,
}

impl FunctionScoreOptions {
    pub fn with_score_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.score_mode = Some(mode.into());
        self
    }

    pub fn with_boost_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.boost_mode = Some(mode.into());
        self
    }

    pub fn with_max_boost(mut self, max_boost: f64) -> Self {
        self.max_boost = Some(max_boost);
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// Outcome of [`QueryBuilder::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// A fluent, validating builder for a [`QueryDocument`].
///
/// Cloning yields an independent builder: the document is deep-copied and no
/// state is shared with the original.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) document: QueryDocument,
    pub(crate) config: QueryBuilderConfig,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Create a builder holding an empty bool query.
    pub fn new() -> Self {
        Self::with_config(QueryBuilderConfig::default())
    }

    /// Create a builder with an explicit configuration.
    pub fn with_config(config: QueryBuilderConfig) -> Self {
        QueryBuilder {
            document: QueryDocument::new(),
            config,
        }
    }

    pub fn config(&self) -> &QueryBuilderConfig {
        &self.config
    }

    /// The live, un-normalized document.
    pub fn document(&self) -> &QueryDocument {
        &self.document
    }

    /// Install the bool wrapper and its four sections if any are missing.
    ///
    /// Only the `bool` key of the current query is inspected. After a
    /// `function_score` or `constant_score` rewrap this installs a new bool
    /// wrapper next to the wrapper key instead of reaching inside it.
    pub fn ensure_bool_query(&mut self) -> &mut Self {
        self.bool_mut();
        self
    }

    fn bool_mut(&mut self) -> &mut BoolQuery {
        self.document
            .query
            .get_or_insert_with(QueryRoot::default)
            .ensure_bool()
    }

    fn push(&mut self, section: Section, clause: Clause) -> &mut Self {
        self.bool_mut().section_mut(section).push(clause);
        self
    }

    /// Snapshot of the live bool sections, without the finalizer's pruning.
    ///
    /// Absent sections stay `None`; installed but empty ones are `Some(vec![])`.
    pub fn raw_sections(&self) -> BoolQuery {
        self.document.bool_query().cloned().unwrap_or_default()
    }

    fn into_raw_sections(mut self) -> BoolQuery {
        self.document
            .query
            .as_mut()
            .and_then(QueryRoot::bool_query_mut)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn sub_builder(&self) -> QueryBuilder {
        QueryBuilder::with_config(self.config.clone())
    }

    fn run_sub<F>(&self, build: F) -> Result<QueryBuilder>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        let mut sub = self.sub_builder();
        build(&mut sub)?;
        Ok(sub)
    }

    /// Run a callback on a throwaway builder and collect its `must` and
    /// `filter` clauses, in that order.
    fn sub_clauses<F>(&self, build: F) -> Result<Vec<Clause>>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        let mut sections = self.run_sub(build)?.into_raw_sections();
        let mut clauses = sections.take_section(Section::Must);
        clauses.extend(sections.take_section(Section::Filter));
        Ok(clauses)
    }

    /// Run a callback on a throwaway builder and return its finalized query.
    fn sub_query<F>(&self, build: F) -> Result<QueryRoot>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        let sub = self.run_sub(build)?;
        Ok(sub
            .document
            .query
            .map(QueryRoot::finalized)
            .unwrap_or_else(QueryRoot::match_all))
    }

    /// Take the current query, finalized, for embedding in a wrapper.
    fn take_query_for_wrap(&mut self) -> Value {
        self.document
            .query
            .take()
            .map(QueryRoot::finalized)
            .unwrap_or_else(QueryRoot::match_all)
            .to_value()
    }

    // Full-text clauses, appended to `must`.

    /// Analyzed text match: `{match: {field: {query}}}`.
    pub fn match_query<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<&mut Self> {
        self.add_match("match_query", field, value.into(), None)
    }

    /// Analyzed text match with an explicit operator.
    pub fn match_query_with<V: Into<Value>>(
        &mut self,
        field: &str,
        value: V,
        operator: MatchOperator,
    ) -> Result<&mut Self> {
        self.add_match("match_query_with", field, value.into(), Some(operator))
    }

    fn add_match(
        &mut self,
        context: &str,
        field: &str,
        query: Value,
        operator: Option<MatchOperator>,
    ) -> Result<&mut Self> {
        validate_field_name(field, context)?;
        validate_query_value(&query, field, context)?;
        Ok(self.push(
            Section::Must,
            Clause::Match {
                field: field.to_string(),
                query,
                operator,
            },
        ))
    }

    pub fn match_phrase<V: Into<Value>>(
        &mut self,
        field: &str,
        value: V,
        slop: Option<u32>,
    ) -> Result<&mut Self> {
        const CONTEXT: &str = "match_phrase";
        let query = value.into();
        validate_field_name(field, CONTEXT)?;
        validate_query_value(&query, field, CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::MatchPhrase {
                field: field.to_string(),
                query,
                slop,
            },
        ))
    }

    /// Match across several fields. `match_type` must be a backend strategy
    /// such as `"best_fields"`; `None` keeps the backend default.
    pub fn multi_match<S, V>(
        &mut self,
        fields: &[S],
        value: V,
        match_type: Option<&str>,
    ) -> Result<&mut Self>
    where
        S: AsRef<str>,
        V: Into<Value>,
    {
        const CONTEXT: &str = "multi_match";
        let query = value.into();
        let fields = validate_string_array(fields, "fields", CONTEXT)?;
        validate_query_value(&query, "query", CONTEXT)?;
        let match_type = validate_multi_match_type(match_type, CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::MultiMatch {
                fields,
                query,
                match_type,
            },
        ))
    }

    pub fn wildcard<V: Into<Value>>(&mut self, field: &str, pattern: V) -> Result<&mut Self> {
        const CONTEXT: &str = "wildcard";
        let value = pattern.into();
        validate_field_name(field, CONTEXT)?;
        validate_query_value(&value, field, CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::Wildcard {
                field: field.to_string(),
                value,
            },
        ))
    }

    pub fn prefix<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<&mut Self> {
        const CONTEXT: &str = "prefix";
        let value = value.into();
        validate_field_name(field, CONTEXT)?;
        validate_query_value(&value, field, CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::Prefix {
                field: field.to_string(),
                value,
            },
        ))
    }

    pub fn fuzzy<V: Into<Value>>(
        &mut self,
        field: &str,
        value: V,
        options: FuzzyOptions,
    ) -> Result<&mut Self> {
        const CONTEXT: &str = "fuzzy";
        let value = value.into();
        validate_field_name(field, CONTEXT)?;
        validate_query_value(&value, field, CONTEXT)?;
        if let Some(boost) = options.boost {
            validate_boost(boost, CONTEXT)?;
        }
        Ok(self.push(
            Section::Must,
            Clause::Fuzzy {
                field: field.to_string(),
                value,
                options,
            },
        ))
    }

    pub fn regexp<V: Into<Value>>(&mut self, field: &str, pattern: V) -> Result<&mut Self> {
        const CONTEXT: &str = "regexp";
        let value = pattern.into();
        validate_field_name(field, CONTEXT)?;
        validate_query_value(&value, field, CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::Regexp {
                field: field.to_string(),
                value,
            },
        ))
    }

    /// Lucene-syntax query string.
    pub fn query_string<V: Into<Value>>(
        &mut self,
        query: V,
        options: QueryStringOptions,
    ) -> Result<&mut Self> {
        const CONTEXT: &str = "query_string";
        let query = query.into();
        validate_query_value(&query, "query", CONTEXT)?;
        if let Some(field) = &options.default_field {
            validate_field_name(field, CONTEXT)?;
        }
        if let Some(fields) = &options.fields {
            validate_string_array(fields, "fields", CONTEXT)?;
        }
        Ok(self.push(Section::Must, Clause::QueryString { query, options }))
    }

    /// Simple query string over the backend's default fields.
    pub fn simple_query_string<V: Into<Value>>(&mut self, query: V) -> Result<&mut Self> {
        let query = query.into();
        validate_query_value(&query, "query", "simple_query_string")?;
        Ok(self.push(Section::Must, Clause::SimpleQueryString { query, fields: None }))
    }

    /// Simple query string restricted to the given fields.
    pub fn simple_query_string_in<S, V>(&mut self, query: V, fields: &[S]) -> Result<&mut Self>
    where
        S: AsRef<str>,
        V: Into<Value>,
    {
        const CONTEXT: &str = "simple_query_string_in";
        let query = query.into();
        validate_query_value(&query, "query", CONTEXT)?;
        let fields = validate_string_array(fields, "fields", CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::SimpleQueryString {
                query,
                fields: Some(fields),
            },
        ))
    }

    pub fn script<V: Into<Value>>(
        &mut self,
        source: V,
        params: Option<Map<String, Value>>,
    ) -> Result<&mut Self> {
        let source = source.into();
        validate_query_value(&source, "source", "script")?;
        Ok(self.push(Section::Must, Clause::Script { source, params }))
    }

    /// Documents similar to `like` (text, documents, or a list of either).
    pub fn more_like_this<S, V>(
        &mut self,
        fields: &[S],
        like: V,
        options: MoreLikeThisOptions,
    ) -> Result<&mut Self>
    where
        S: AsRef<str>,
        V: Into<Value>,
    {
        const CONTEXT: &str = "more_like_this";
        let like = like.into();
        let fields = validate_string_array(fields, "fields", CONTEXT)?;
        validate_query_value(&like, "like", CONTEXT)?;
        Ok(self.push(
            Section::Must,
            Clause::MoreLikeThis {
                fields,
                like,
                options,
            },
        ))
    }

    // Term-level clauses, appended to `filter`.

    /// Exact match. A field not already ending in the keyword suffix gets it
    /// appended, so `term("status", ..)` targets `status.keyword`.
    pub fn term<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<&mut Self> {
        const CONTEXT: &str = "term";
        let value = value.into();
        validate_field_name(field, CONTEXT)?;
        validate_query_value(&value, field, CONTEXT)?;
        let field = self.config.keyword_field(field);
        Ok(self.push(Section::Filter, Clause::Term { field, value }))
    }

    /// Match any of several exact values. The field name is used as given.
    pub fn terms<I, V>(&mut self, field: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        const CONTEXT: &str = "terms";
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        validate_field_name(field, CONTEXT)?;
        validate_terms_values(&values, field, CONTEXT)?;
        Ok(self.push(
            Section::Filter,
            Clause::Terms {
                field: field.to_string(),
                values,
            },
        ))
    }

    /// Range filter, e.g. `json!({"gte": 10, "lt": 20})`.
    pub fn range(&mut self, field: &str, spec: Value) -> Result<&mut Self> {
        const CONTEXT: &str = "range";
        validate_field_name(field, CONTEXT)?;
        let bounds = validate_range(&spec, field, CONTEXT)?;
        Ok(self.push(
            Section::Filter,
            Clause::Range {
                field: field.to_string(),
                bounds,
            },
        ))
    }

    pub fn exists(&mut self, field: &str) -> Result<&mut Self> {
        validate_field_name(field, "exists")?;
        Ok(self.push(
            Section::Filter,
            Clause::Exists {
                field: field.to_string(),
            },
        ))
    }

    pub fn geo_distance(&mut self, field: &str, point: GeoPoint, distance: &str) -> Result<&mut Self> {
        const CONTEXT: &str = "geo_distance";
        validate_field_name(field, CONTEXT)?;
        point.validate(CONTEXT)?;
        validate_distance(distance, field, CONTEXT)?;
        Ok(self.push(
            Section::Filter,
            Clause::GeoDistance {
                field: field.to_string(),
                point,
                distance: distance.trim().to_string(),
            },
        ))
    }

    pub fn geo_bounding_box(
        &mut self,
        field: &str,
        top_left: GeoPoint,
        bottom_right: GeoPoint,
    ) -> Result<&mut Self> {
        const CONTEXT: &str = "geo_bounding_box";
        validate_field_name(field, CONTEXT)?;
        top_left.validate(CONTEXT)?;
        bottom_right.validate(CONTEXT)?;
        if top_left.lat < bottom_right.lat {
            return Err(ValidationError::new(
                ErrorCode::InvalidGeoPoint,
                "top_left must not lie south of bottom_right",
                CONTEXT,
            )
            .with_field(field)
            .into());
        }
        Ok(self.push(
            Section::Filter,
            Clause::GeoBoundingBox {
                field: field.to_string(),
                top_left,
                bottom_right,
            },
        ))
    }

    pub fn geo_polygon(&mut self, field: &str, points: Vec<GeoPoint>) -> Result<&mut Self> {
        const CONTEXT: &str = "geo_polygon";
        validate_field_name(field, CONTEXT)?;
        if points.len() < 3 {
            return Err(ValidationError::new(
                ErrorCode::InvalidPolygon,
                format!("A polygon needs at least 3 points, got {}", points.len()),
                CONTEXT,
            )
            .with_field(field)
            .into());
        }
        for point in &points {
            point.validate(CONTEXT)?;
        }
        Ok(self.push(
            Section::Filter,
            Clause::GeoPolygon {
                field: field.to_string(),
                points,
            },
        ))
    }

    // Scoped sub-queries.

    /// Build clauses on a throwaway builder and append its `must` and
    /// `filter` clauses, flattened, to this builder's `should`.
    ///
    /// The callback's own `should` and `must_not` clauses are not carried over.
    pub fn should<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        let clauses = self.sub_clauses(build)?;
        tracing::trace!(count = clauses.len(), "merging sub-builder clauses into should");
        self.bool_mut().section_mut(Section::Should).extend(clauses);
        Ok(self)
    }

    /// Like [`should`](Self::should), targeting `must_not`.
    pub fn must_not<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        let clauses = self.sub_clauses(build)?;
        tracing::trace!(count = clauses.len(), "merging sub-builder clauses into must_not");
        self.bool_mut().section_mut(Section::MustNot).extend(clauses);
        Ok(self)
    }

    /// Set `minimum_should_match` on the bool wrapper.
    pub fn minimum_should_match(&mut self, minimum: u32) -> &mut Self {
        self.bool_mut().minimum_should_match = Some(json!(minimum));
        self
    }

    /// Query nested objects under `path` with the sub-builder's whole query.
    pub fn nested<F>(&mut self, path: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        validate_field_name(path, "nested")?;
        let query = self.sub_query(build)?;
        tracing::trace!(path = %path, "embedding nested query");
        Ok(self.push(
            Section::Must,
            Clause::Nested {
                path: path.to_string(),
                query: Box::new(query),
            },
        ))
    }

    /// Parent documents whose children of `child_type` match the sub-query.
    pub fn has_child<F>(&mut self, child_type: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        validate_non_empty_string(child_type, "type", "has_child")?;
        let query = self.sub_query(build)?;
        tracing::trace!(child_type = %child_type, "embedding has_child query");
        Ok(self.push(
            Section::Must,
            Clause::HasChild {
                child_type: child_type.to_string(),
                query: Box::new(query),
            },
        ))
    }

    /// Child documents whose parent of `parent_type` matches the sub-query.
    pub fn has_parent<F>(&mut self, parent_type: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> Result<&mut QueryBuilder>,
    {
        validate_non_empty_string(parent_type, "parent_type", "has_parent")?;
        let query = self.sub_query(build)?;
        tracing::trace!(parent_type = %parent_type, "embedding has_parent query");
        Ok(self.push(
            Section::Must,
            Clause::HasParent {
                parent_type: parent_type.to_string(),
                query: Box::new(query),
            },
        ))
    }

    // Whole-query operations.

    /// Wrap the entire current query in a `function_score`.
    ///
    /// The wrapped query is finalized at wrap time. Clauses added afterwards
    /// land in a new bool wrapper beside `function_score`, not inside it.
    pub fn function_score(
        &mut self,
        functions: Vec<Value>,
        options: FunctionScoreOptions,
    ) -> Result<&mut Self> {
        const CONTEXT: &str = "function_score";
        if let Some(i) = functions.iter().position(|f| !f.is_object()) {
            return Err(ValidationError::new(
                ErrorCode::InvalidArrayElement,
                format!("'functions[{i}]' must be an object"),
                CONTEXT,
            )
            .with_field("functions")
            .into());
        }
        for factor in [options.max_boost, options.boost].into_iter().flatten() {
            validate_boost(factor, CONTEXT)?;
        }
        if let Some(min_score) = options.min_score {
            validate_finite_number(min_score, "min_score", CONTEXT)?;
        }

        let mut body = Map::new();
        body.insert("query".to_string(), self.take_query_for_wrap());
        body.insert("functions".to_string(), Value::Array(functions));
        if let Some(mode) = options.score_mode {
            body.insert("score_mode".to_string(), json!(mode));
        }
        if let Some(mode) = options.boost_mode {
            body.insert("boost_mode".to_string(), json!(mode));
        }
        if let Some(max_boost) = options.max_boost {
            body.insert("max_boost".to_string(), json!(max_boost));
        }
        if let Some(min_score) = options.min_score {
            body.insert("min_score".to_string(), json!(min_score));
        }
        if let Some(boost) = options.boost {
            body.insert("boost".to_string(), json!(boost));
        }
        self.document.query = Some(QueryRoot::named(CONTEXT, Value::Object(body)));
        Ok(self)
    }

    /// Wrap the entire current query as the filter of a `constant_score`.
    pub fn constant_score(&mut self, boost: f64) -> Result<&mut Self> {
        const CONTEXT: &str = "constant_score";
        validate_boost(boost, CONTEXT)?;
        let filter = self.take_query_for_wrap();
        self.document.query = Some(QueryRoot::named(
            CONTEXT,
            json!({ "filter": filter, "boost": boost }),
        ));
        Ok(self)
    }

    /// Append a pre-built clause to `must`, unchecked.
    pub fn raw(&mut self, clause: Value) -> &mut Self {
        self.raw_in(Section::Must, clause)
    }

    /// Append a pre-built clause to the given section, unchecked.
    pub fn raw_in(&mut self, section: Section, clause: Value) -> &mut Self {
        self.push(section, Clause::Raw(clause))
    }

    /// Replace the whole query, bypassing the bool structure.
    ///
    /// Keys other than `bool` are kept verbatim. A `bool` body is adopted so
    /// later clause calls append to it: a section holding a single clause
    /// object is read as a one-clause list, and other section values are kept
    /// as given until a clause is appended to that section.
    pub fn set_query(&mut self, query: Value) -> Result<&mut Self> {
        self.document.query = Some(QueryRoot::from_value(query)?);
        Ok(self)
    }

    /// Replace the whole query with the match-everything marker.
    pub fn match_all(&mut self) -> &mut Self {
        self.document.query = Some(QueryRoot::match_all());
        self
    }

    /// Restore the just-constructed state. The configuration is kept.
    pub fn reset(&mut self) -> &mut Self {
        self.document = QueryDocument::new();
        self
    }

    // Paging, sorting and response shaping.

    pub fn from(&mut self, from: i64) -> Result<&mut Self> {
        self.document.from = Some(validate_from(from, "from")?);
        Ok(self)
    }

    /// Number of hits to return; `0` returns aggregations only.
    pub fn size(&mut self, size: i64) -> Result<&mut Self> {
        self.document.size = Some(validate_size(size, self.config.max_result_window, "size")?);
        Ok(self)
    }

    /// Append `{field: order}` where `order` is `"asc"` or `"desc"`.
    pub fn sort(&mut self, field: &str, order: &str) -> Result<&mut Self> {
        validate_field_name(field, "sort")?;
        let order = validate_sort_order(order, "sort")?;
        self.push_sort(SortSpec::Field {
            field: field.to_string(),
            order,
        });
        Ok(self)
    }

    /// Append `{field: {order, mode, missing, unmapped_type}}`.
    pub fn sort_with(&mut self, field: &str, options: SortOptions) -> Result<&mut Self> {
        const CONTEXT: &str = "sort_with";
        validate_field_name(field, CONTEXT)?;
        if let Some(mode) = &options.mode {
            validate_non_empty_string(mode, "mode", CONTEXT)?;
        }
        self.push_sort(SortSpec::Detailed {
            field: field.to_string(),
            options,
        });
        Ok(self)
    }

    fn push_sort(&mut self, spec: SortSpec) {
        self.document.sort.get_or_insert_with(Vec::new).push(spec);
    }

    /// Return only the listed fields of each hit.
    pub fn source<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<&mut Self> {
        let fields = validate_string_array(fields, "fields", "source")?;
        self.document.source = Some(SourceFilter::Fields(fields));
        Ok(self)
    }

    /// Return all (`true`) or none (`false`) of each hit's source.
    pub fn source_enabled(&mut self, enabled: bool) -> &mut Self {
        self.document.source = Some(SourceFilter::Enabled(enabled));
        self
    }

    /// Highlight the given fields, in order, replacing any earlier highlight.
    pub fn highlight<S: AsRef<str>>(
        &mut self,
        fields: &[S],
        options: HighlightOptions,
    ) -> Result<&mut Self> {
        let fields = validate_string_array(fields, "fields", "highlight")?;
        self.document.highlight = Some(Highlight {
            fields: fields.into_iter().map(|f| (f, json!({}))).collect(),
            options,
        });
        Ok(self)
    }

    /// Highlight one field with its own options, e.g.
    /// `json!({"number_of_fragments": 0})`. Appends to the current highlight,
    /// or starts one with default top-level options. A field named twice
    /// keeps its position and takes the new options.
    pub fn highlight_field(&mut self, field: &str, options: Value) -> Result<&mut Self> {
        const CONTEXT: &str = "highlight_field";
        validate_field_name(field, CONTEXT)?;
        if !options.is_object() {
            return Err(ValidationError::new(
                ErrorCode::InvalidArrayElement,
                format!("Highlight options for '{field}' must be an object"),
                CONTEXT,
            )
            .with_field(field)
            .into());
        }
        self.document
            .highlight
            .get_or_insert_with(Highlight::default)
            .fields
            .insert(field.to_string(), options);
        Ok(self)
    }

    pub fn track_total_hits(&mut self, track: bool) -> &mut Self {
        self.document.track_total_hits = Some(track);
        self
    }

    /// Drop hits scoring below `min_score`. Any finite score is accepted.
    pub fn min_score(&mut self, min_score: f64) -> Result<&mut Self> {
        validate_finite_number(min_score, "min_score", "min_score")?;
        self.document.min_score = Some(min_score);
        Ok(self)
    }

    /// Continue after the sort values of the last hit of the previous page.
    pub fn search_after<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        validate_non_empty(&values, "search_after", "search_after")?;
        self.document.search_after = Some(values);
        Ok(self)
    }

    // Finalization.

    /// The cleaned document to send. Does not modify the builder.
    pub fn build(&self) -> QueryDocument {
        let built = self.document.finalized();
        tracing::debug!(
            clauses = built.bool_query().map_or(0, BoolQuery::clause_count),
            match_all = built.query.as_ref().is_some_and(QueryRoot::is_match_all),
            aggregations = built.aggregations.as_ref().map_or(0, Map::len),
            "built query document"
        );
        built
    }

    /// The finalized document as a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(self.build().to_value()?)
    }

    /// The finalized document as JSON text.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let built = self.build();
        let json = if pretty {
            serde_json::to_string_pretty(&built)?
        } else {
            serde_json::to_string(&built)?
        };
        Ok(json)
    }

    /// Check the finalized document without failing; all problems are listed.
    pub fn validate(&self) -> ValidationReport {
        let built = self.build();
        let max = self.config.max_result_window;
        let mut errors = Vec::new();

        if built.query.is_none() {
            errors.push("Query is missing".to_string());
        }
        if let Some(size) = built.size {
            if size > max {
                errors.push(format!("Size {size} exceeds the limit of {max}"));
            }
        }
        if let (Some(from), Some(size)) = (built.from, built.size) {
            if from.saturating_add(size) > max {
                errors.push(format!(
                    "from + size ({}) exceeds the result window of {max}",
                    from.saturating_add(size)
                ));
            }
        }

        let report = ValidationReport {
            valid: errors.is_empty(),
            errors,
        };
        if !report.valid {
            tracing::warn!(errors = ?report.errors, "query document failed validation");
        }
        report
    }

    /// Advisory cost estimate: 1 + bool clauses + 2 per aggregation + sort entries.
    pub fn complexity(&self) -> usize {
        let clauses = self
            .document
            .bool_query()
            .map_or(0, BoolQuery::clause_count);
        let aggregations = self.document.aggregations.as_ref().map_or(0, Map::len);
        let sorts = self.document.sort.as_ref().map_or(0, Vec::len);
        1 + clauses + 2 * aggregations + sorts
    }
}
