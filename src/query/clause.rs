//! Query clauses: one variant per clause kind the builder constructs.
//!
//! Every clause renders as a JSON object with exactly one top-level key naming
//! its kind. [`Clause::Raw`] carries arbitrary pre-built clauses untouched.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::error::{ErrorCode, ValidationError, ValidationResult};
use crate::query::document::QueryRoot;
use crate::query::geo::GeoPoint;

/// Operator combining the terms of an analyzed text match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// All terms must match.
    And,
    /// Any term may match.
    Or,
}

impl MatchOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperator::And => "and",
            MatchOperator::Or => "or",
        }
    }
}

/// Strategies accepted by `multi_match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatchType {
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
    PhrasePrefix,
    BoolPrefix,
}

impl MultiMatchType {
    pub const ALL: [MultiMatchType; 6] = [
        MultiMatchType::BestFields,
        MultiMatchType::MostFields,
        MultiMatchType::CrossFields,
        MultiMatchType::Phrase,
        MultiMatchType::PhrasePrefix,
        MultiMatchType::BoolPrefix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MultiMatchType::BestFields => "best_fields",
            MultiMatchType::MostFields => "most_fields",
            MultiMatchType::CrossFields => "cross_fields",
            MultiMatchType::Phrase => "phrase",
            MultiMatchType::PhrasePrefix => "phrase_prefix",
            MultiMatchType::BoolPrefix => "bool_prefix",
        }
    }

    /// Parse the backend token, e.g. `"best_fields"`.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

/// The four sections of a bool query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    /// Conjunctive, scoring.
    #[default]
    Must,
    /// Conjunctive, non-scoring.
    Filter,
    /// Disjunctive, scoring.
    Should,
    /// Negated, non-scoring.
    MustNot,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Must, Section::Filter, Section::Should, Section::MustNot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Must => "must",
            Section::Filter => "filter",
            Section::Should => "should",
            Section::MustNot => "must_not",
        }
    }

    /// Parse a section key such as `"must_not"`. `context` names the calling operation.
    pub fn parse(raw: &str, context: &str) -> ValidationResult<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == raw)
            .ok_or_else(|| {
                ValidationError::new(
                    ErrorCode::InvalidSection,
                    format!("Unknown bool section '{raw}'"),
                    context,
                )
                .with_field("section")
            })
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional parameters of a fuzzy clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuzzyOptions {
    /// Edit distance, e.g. `"AUTO"` or `2`.
    pub fuzziness: Option<Value>,
    pub boost: Option<f64>,
}

impl FuzzyOptions {
    pub fn with_fuzziness<V: Into<Value>>(mut self, fuzziness: V) -> Self {
        self.fuzziness = Some(fuzziness.into());
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// Optional parameters of a `query_string` clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStringOptions {
    pub default_field: Option<String>,
    pub fields: Option<Vec<String>>,
    pub default_operator: Option<MatchOperator>,
}

impl QueryStringOptions {
    pub fn with_default_field<S: Into<String>>(mut self, field: S) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default_operator(mut self, operator: MatchOperator) -> Self {
        self.default_operator = Some(operator);
        self
    }
}

/// Optional parameters of a `more_like_this` clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoreLikeThisOptions {
    pub min_term_freq: Option<u32>,
    pub max_query_terms: Option<u32>,
    pub min_doc_freq: Option<u32>,
}

/// A single query condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match {
        field: String,
        query: Value,
        operator: Option<MatchOperator>,
    },
    MatchPhrase {
        field: String,
        query: Value,
        slop: Option<u32>,
    },
    MultiMatch {
        fields: Vec<String>,
        query: Value,
        match_type: Option<MultiMatchType>,
    },
    Term {
        field: String,
        value: Value,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    Range {
        field: String,
        bounds: Map<String, Value>,
    },
    Exists {
        field: String,
    },
    Wildcard {
        field: String,
        value: Value,
    },
    Prefix {
        field: String,
        value: Value,
    },
    Fuzzy {
        field: String,
        value: Value,
        options: FuzzyOptions,
    },
    Regexp {
        field: String,
        value: Value,
    },
    QueryString {
        query: Value,
        options: QueryStringOptions,
    },
    SimpleQueryString {
        query: Value,
        fields: Option<Vec<String>>,
    },
    GeoDistance {
        field: String,
        point: GeoPoint,
        distance: String,
    },
    GeoBoundingBox {
        field: String,
        top_left: GeoPoint,
        bottom_right: GeoPoint,
    },
    GeoPolygon {
        field: String,
        points: Vec<GeoPoint>,
    },
    Nested {
        path: String,
        query: Box<QueryRoot>,
    },
    HasChild {
        child_type: String,
        query: Box<QueryRoot>,
    },
    HasParent {
        parent_type: String,
        query: Box<QueryRoot>,
    },
    Script {
        source: Value,
        params: Option<Map<String, Value>>,
    },
    MoreLikeThis {
        fields: Vec<String>,
        like: Value,
        options: MoreLikeThisOptions,
    },
    /// A pre-built clause, passed through as is.
    Raw(Value),
}

impl Clause {
    /// The clause kind, i.e. its single top-level key.
    pub fn kind(&self) -> &str {
        match self {
            Clause::Match { .. } => "match",
            Clause::MatchPhrase { .. } => "match_phrase",
            Clause::MultiMatch { .. } => "multi_match",
            Clause::Term { .. } => "term",
            Clause::Terms { .. } => "terms",
            Clause::Range { .. } => "range",
            Clause::Exists { .. } => "exists",
            Clause::Wildcard { .. } => "wildcard",
            Clause::Prefix { .. } => "prefix",
            Clause::Fuzzy { .. } => "fuzzy",
            Clause::Regexp { .. } => "regexp",
            Clause::QueryString { .. } => "query_string",
            Clause::SimpleQueryString { .. } => "simple_query_string",
            Clause::GeoDistance { .. } => "geo_distance",
            Clause::GeoBoundingBox { .. } => "geo_bounding_box",
            Clause::GeoPolygon { .. } => "geo_polygon",
            Clause::Nested { .. } => "nested",
            Clause::HasChild { .. } => "has_child",
            Clause::HasParent { .. } => "has_parent",
            Clause::Script { .. } => "script",
            Clause::MoreLikeThis { .. } => "more_like_this",
            Clause::Raw(value) => value
                .as_object()
                .and_then(|obj| obj.keys().next())
                .map(String::as_str)
                .unwrap_or("raw"),
        }
    }

    /// Render the clause as a JSON object.
    pub fn to_value(&self) -> Value {
        let body = match self {
            Clause::Match {
                field,
                query,
                operator,
            } => {
                let mut inner = Map::new();
                inner.insert("query".to_string(), query.clone());
                if let Some(op) = operator {
                    inner.insert("operator".to_string(), json!(op.as_str()));
                }
                single(field, Value::Object(inner))
            }
            Clause::MatchPhrase { field, query, slop } => {
                let mut inner = Map::new();
                inner.insert("query".to_string(), query.clone());
                if let Some(slop) = slop {
                    inner.insert("slop".to_string(), json!(slop));
                }
                single(field, Value::Object(inner))
            }
            Clause::MultiMatch {
                fields,
                query,
                match_type,
            } => {
                let mut inner = Map::new();
                inner.insert("query".to_string(), query.clone());
                inner.insert("fields".to_string(), json!(fields));
                if let Some(t) = match_type {
                    inner.insert("type".to_string(), json!(t.as_str()));
                }
                Value::Object(inner)
            }
            Clause::Term { field, value } => single(field, value.clone()),
            Clause::Terms { field, values } => single(field, Value::Array(values.clone())),
            Clause::Range { field, bounds } => single(field, Value::Object(bounds.clone())),
            Clause::Exists { field } => json!({ "field": field }),
            Clause::Wildcard { field, value }
            | Clause::Prefix { field, value }
            | Clause::Regexp { field, value } => single(field, json!({ "value": value })),
            Clause::Fuzzy {
                field,
                value,
                options,
            } => {
                let mut inner = Map::new();
                inner.insert("value".to_string(), value.clone());
                if let Some(fuzziness) = &options.fuzziness {
                    inner.insert("fuzziness".to_string(), fuzziness.clone());
                }
                if let Some(boost) = options.boost {
                    inner.insert("boost".to_string(), json!(boost));
                }
                single(field, Value::Object(inner))
            }
            Clause::QueryString { query, options } => {
                let mut inner = Map::new();
                inner.insert("query".to_string(), query.clone());
                if let Some(field) = &options.default_field {
                    inner.insert("default_field".to_string(), json!(field));
                }
                if let Some(fields) = &options.fields {
                    inner.insert("fields".to_string(), json!(fields));
                }
                if let Some(op) = options.default_operator {
                    inner.insert("default_operator".to_string(), json!(op.as_str()));
                }
                Value::Object(inner)
            }
            Clause::SimpleQueryString { query, fields } => {
                let mut inner = Map::new();
                inner.insert("query".to_string(), query.clone());
                if let Some(fields) = fields {
                    inner.insert("fields".to_string(), json!(fields));
                }
                Value::Object(inner)
            }
            Clause::GeoDistance {
                field,
                point,
                distance,
            } => {
                let mut inner = Map::new();
                inner.insert("distance".to_string(), json!(distance));
                inner.insert(field.clone(), point.to_value());
                Value::Object(inner)
            }
            Clause::GeoBoundingBox {
                field,
                top_left,
                bottom_right,
            } => single(
                field,
                json!({
                    "top_left": top_left.to_value(),
                    "bottom_right": bottom_right.to_value(),
                }),
            ),
            Clause::GeoPolygon { field, points } => {
                let points: Vec<Value> = points.iter().map(GeoPoint::to_value).collect();
                single(field, json!({ "points": points }))
            }
            Clause::Nested { path, query } => json!({ "path": path, "query": query.to_value() }),
            Clause::HasChild { child_type, query } => {
                json!({ "type": child_type, "query": query.to_value() })
            }
            Clause::HasParent { parent_type, query } => {
                json!({ "parent_type": parent_type, "query": query.to_value() })
            }
            Clause::Script { source, params } => {
                let mut script = Map::new();
                script.insert("source".to_string(), source.clone());
                if let Some(params) = params {
                    script.insert("params".to_string(), Value::Object(params.clone()));
                }
                json!({ "script": script })
            }
            Clause::MoreLikeThis {
                fields,
                like,
                options,
            } => {
                let mut inner = Map::new();
                inner.insert("fields".to_string(), json!(fields));
                inner.insert("like".to_string(), like.clone());
                if let Some(v) = options.min_term_freq {
                    inner.insert("min_term_freq".to_string(), json!(v));
                }
                if let Some(v) = options.max_query_terms {
                    inner.insert("max_query_terms".to_string(), json!(v));
                }
                if let Some(v) = options.min_doc_freq {
                    inner.insert("min_doc_freq".to_string(), json!(v));
                }
                Value::Object(inner)
            }
            Clause::Raw(value) => return value.clone(),
        };

        single(self.kind(), body)
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut obj = Map::with_capacity(1);
    obj.insert(key.to_string(), value);
    Value::Object(obj)
}

impl From<Value> for Clause {
    fn from(value: Value) -> Self {
        Clause::Raw(value)
    }
}

impl Serialize for Clause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Clause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Clause::Raw)
    }
}
