//! The query document: the tree assembled by [`QueryBuilder`](crate::query::QueryBuilder).
//!
//! The live document keeps vestigial structure (empty bool sections, an empty
//! sort list) so that composer operations can append without re-checking.
//! [`QueryDocument::finalized`] produces the cleaned copy that is actually sent.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::error::{ErrorCode, ValidationError, ValidationResult};
use crate::query::clause::{Clause, Section};

/// Key of the match-everything marker.
pub const MATCH_ALL: &str = "match_all";

/// The four-section logical container.
///
/// A section is `None` when absent and `Some(vec![])` when installed but empty;
/// only the finalizer tells the two apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Option<Vec<Clause>>,
    pub filter: Option<Vec<Clause>>,
    pub should: Option<Vec<Clause>>,
    pub must_not: Option<Vec<Clause>>,
    /// Integer when set through the builder; any value when adopted via `set_query`.
    pub minimum_should_match: Option<Value>,
    /// Other bool parameters (`boost`, `_name`, ...) carried over from raw input.
    pub extra: Map<String, Value>,
}

impl BoolQuery {
    /// A bool query with all four sections installed and empty.
    pub fn with_empty_sections() -> Self {
        BoolQuery {
            must: Some(Vec::new()),
            filter: Some(Vec::new()),
            should: Some(Vec::new()),
            must_not: Some(Vec::new()),
            ..Default::default()
        }
    }

    fn slot(&self, section: Section) -> &Option<Vec<Clause>> {
        match section {
            Section::Must => &self.must,
            Section::Filter => &self.filter,
            Section::Should => &self.should,
            Section::MustNot => &self.must_not,
        }
    }

    fn slot_mut(&mut self, section: Section) -> &mut Option<Vec<Clause>> {
        match section {
            Section::Must => &mut self.must,
            Section::Filter => &mut self.filter,
            Section::Should => &mut self.should,
            Section::MustNot => &mut self.must_not,
        }
    }

    /// The clauses of a section, if it is installed.
    pub fn section(&self, section: Section) -> Option<&[Clause]> {
        self.slot(section).as_deref()
    }

    /// The clauses of a section, installing it when absent.
    ///
    /// A verbatim value adopted under the section's key becomes its first clause.
    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Clause> {
        if self.slot(section).is_none() {
            if let Some(value) = self.extra.shift_remove(section.as_str()) {
                *self.slot_mut(section) = Some(vec![Clause::Raw(value)]);
            }
        }
        self.slot_mut(section).get_or_insert_with(Vec::new)
    }

    /// Install every missing section as an empty list.
    pub fn ensure_sections(&mut self) {
        for section in Section::ALL {
            self.section_mut(section);
        }
    }

    /// Take a section's clauses, leaving it absent.
    pub fn take_section(&mut self, section: Section) -> Vec<Clause> {
        self.slot_mut(section).take().unwrap_or_default()
    }

    /// Total number of clauses across the four sections.
    pub fn clause_count(&self) -> usize {
        Section::ALL
            .iter()
            .map(|s| self.section(*s).map_or(0, <[Clause]>::len))
            .sum()
    }

    /// Drop every installed section that has no clauses.
    pub fn prune_empty_sections(&mut self) {
        for section in Section::ALL {
            let slot = self.slot_mut(section);
            if slot.as_ref().is_some_and(Vec::is_empty) {
                *slot = None;
            }
        }
    }

    /// True when no key at all would be rendered.
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.slot(*s).is_none())
            && self.minimum_should_match.is_none()
            && self.extra.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let mut obj = self.extra.clone();
        for section in Section::ALL {
            if let Some(clauses) = self.section(section) {
                let clauses: Vec<Value> = clauses.iter().map(Clause::to_value).collect();
                obj.insert(section.as_str().to_string(), Value::Array(clauses));
            }
        }
        if let Some(msm) = &self.minimum_should_match {
            obj.insert("minimum_should_match".to_string(), msm.clone());
        }
        Value::Object(obj)
    }

    /// Adopt a raw `bool` body.
    ///
    /// A section holding a list is taken clause by clause, and a section holding
    /// a single clause object becomes a one-clause list. Any other section value
    /// is kept verbatim until a clause is appended to that section.
    pub fn from_value(value: Value) -> ValidationResult<Self> {
        let Value::Object(obj) = value else {
            return Err(invalid_query("'bool' must be an object"));
        };

        let mut bool_query = BoolQuery::default();
        for (key, value) in obj {
            match (Section::parse(&key, "set_query"), value) {
                (Ok(section), Value::Array(items)) => {
                    *bool_query.slot_mut(section) =
                        Some(items.into_iter().map(Clause::Raw).collect());
                }
                (Ok(section), value @ Value::Object(_)) => {
                    *bool_query.slot_mut(section) = Some(vec![Clause::Raw(value)]);
                }
                (Err(_), value) if key == "minimum_should_match" => {
                    bool_query.minimum_should_match = Some(value);
                }
                (_, value) => {
                    bool_query.extra.insert(key, value);
                }
            }
        }
        Ok(bool_query)
    }
}

/// The value of the document's `query` key.
///
/// Holds the typed bool wrapper under `bool` and any other named top-level
/// queries (`match_all`, `function_score`, ...) next to it. Both can coexist:
/// appending clauses after a `function_score` rewrap installs a fresh `bool`
/// beside the wrapper rather than inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRoot {
    bool_query: Option<BoolQuery>,
    named: Map<String, Value>,
}

impl QueryRoot {
    /// A root holding an empty bool wrapper with all sections installed.
    pub fn bool_wrapper() -> Self {
        QueryRoot {
            bool_query: Some(BoolQuery::with_empty_sections()),
            named: Map::new(),
        }
    }

    /// The match-everything marker, `{"match_all": {}}`.
    pub fn match_all() -> Self {
        Self::named(MATCH_ALL, json!({}))
    }

    /// A root holding one named query.
    pub fn named<S: Into<String>>(kind: S, body: Value) -> Self {
        let mut named = Map::new();
        named.insert(kind.into(), body);
        QueryRoot {
            bool_query: None,
            named,
        }
    }

    /// Adopt a raw query object.
    pub fn from_value(value: Value) -> ValidationResult<Self> {
        let Value::Object(mut named) = value else {
            return Err(invalid_query("Query must be a JSON object"));
        };
        let bool_query = match named.shift_remove("bool") {
            Some(body) => Some(BoolQuery::from_value(body)?),
            None => None,
        };
        Ok(QueryRoot { bool_query, named })
    }

    pub fn bool_query(&self) -> Option<&BoolQuery> {
        self.bool_query.as_ref()
    }

    pub fn bool_query_mut(&mut self) -> Option<&mut BoolQuery> {
        self.bool_query.as_mut()
    }

    /// Install the bool wrapper and its sections if missing. Only the `bool`
    /// key is inspected; other keys are left alone.
    pub fn ensure_bool(&mut self) -> &mut BoolQuery {
        let bool_query = self.bool_query.get_or_insert_with(BoolQuery::default);
        bool_query.ensure_sections();
        bool_query
    }

    /// A named top-level query other than `bool`.
    pub fn get(&self, kind: &str) -> Option<&Value> {
        self.named.get(kind)
    }

    pub fn is_match_all(&self) -> bool {
        self.bool_query.is_none() && self.named.len() == 1 && self.named.contains_key(MATCH_ALL)
    }

    /// Apply the finalizer's rule: prune empty sections, and replace the whole
    /// root with `match_all` if the bool wrapper is left with no keys.
    pub fn finalized(mut self) -> Self {
        if let Some(bool_query) = self.bool_query.as_mut() {
            bool_query.prune_empty_sections();
            if bool_query.is_empty() {
                return QueryRoot::match_all();
            }
        }
        self
    }

    pub fn to_value(&self) -> Value {
        let mut obj = self.named.clone();
        if let Some(bool_query) = &self.bool_query {
            obj.insert("bool".to_string(), bool_query.to_value());
        }
        Value::Object(obj)
    }
}

fn invalid_query<S: Into<String>>(message: S) -> ValidationError {
    ValidationError::new(ErrorCode::InvalidQueryObject, message, "set_query").with_field("query")
}

impl Serialize for QueryRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        QueryRoot::from_value(value).map_err(D::Error::custom)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parse the exact lowercase token.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// The fuller sort form: `{field: {order, mode, missing, unmapped_type}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOptions {
    pub order: SortOrder,
    /// How multi-valued fields are reduced (`min`, `max`, `avg`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Placement of documents without the field (`_first`, `_last` or a value).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmapped_type: Option<String>,
}

impl SortOptions {
    pub fn new(order: SortOrder) -> Self {
        SortOptions {
            order,
            mode: None,
            missing: None,
            unmapped_type: None,
        }
    }

    pub fn with_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_missing<V: Into<Value>>(mut self, missing: V) -> Self {
        self.missing = Some(missing.into());
        self
    }

    pub fn with_unmapped_type<S: Into<String>>(mut self, unmapped_type: S) -> Self {
        self.unmapped_type = Some(unmapped_type.into());
        self
    }
}

/// One entry of the document's sort list.
#[derive(Debug, Clone, PartialEq)]
pub enum SortSpec {
    /// `{field: "asc"|"desc"}`
    Field { field: String, order: SortOrder },
    /// `{field: {order, ...}}`
    Detailed { field: String, options: SortOptions },
    /// A sort entry adopted from raw input.
    Raw(Value),
}

impl SortSpec {
    pub fn to_value(&self) -> Value {
        let mut obj = Map::with_capacity(1);
        match self {
            SortSpec::Field { field, order } => {
                obj.insert(field.clone(), json!(order.as_str()));
            }
            SortSpec::Detailed { field, options } => {
                obj.insert(field.clone(), json!(options));
            }
            SortSpec::Raw(value) => return value.clone(),
        }
        Value::Object(obj)
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SortSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(SortSpec::Raw)
    }
}

/// Field projection: all-or-nothing, or an explicit field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceFilter {
    Enabled(bool),
    Fields(Vec<String>),
}

/// Optional highlighting parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_fragments: Option<u32>,
}

impl HighlightOptions {
    pub fn with_tags<S: Into<String>>(mut self, pre: S, post: S) -> Self {
        self.pre_tags = Some(vec![pre.into()]);
        self.post_tags = Some(vec![post.into()]);
        self
    }

    pub fn with_fragment_size(mut self, size: u32) -> Self {
        self.fragment_size = Some(size);
        self
    }

    pub fn with_number_of_fragments(mut self, count: u32) -> Self {
        self.number_of_fragments = Some(count);
        self
    }
}

/// Fields to highlight, in request order, each with its per-field options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub fields: Map<String, Value>,
    #[serde(flatten)]
    pub options: HighlightOptions,
}

/// The search request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryRoot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortSpec>>,
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Vec<Value>>,
}

impl QueryDocument {
    /// The state of a freshly constructed builder: an empty bool wrapper.
    pub fn new() -> Self {
        QueryDocument {
            query: Some(QueryRoot::bool_wrapper()),
            ..Default::default()
        }
    }

    /// Deep copy with empty bool sections and an empty sort list removed.
    pub fn finalized(&self) -> QueryDocument {
        let mut cleaned = self.clone();
        cleaned.query = cleaned.query.map(QueryRoot::finalized);
        if cleaned.sort.as_ref().is_some_and(Vec::is_empty) {
            cleaned.sort = None;
        }
        cleaned
    }

    /// The top-level bool wrapper, if any.
    pub fn bool_query(&self) -> Option<&BoolQuery> {
        self.query.as_ref().and_then(QueryRoot::bool_query)
    }

    /// Render as a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
