//! Integration tests for QueryBuilder documents.

use querykit::prelude::*;
use serde_json::{Value, json};

fn bool_section(doc: &Value, section: &str) -> Option<Value> {
    doc["query"]["bool"].get(section).cloned()
}

#[test]
fn test_product_search_scenario() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder
        .match_query("name", "wireless headphones")?
        .range("price", json!({"gte": 50, "lte": 300}))?
        .terms("brand", ["sony", "bose"])?
        .term("in_stock", true)?
        .sort("rating", "desc")?
        .size(24)?
        .from(0)?;

    let doc = builder.to_value()?;
    assert_eq!(
        doc,
        json!({
            "from": 0,
            "size": 24,
            "query": {"bool": {
                "must": [{"match": {"name": {"query": "wireless headphones"}}}],
                "filter": [
                    {"range": {"price": {"gte": 50, "lte": 300}}},
                    {"terms": {"brand": ["sony", "bose"]}},
                    {"term": {"in_stock.keyword": true}}
                ]
            }},
            "sort": [{"rating": "desc"}]
        })
    );
    Ok(())
}

#[test]
fn test_empty_builder_scenario() -> Result<()> {
    let doc = QueryBuilder::new().to_value()?;
    assert_eq!(doc, json!({"query": {"match_all": {}}}));
    assert!(doc.get("from").is_none());
    assert!(doc.get("size").is_none());
    assert!(doc.get("sort").is_none());
    Ok(())
}

#[test]
fn test_should_with_minimum_scenario() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder
        .should(|q| q.term("a", 1)?.term("b", 2))?
        .minimum_should_match(1);

    let doc = builder.to_value()?;
    assert_eq!(bool_section(&doc, "should").map(|s| s.as_array().map(Vec::len)), Some(Some(2)));
    assert_eq!(bool_section(&doc, "minimum_should_match"), Some(json!(1)));
    assert!(bool_section(&doc, "must").is_none());
    assert!(bool_section(&doc, "filter").is_none());
    assert!(bool_section(&doc, "must_not").is_none());
    Ok(())
}

#[test]
fn test_match_clause_shape() -> Result<()> {
    for (field, value) in [("title", json!("rust")), ("year", json!(2024)), ("flag", json!(true))] {
        let mut builder = QueryBuilder::new();
        builder.match_query(field, value.clone())?;
        let must = bool_section(&builder.to_value()?, "must");
        assert_eq!(must, Some(json!([{"match": {field: {"query": value}}}])));
    }
    Ok(())
}

#[test]
fn test_keyword_suffix_not_duplicated() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.term("sku", "A-1")?.term("sku.keyword", "A-2")?;

    let filter = bool_section(&builder.to_value()?, "filter");
    assert_eq!(
        filter,
        Some(json!([
            {"term": {"sku.keyword": "A-1"}},
            {"term": {"sku.keyword": "A-2"}}
        ]))
    );
    Ok(())
}

#[test]
fn test_range_bounds() -> Result<()> {
    let mut builder = QueryBuilder::new();
    let err = builder.range("price", json!({"gte": 10, "gt": 20})).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ConflictingRangeBounds));

    let err = builder.range("price", json!({"from": 10})).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidRangeKeys));

    let err = builder.range("price", json!({})).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::EmptyRange));

    builder.range("price", json!({"gte": 10, "lte": 20}))?;
    assert_eq!(builder.complexity(), 2);
    Ok(())
}

#[test]
fn test_size_and_from_limits() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.size(0)?;
    assert_eq!(builder.build().size, Some(0));

    builder.size(10_000)?;
    let err = builder.size(10_001).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::SizeExceedsLimit));
    assert_eq!(builder.build().size, Some(10_000));

    let err = builder.from(-1).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidFrom));
    Ok(())
}

#[test]
fn test_configured_result_window() -> Result<()> {
    let config = QueryBuilderConfig::default().with_max_result_window(100);
    let mut builder = QueryBuilder::with_config(config);
    builder.size(100)?;
    assert!(builder.size(101).is_err());

    // Sub-builders share the parent's configuration.
    let config = QueryBuilderConfig::default().with_keyword_suffix(".exact");
    let mut builder = QueryBuilder::with_config(config);
    builder.should(|q| q.term("color", "red"))?;
    assert_eq!(
        bool_section(&builder.to_value()?, "should"),
        Some(json!([{"term": {"color.exact": "red"}}]))
    );
    Ok(())
}

#[test]
fn test_clone_independence() -> Result<()> {
    let mut original = QueryBuilder::new();
    original
        .match_query("title", "rust")?
        .terms_agg("tags", "tags", 5)?
        .sort("date", "desc")?;
    let snapshot = original.to_value()?;

    let mut copy = original.clone();
    copy.term("lang", "en")?
        .sub_aggregate("tags", "avg_len", json!({"avg": {"field": "length"}}))?
        .sort("score", "asc")?
        .reset();

    assert_eq!(original.to_value()?, snapshot);
    Ok(())
}

#[test]
fn test_json_round_trip() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder
        .multi_match(&["title", "body"], "ownership", Some("phrase"))?
        .must_not(|q| q.exists("deleted_at"))?
        .geo_distance("location", GeoPoint::new(52.52, 13.405)?, "10km")?
        .date_histogram_agg("per_week", "published", "week")?
        .source(&["title"])?
        .size(10)?;

    let built = builder.build();
    for pretty in [false, true] {
        let parsed: Value = serde_json::from_str(&builder.to_json(pretty)?)?;
        assert_eq!(parsed, serde_json::to_value(&built)?);

        let reparsed: QueryDocument = serde_json::from_value(parsed.clone())?;
        assert_eq!(serde_json::to_value(&reparsed)?, parsed);
    }
    Ok(())
}

#[test]
fn test_failed_call_does_not_mutate() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.match_query("title", "rust")?.size(5)?;
    let before = builder.to_value()?;
    let raw_before = builder.raw_sections();

    assert!(builder.match_query("", "x").is_err());
    assert!(builder.match_query("title", Value::Null).is_err());
    assert!(builder.terms("tags", Vec::<Value>::new()).is_err());
    assert!(builder.multi_match(&["title", " "], "x", None).is_err());
    assert!(builder.nested("comments", |q| q.range("stars", json!({"lt": 1, "lte": 2}))).is_err());
    assert!(builder.aggregate("", json!({})).is_err());
    assert!(builder.sort("date", "DESC").is_err());

    assert_eq!(builder.to_value()?, before);
    assert_eq!(builder.raw_sections(), raw_before);
    Ok(())
}

#[test]
fn test_error_details() -> Result<()> {
    let mut builder = QueryBuilder::new();
    let err = builder.term("  ", "x").unwrap_err();
    let validation = err.as_validation().expect("validation error");
    assert_eq!(validation.code(), ErrorCode::FieldNameEmpty);
    assert_eq!(validation.context(), "term");
    assert_eq!(validation.code().as_str(), "FIELD_NAME_EMPTY");
    assert!(err.to_string().contains("FIELD_NAME_EMPTY"));
    Ok(())
}

#[test]
fn test_sibling_bool_after_function_score() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder
        .match_query("title", "rust")?
        .function_score(
            vec![json!({"weight": 2})],
            FunctionScoreOptions::default().with_score_mode("sum"),
        )?
        .term("lang", "en")?;

    let query = builder.to_value()?["query"].clone();
    assert_eq!(
        query["function_score"]["query"],
        json!({"bool": {"must": [{"match": {"title": {"query": "rust"}}}]}})
    );
    // The later term lands in a new bool beside function_score, not inside it.
    assert_eq!(
        query["bool"],
        json!({"filter": [{"term": {"lang.keyword": "en"}}]})
    );
    Ok(())
}

#[test]
fn test_empty_sibling_bool_collapses_whole_query() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.constant_score(2.0)?.ensure_bool_query();

    assert_eq!(builder.to_value()?, json!({"query": {"match_all": {}}}));
    Ok(())
}

#[test]
fn test_set_query_adopts_bool() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.set_query(json!({"bool": {"must": {"match": {"title": "rust"}}}}))?;
    builder.term("lang", "en")?;

    let bool_query = builder.to_value()?["query"]["bool"].clone();
    assert_eq!(bool_query["must"], json!([{"match": {"title": "rust"}}]));
    assert_eq!(bool_query["filter"], json!([{"term": {"lang.keyword": "en"}}]));

    let err = builder.set_query(json!([1, 2])).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidQueryObject));
    Ok(())
}

#[test]
fn test_validate_never_fails() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.from(9_000)?.size(5_000)?;

    let report = builder.validate();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);

    builder.from(0)?;
    assert!(builder.validate().valid);
    Ok(())
}

#[test]
fn test_count_body() -> Result<()> {
    let mut builder = QueryBuilder::new();
    builder.term("status", "open")?.size(50)?.avg_agg("age", "age")?;

    let count = (&builder).into_count_body()?;
    assert_eq!(
        count,
        json!({"query": {"bool": {"filter": [{"term": {"status.keyword": "open"}}]}}})
    );
    Ok(())
}
