//! Product catalogue search.

use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::query::QueryBuilder;
use crate::validation::validate_finite_number;

const SEARCH_FIELDS: [&str; 4] = ["name^3", "brand^2", "description", "category"];

/// Product search with price, stock, brand and rating helpers.
#[derive(Debug, Clone)]
pub struct EcommerceQuery {
    builder: QueryBuilder,
}

super::preset_builder!(EcommerceQuery);

impl EcommerceQuery {
    /// Free-text search over name, brand, description and category.
    pub fn search_products<V: Into<Value>>(&mut self, text: V) -> Result<&mut Self> {
        self.builder
            .multi_match(&SEARCH_FIELDS, text, Some("best_fields"))?;
        Ok(self)
    }

    /// Restrict the price. At least one bound must be given.
    pub fn price_range(&mut self, min: Option<f64>, max: Option<f64>) -> Result<&mut Self> {
        const CONTEXT: &str = "price_range";
        if let Some(min) = min {
            validate_finite_number(min, "min", CONTEXT)?;
        }
        if let Some(max) = max {
            validate_finite_number(max, "max", CONTEXT)?;
        }

        let mut bounds = Map::new();
        if let Some(min) = min {
            bounds.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = max {
            bounds.insert("lte".to_string(), json!(max));
        }
        self.builder.range("price", Value::Object(bounds))?;
        Ok(self)
    }

    pub fn in_stock(&mut self) -> Result<&mut Self> {
        self.builder.term("in_stock", true)?;
        Ok(self)
    }

    pub fn category(&mut self, category: &str) -> Result<&mut Self> {
        self.builder.term("category", category)?;
        Ok(self)
    }

    pub fn brands<S: AsRef<str>>(&mut self, brands: &[S]) -> Result<&mut Self> {
        let brands: Vec<&str> = brands.iter().map(AsRef::as_ref).collect();
        self.builder.terms("brand.keyword", brands)?;
        Ok(self)
    }

    pub fn min_rating(&mut self, rating: f64) -> Result<&mut Self> {
        validate_finite_number(rating, "rating", "min_rating")?;
        self.builder.range("rating", json!({ "gte": rating }))?;
        Ok(self)
    }

    pub fn sort_by_price(&mut self, order: &str) -> Result<&mut Self> {
        self.builder.sort("price", order)?;
        Ok(self)
    }

    pub fn sort_by_popularity(&mut self) -> Result<&mut Self> {
        self.builder.sort("popularity", "desc")?;
        Ok(self)
    }

    /// Brand buckets, price bands and the average rating.
    pub fn with_facets(&mut self) -> Result<&mut Self> {
        self.builder
            .terms_agg("brands", "brand.keyword", 20)?
            .range_agg(
                "price_ranges",
                "price",
                vec![
                    json!({ "key": "under_50", "to": 50 }),
                    json!({ "key": "50_to_200", "from": 50, "to": 200 }),
                    json!({ "key": "over_200", "from": 200 }),
                ],
            )?
            .avg_agg("avg_rating", "rating")?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_product_search() {
        let mut query = EcommerceQuery::new();
        query
            .search_products("wireless headphones")
            .unwrap()
            .price_range(Some(50.0), Some(300.0))
            .unwrap()
            .in_stock()
            .unwrap()
            .brands(&["sony", "bose"])
            .unwrap()
            .sort_by_popularity()
            .unwrap();

        let value = query.to_value().unwrap();
        let bool_query = &value["query"]["bool"];
        assert_eq!(
            bool_query["must"][0]["multi_match"]["fields"],
            json!(["name^3", "brand^2", "description", "category"])
        );
        assert_eq!(
            bool_query["filter"],
            json!([
                {"range": {"price": {"gte": 50.0, "lte": 300.0}}},
                {"term": {"in_stock.keyword": true}},
                {"terms": {"brand.keyword": ["sony", "bose"]}}
            ])
        );
        assert_eq!(value["sort"], json!([{"popularity": "desc"}]));
    }

    #[test]
    fn test_price_range_needs_a_bound() {
        let mut query = EcommerceQuery::new();
        let err = query.price_range(None, None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmptyRange));
    }

    #[test]
    fn test_non_finite_bounds_are_rejected() {
        let mut query = EcommerceQuery::new();
        query.in_stock().unwrap();
        let before = query.document().clone();

        let err = query.price_range(Some(f64::NAN), None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidNumber));
        assert_eq!(err.as_validation().unwrap().field(), Some("min"));

        let err = query.price_range(Some(10.0), Some(f64::INFINITY)).unwrap_err();
        assert_eq!(err.as_validation().unwrap().field(), Some("max"));

        let err = query.min_rating(f64::NEG_INFINITY).unwrap_err();
        assert_eq!(err.as_validation().unwrap().context(), "min_rating");

        assert_eq!(query.document(), &before);
    }

    #[test]
    fn test_facets() {
        let mut query = EcommerceQuery::default();
        query.with_facets().unwrap();
        query.size(0).unwrap();

        let aggs = query.to_value().unwrap()["aggregations"].clone();
        assert_eq!(aggs["brands"]["terms"]["size"], json!(20));
        assert_eq!(aggs["price_ranges"]["range"]["ranges"].as_array().unwrap().len(), 3);
        assert_eq!(aggs["avg_rating"], json!({"avg": {"field": "rating"}}));
    }
}
