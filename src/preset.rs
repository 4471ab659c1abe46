//! Domain presets: thin wrappers around [`QueryBuilder`] with fixed field names.
//!
//! A preset owns a builder and adds helper methods that call only the public
//! builder API. The wrapped builder is reachable through `Deref`, so every core
//! operation stays available:
//!
//! ```
//! use querykit::preset::EcommerceQuery;
//!
//! # fn main() -> querykit::error::Result<()> {
//! let mut query = EcommerceQuery::new();
//! query.search_products("usb-c charger")?.in_stock()?;
//! query.size(20)?;
//! assert!(query.to_json(false)?.contains("in_stock.keyword"));
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod content;
pub mod ecommerce;
pub mod logs;

pub use analytics::{AnalyticsQuery, Metric};
pub use content::ContentQuery;
pub use ecommerce::EcommerceQuery;
pub use logs::LogsQuery;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::error::{ErrorCode, ValidationError, ValidationResult};

/// Implements construction, `Deref` and unwrapping for a preset wrapping `builder`.
macro_rules! preset_builder {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self::with_config($crate::config::QueryBuilderConfig::default())
            }

            pub fn with_config(config: $crate::config::QueryBuilderConfig) -> Self {
                $name {
                    builder: $crate::query::QueryBuilder::with_config(config),
                }
            }

            /// The wrapped builder.
            pub fn into_inner(self) -> $crate::query::QueryBuilder {
                self.builder
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::query::QueryBuilder;

            fn deref(&self) -> &Self::Target {
                &self.builder
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.builder
            }
        }

        impl From<$name> for $crate::query::QueryBuilder {
            fn from(preset: $name) -> Self {
                preset.builder
            }
        }
    };
}

pub(crate) use preset_builder;

/// Render an inclusive time window as a range spec with RFC 3339 bounds.
pub(crate) fn time_window(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    field: &str,
    context: &str,
) -> ValidationResult<Value> {
    if from > to {
        return Err(ValidationError::new(
            ErrorCode::ConflictingRangeBounds,
            format!("Window start {from} is after its end {to}"),
            context,
        )
        .with_field(field));
    }
    Ok(json!({ "gte": rfc3339(from), "lte": rfc3339(to) }))
}

pub(crate) fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
