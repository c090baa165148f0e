use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldMeta, Model, ModelMeta};

/// Aggregated market value per neighborhood code within a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodMedian {
    pub id: i64,
    pub neighborhood_code: String,
    pub city: String,
    pub median_market_value: f64,
    pub sample_size: i64,
    pub computed_at: DateTime<Utc>,
}

const FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldKind::Integer),
    FieldMeta::new("neighborhood_code", FieldKind::Text),
    FieldMeta::new("city", FieldKind::Text),
    FieldMeta::new("median_market_value", FieldKind::Real),
    FieldMeta::new("sample_size", FieldKind::Integer),
    FieldMeta::new("computed_at", FieldKind::Timestamp),
];

impl Model for NeighborhoodMedian {
    const META: ModelMeta = ModelMeta {
        name: "neighborhoodmedian",
        verbose_name: "Neighborhood medians",
        table: "neighborhood_medians",
        primary_key: "id",
        fields: FIELDS,
    };
}

impl NeighborhoodMedian {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            neighborhood_code: row.get("neighborhood_code")?,
            city: row.get("city")?,
            median_market_value: row.get("median_market_value")?,
            sample_size: row.get("sample_size")?,
            computed_at: row.get("computed_at")?,
        })
    }

    /// Ratio of a property's market value to this neighborhood's median.
    pub fn relative_value(&self, market_value: f64) -> Option<f64> {
        if self.median_market_value > 0.0 {
            Some(market_value / self.median_market_value)
        } else {
            None
        }
    }
}
