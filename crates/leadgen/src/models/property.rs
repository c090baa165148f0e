use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldMeta, Model, ModelMeta};

text_enum! {
    /// Progress of the valuation/occupancy enrichment pass for a parcel.
    EnrichmentStatus ("enrichment status") {
        Pending => "pending", "Pending",
        Enriched => "enriched", "Enriched",
        Failed => "failed", "Failed",
        Skipped => "skipped", "Skipped",
    }
}

/// Parcel and owner record enriched with valuation and occupancy data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub parcel_id: String,
    pub address: String,
    pub city: String,
    pub owner_name: Option<String>,
    pub market_value: Option<f64>,
    pub year_built: Option<i64>,
    pub owner_occupied: Option<bool>,
    pub neighborhood_code: Option<String>,
    pub enrichment_status: EnrichmentStatus,
    pub enriched_at: Option<DateTime<Utc>>,
}

const FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldKind::Integer),
    FieldMeta::new("parcel_id", FieldKind::Text),
    FieldMeta::new("address", FieldKind::Text),
    FieldMeta::new("city", FieldKind::Text),
    FieldMeta::new("owner_name", FieldKind::Text),
    FieldMeta::new("market_value", FieldKind::Real),
    FieldMeta::new("year_built", FieldKind::Integer),
    FieldMeta::new("owner_occupied", FieldKind::Boolean),
    FieldMeta::new("neighborhood_code", FieldKind::Text),
    FieldMeta::choice("enrichment_status", EnrichmentStatus::CHOICES),
    FieldMeta::new("enriched_at", FieldKind::Timestamp),
];

impl Model for Property {
    const META: ModelMeta = ModelMeta {
        name: "property",
        verbose_name: "Properties",
        table: "properties",
        primary_key: "id",
        fields: FIELDS,
    };
}

impl Property {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            parcel_id: row.get("parcel_id")?,
            address: row.get("address")?,
            city: row.get("city")?,
            owner_name: row.get("owner_name")?,
            market_value: row.get("market_value")?,
            year_built: row.get("year_built")?,
            owner_occupied: row.get("owner_occupied")?,
            neighborhood_code: row.get("neighborhood_code")?,
            enrichment_status: row.get("enrichment_status")?,
            enriched_at: row.get("enriched_at")?,
        })
    }
}
