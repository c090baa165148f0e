use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldMeta, Model, ModelMeta};

/// Municipal building permit scraped from a source city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub id: i64,
    pub permit_number: String,
    pub city: String,
    pub permit_type: String,
    pub description: String,
    pub address: String,
    pub contractor_id: Option<String>,
    pub contractor_name: Option<String>,
    pub valuation: Option<f64>,
    pub issued_date: Option<NaiveDate>,
    pub scraped_at: DateTime<Utc>,
}

const FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldKind::Integer),
    FieldMeta::new("permit_number", FieldKind::Text),
    FieldMeta::new("city", FieldKind::Text),
    FieldMeta::new("permit_type", FieldKind::Text),
    FieldMeta::new("description", FieldKind::Text),
    FieldMeta::new("address", FieldKind::Text),
    FieldMeta::new("contractor_id", FieldKind::Text),
    FieldMeta::new("contractor_name", FieldKind::Text),
    FieldMeta::new("valuation", FieldKind::Real),
    FieldMeta::new("issued_date", FieldKind::Date),
    FieldMeta::new("scraped_at", FieldKind::Timestamp),
];

impl Model for Permit {
    const META: ModelMeta = ModelMeta {
        name: "permit",
        verbose_name: "Permits",
        table: "permits",
        primary_key: "id",
        fields: FIELDS,
    };
}

impl Permit {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            permit_number: row.get("permit_number")?,
            city: row.get("city")?,
            permit_type: row.get("permit_type")?,
            description: row.get("description")?,
            address: row.get("address")?,
            contractor_id: row.get("contractor_id")?,
            contractor_name: row.get("contractor_name")?,
            valuation: row.get("valuation")?,
            issued_date: row.get("issued_date")?,
            scraped_at: row.get("scraped_at")?,
        })
    }
}
