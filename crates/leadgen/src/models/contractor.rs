use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldMeta, Model, ModelMeta};

/// Licensed contractor referenced by permits. `id` is the license identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: String,
    pub business_name: String,
    pub city: String,
    pub trust_score: Option<f64>,
    pub audited: bool,
    pub audited_at: Option<DateTime<Utc>>,
}

const FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldKind::Text),
    FieldMeta::new("business_name", FieldKind::Text),
    FieldMeta::new("city", FieldKind::Text),
    FieldMeta::new("trust_score", FieldKind::Real),
    FieldMeta::new("audited", FieldKind::Boolean),
    FieldMeta::new("audited_at", FieldKind::Timestamp),
];

impl Model for Contractor {
    const META: ModelMeta = ModelMeta {
        name: "contractor",
        verbose_name: "Contractors",
        table: "contractors",
        primary_key: "id",
        fields: FIELDS,
    };
}

impl Contractor {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            business_name: row.get("business_name")?,
            city: row.get("city")?,
            trust_score: row.get("trust_score")?,
            audited: row.get("audited")?,
            audited_at: row.get("audited_at")?,
        })
    }
}
