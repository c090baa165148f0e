use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldMeta, Model, ModelMeta};

text_enum! {
    LeadTier ("lead tier") {
        Hot => "hot", "Hot",
        Warm => "warm", "Warm",
        Cold => "cold", "Cold",
    }
}

text_enum! {
    /// Outreach state of a lead.
    LeadStatus ("lead status") {
        New => "new", "New",
        Contacted => "contacted", "Contacted",
        Qualified => "qualified", "Qualified",
        Disqualified => "disqualified", "Disqualified",
    }
}

/// Scored, tiered prospect derived from a permit and, when matched, a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub permit_id: i64,
    pub property_id: Option<i64>,
    pub address: String,
    pub lead_tier: LeadTier,
    pub trust_score: Option<f64>,
    /// 0..=100
    pub score: i64,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

const FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldKind::Integer),
    FieldMeta::new("permit_id", FieldKind::Integer),
    FieldMeta::new("property_id", FieldKind::Integer),
    FieldMeta::new("address", FieldKind::Text),
    FieldMeta::choice("lead_tier", LeadTier::CHOICES),
    FieldMeta::new("trust_score", FieldKind::Real),
    FieldMeta::new("score", FieldKind::Integer),
    FieldMeta::choice("status", LeadStatus::CHOICES),
    FieldMeta::new("created_at", FieldKind::Timestamp),
];

impl Model for Lead {
    const META: ModelMeta = ModelMeta {
        name: "lead",
        verbose_name: "Leads",
        table: "leads",
        primary_key: "id",
        fields: FIELDS,
    };
}

impl Lead {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            permit_id: row.get("permit_id")?,
            property_id: row.get("property_id")?,
            address: row.get("address")?,
            lead_tier: row.get("lead_tier")?,
            trust_score: row.get("trust_score")?,
            score: row.get("score")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}
