use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::{FieldKind, FieldMeta, Model, ModelMeta};

text_enum! {
    ScraperRunStatus ("scraper run status") {
        Running => "running", "Running",
        Succeeded => "succeeded", "Succeeded",
        Failed => "failed", "Failed",
    }
}

/// One logged execution of a permit scraper for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperRun {
    pub id: i64,
    pub city: String,
    pub status: ScraperRunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub permits_found: i64,
    pub permits_new: i64,
    pub error_message: Option<String>,
}

const FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldKind::Integer),
    FieldMeta::new("city", FieldKind::Text),
    FieldMeta::choice("status", ScraperRunStatus::CHOICES),
    FieldMeta::new("started_at", FieldKind::Timestamp),
    FieldMeta::new("finished_at", FieldKind::Timestamp),
    FieldMeta::new("permits_found", FieldKind::Integer),
    FieldMeta::new("permits_new", FieldKind::Integer),
    FieldMeta::new("error_message", FieldKind::Text),
];

impl Model for ScraperRun {
    const META: ModelMeta = ModelMeta {
        name: "scraperrun",
        verbose_name: "Scraper runs",
        table: "scraper_runs",
        primary_key: "id",
        fields: FIELDS,
    };
}

impl ScraperRun {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            city: row.get("city")?,
            status: row.get("status")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            permits_found: row.get("permits_found")?,
            permits_new: row.get("permits_new")?,
            error_message: row.get("error_message")?,
        })
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}
