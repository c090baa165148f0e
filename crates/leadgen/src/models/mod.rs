//! Record types persisted in the lead-generation database.
//!
//! Every model carries static [`ModelMeta`] describing its table and columns.
//! The admin registry validates registrations against it and the list engine
//! uses it to decode rows without a per-model query.

use serde::Serialize;

/// Storage class of a column, used to decode SQLite values into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    Boolean,
    Date,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldMeta {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Stored spellings of an enum-backed text column; empty otherwise.
    pub choices: &'static [&'static str],
}

impl FieldMeta {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            choices: &[],
        }
    }

    /// Text column restricted to the given stored values.
    pub const fn choice(name: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            choices,
        }
    }
}

/// Table-level description of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMeta {
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub fields: &'static [FieldMeta],
}

impl ModelMeta {
    pub fn field(&self, name: &str) -> Option<&'static FieldMeta> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

pub trait Model {
    const META: ModelMeta;
}

/// Raised when a stored enum column holds a value no variant maps to.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a snake_case text enum stored as TEXT in SQLite.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $text:literal, $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const CHOICES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|err| rusqlite::types::FromSqlError::Other(Box::new(err)))
            }
        }
    };
}

// Declared after `text_enum!` so the submodules can invoke it.
mod contractor;
mod lead;
mod neighborhood;
mod permit;
mod property;
mod scraper_run;

pub use contractor::Contractor;
pub use lead::{Lead, LeadStatus, LeadTier};
pub use neighborhood::NeighborhoodMedian;
pub use permit::Permit;
pub use property::{EnrichmentStatus, Property};
pub use scraper_run::{ScraperRun, ScraperRunStatus};

/// Every model stored by the schema, in creation order.
pub const ALL_MODELS: &[ModelMeta] = &[
    Contractor::META,
    Permit::META,
    Property::META,
    Lead::META,
    ScraperRun::META,
    NeighborhoodMedian::META,
];
