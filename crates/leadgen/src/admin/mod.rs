//! Admin registry for the lead-generation models.
//!
//! A [`ModelAdmin`] is declarative metadata: which columns a list view shows,
//! which fields are searchable or filterable, and the default ordering. The
//! [`AdminSite`] checks every registration against the model's field metadata
//! when it is registered, so a typo in a field name fails at startup instead
//! of on the first request.

pub mod list;
mod registrations;
pub mod router;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::db::DbError;
use crate::models::{FieldKind, FieldMeta, ModelMeta};

pub use list::{ColumnInfo, FilterInfo, ListQuery, ListResponse};
pub use registrations::{
    LeadAdmin, NeighborhoodMedianAdmin, PermitAdmin, PropertyAdmin, ScraperRunAdmin,
};
pub use router::{admin_router, AdminState};

/// Page size used when neither the request nor the registration sets one.
pub const DEFAULT_LIST_PER_PAGE: u64 = 100;
/// Hard ceiling on a single page.
pub const MAX_PAGE_SIZE: u64 = 500;

/// Display and lookup configuration for one model.
///
/// Field names refer to [`ModelMeta::fields`]. Ordering entries prefixed with
/// `-` sort descending.
pub trait ModelAdmin: Send + Sync {
    fn meta(&self) -> ModelMeta;

    fn model_name(&self) -> &'static str {
        self.meta().name
    }

    fn table_name(&self) -> &'static str {
        self.meta().table
    }

    fn list_display(&self) -> Vec<&'static str> {
        vec![self.meta().primary_key]
    }

    fn list_filter(&self) -> Vec<&'static str> {
        vec![]
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec![]
    }

    fn readonly_fields(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Empty means newest primary key first.
    fn ordering(&self) -> Vec<&'static str> {
        vec![]
    }

    fn list_per_page(&self) -> Option<u64> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("model '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("model '{0}' is not registered with the admin site")]
    NotRegistered(String),
    #[error("{model}.{option} refers to unknown field '{field}'")]
    UnknownField {
        model: &'static str,
        option: &'static str,
        field: String,
    },
    #[error("{model}.search_fields entry '{field}' is not a text field")]
    NonTextSearchField { model: &'static str, field: String },
    #[error("unknown filter field '{field}'. Allowed filter fields: {allowed:?}")]
    UnknownFilter {
        field: String,
        allowed: Vec<&'static str>,
    },
    #[error("cannot sort by unknown field '{0}'")]
    UnknownSortField(String),
    #[error("invalid value '{value}' for filter '{field}'")]
    InvalidFilterValue { field: String, value: String },
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),
}

impl From<rusqlite::Error> for AdminError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Database(DbError::Query(value))
    }
}

/// Registry of model admins, keyed by lowercase model name.
#[derive(Clone)]
pub struct AdminSite {
    name: String,
    registry: BTreeMap<String, Arc<dyn ModelAdmin>>,
}

impl std::fmt::Debug for AdminSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSite")
            .field("name", &self.name)
            .field("models", &self.registry.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AdminSite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Site with every lead-generation model registered.
    pub fn lead_generation() -> Result<Self, AdminError> {
        let mut site = Self::new("Lead generation administration");
        site.register(PermitAdmin)?;
        site.register(PropertyAdmin)?;
        site.register(LeadAdmin)?;
        site.register(ScraperRunAdmin)?;
        site.register(NeighborhoodMedianAdmin)?;
        Ok(site)
    }

    pub fn register<A>(&mut self, admin: A) -> Result<(), AdminError>
    where
        A: ModelAdmin + 'static,
    {
        let key = admin.model_name().to_ascii_lowercase();
        if self.registry.contains_key(&key) {
            return Err(AdminError::AlreadyRegistered(key));
        }
        check_registration(&admin)?;

        debug!(model = %key, table = admin.table_name(), "registered model admin");
        self.registry.insert(key, Arc::new(admin));
        Ok(())
    }

    pub fn is_registered(&self, model_name: &str) -> bool {
        self.registry
            .contains_key(&model_name.to_ascii_lowercase())
    }

    pub fn get_model_admin(&self, model_name: &str) -> Result<Arc<dyn ModelAdmin>, AdminError> {
        self.registry
            .get(&model_name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| AdminError::NotRegistered(model_name.to_string()))
    }

    pub fn registered(&self) -> impl Iterator<Item = &Arc<dyn ModelAdmin>> {
        self.registry.values()
    }

    pub fn index(&self) -> Vec<ModelSummary> {
        self.registered()
            .map(|admin| {
                let meta = admin.meta();
                ModelSummary {
                    name: meta.name,
                    verbose_name: meta.verbose_name,
                    records_url: format!("/admin/api/models/{}/records", meta.name),
                }
            })
            .collect()
    }
}

/// Entry in the admin index.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub records_url: String,
}

/// Full registration metadata for one model, as served to admin clients.
#[derive(Debug, Clone, Serialize)]
pub struct ModelAdminView {
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub fields: &'static [FieldMeta],
    pub list_display: Vec<&'static str>,
    pub list_filter: Vec<&'static str>,
    pub search_fields: Vec<&'static str>,
    pub readonly_fields: Vec<&'static str>,
    pub ordering: Vec<&'static str>,
    pub list_per_page: u64,
}

impl ModelAdminView {
    pub fn from_admin(admin: &dyn ModelAdmin) -> Self {
        let meta = admin.meta();
        Self {
            name: meta.name,
            verbose_name: meta.verbose_name,
            table: meta.table,
            primary_key: meta.primary_key,
            fields: meta.fields,
            list_display: admin.list_display(),
            list_filter: admin.list_filter(),
            search_fields: admin.search_fields(),
            readonly_fields: admin.readonly_fields(),
            ordering: admin.ordering(),
            list_per_page: admin.list_per_page().unwrap_or(DEFAULT_LIST_PER_PAGE),
        }
    }
}

fn check_registration(admin: &dyn ModelAdmin) -> Result<(), AdminError> {
    let meta = admin.meta();
    let options: [(&'static str, Vec<&'static str>); 4] = [
        ("list_display", admin.list_display()),
        ("list_filter", admin.list_filter()),
        ("search_fields", admin.search_fields()),
        ("readonly_fields", admin.readonly_fields()),
    ];

    for (option, fields) in options {
        for field in fields {
            if !meta.has_field(field) {
                return Err(AdminError::UnknownField {
                    model: meta.name,
                    option,
                    field: field.to_string(),
                });
            }
        }
    }

    for entry in admin.ordering() {
        let field = entry.strip_prefix('-').unwrap_or(entry);
        if !meta.has_field(field) {
            return Err(AdminError::UnknownField {
                model: meta.name,
                option: "ordering",
                field: field.to_string(),
            });
        }
    }

    for field in admin.search_fields() {
        if let Some(field_meta) = meta.field(field) {
            if field_meta.kind != FieldKind::Text {
                return Err(AdminError::NonTextSearchField {
                    model: meta.name,
                    field: field.to_string(),
                });
            }
        }
    }

    Ok(())
}
