use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rusqlite::Connection;
use serde_json::json;
use tracing::{error, warn};

use super::list::{self, ListQuery};
use super::{AdminError, AdminSite, ModelAdminView};
use crate::db::{Database, DbError};

/// Shared, immutable state behind the admin endpoints.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub site: Arc<AdminSite>,
    pub database: Database,
}

/// Router builder exposing the read-only admin JSON API.
pub fn admin_router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/admin/api/models", get(index_handler))
        .route("/admin/api/models/:model", get(model_handler))
        .route("/admin/api/models/:model/records", get(records_handler))
        .route("/admin/api/models/:model/export.csv", get(export_handler))
        .with_state(state)
}

pub(crate) async fn index_handler(State(state): State<Arc<AdminState>>) -> Response {
    let payload = json!({
        "site_name": state.site.name(),
        "models": state.site.index(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn model_handler(
    State(state): State<Arc<AdminState>>,
    Path(model): Path<String>,
) -> Response {
    match state.site.get_model_admin(&model) {
        Ok(admin) => (
            StatusCode::OK,
            Json(ModelAdminView::from_admin(admin.as_ref())),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn records_handler(
    State(state): State<Arc<AdminState>>,
    Path(model): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let admin = match state.site.get_model_admin(&model) {
        Ok(admin) => admin,
        Err(err) => return error_response(err),
    };
    let query = ListQuery::from_params(params);

    let result = with_connection(state.database.clone(), move |conn| {
        list::list(conn, admin.as_ref(), &query)
    })
    .await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler(
    State(state): State<Arc<AdminState>>,
    Path(model): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let admin = match state.site.get_model_admin(&model) {
        Ok(admin) => admin,
        Err(err) => return error_response(err),
    };
    let filename = format!("attachment; filename=\"{}.csv\"", admin.table_name());
    let query = ListQuery::from_params(params);

    let result = with_connection(state.database.clone(), move |conn| {
        list::export_csv(conn, admin.as_ref(), &query)
    })
    .await;

    match result {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, filename),
            ],
            body,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// Runs `work` on a fresh read-only connection off the async runtime.
async fn with_connection<T, F>(database: Database, work: F) -> Result<T, AdminError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, AdminError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = database.open_readonly()?;
        work(&conn)
    })
    .await
    .map_err(|err| AdminError::Database(DbError::Worker(err.to_string())))?
}

fn error_response(err: AdminError) -> Response {
    let status = match &err {
        AdminError::NotRegistered(_) => StatusCode::NOT_FOUND,
        AdminError::UnknownFilter { .. }
        | AdminError::UnknownSortField(_)
        | AdminError::InvalidFilterValue { .. } => StatusCode::BAD_REQUEST,
        AdminError::AlreadyRegistered(_)
        | AdminError::UnknownField { .. }
        | AdminError::NonTextSearchField { .. }
        | AdminError::Database(_)
        | AdminError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, "admin request failed");
    } else {
        warn!(error = %err, %status, "admin request rejected");
    }

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
