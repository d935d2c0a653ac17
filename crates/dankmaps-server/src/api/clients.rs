//! `/api/clients` handlers. Reads return bare records so the mobile app can
//! consume them without unwrapping an envelope.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use dankmaps_core::{Logo, StoreRecord, StoreStatus, StoreUpdate};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// Store fields accepted on create and update. Absent fields are left as is
/// on update.
#[derive(Debug, Deserialize)]
pub(in crate::api) struct StoreFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub logo: Option<Logo>,
    pub categories: Option<Vec<String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub website: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateStoreRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub fields: StoreFields,
}

impl StoreFields {
    fn into_update(self, id: String) -> StoreUpdate {
        StoreUpdate {
            id,
            title: self.title,
            description: self.description,
            logo: self.logo,
            categories: self.categories,
            latitude: self.latitude,
            longitude: self.longitude,
            website: self.website,
            status: self.status,
        }
    }
}

fn validate_status(req_id: &str, status: Option<&str>) -> Result<(), ApiError> {
    match status {
        Some(raw) if StoreStatus::parse(raw).is_none() => Err(ApiError::new(
            req_id,
            "validation_error",
            format!("status must be 'open' or 'closed', got '{raw}'"),
        )),
        _ => Ok(()),
    }
}

fn parse_requested_id(req_id: &str, raw: Option<serde_json::Value>) -> Result<String, ApiError> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s.trim().to_owned()),
        Some(serde_json::Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        Some(other) => Err(ApiError::new(
            req_id,
            "validation_error",
            format!("id must be a string or integer, got {other}"),
        )),
    }
}

/// GET /api/clients: every store, in insertion order.
pub(in crate::api) async fn list_stores(State(state): State<AppState>) -> Json<Vec<StoreRecord>> {
    Json(state.stores.list().await)
}

/// GET /api/clients/{id}
pub(in crate::api) async fn get_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<StoreRecord>, ApiError> {
    state.stores.get(&id).await.map(Json).ok_or_else(|| {
        ApiError::new(
            req_id.0,
            "not_found",
            format!("store '{id}' not found"),
        )
    })
}

/// POST /api/clients: create a store. `id` is optional.
pub(in crate::api) async fn create_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreRecord>), ApiError> {
    let rid = &req_id.0;
    validate_status(rid, body.fields.status.as_deref())?;
    let id = parse_requested_id(rid, body.id)?;

    let record = state
        .stores
        .create(body.fields.into_update(id))
        .await
        .map_err(|e| ApiError::from_repository(rid, &e))?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/clients/{id}: merge the given fields into a store.
pub(in crate::api) async fn update_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<StoreFields>,
) -> Result<Json<StoreRecord>, ApiError> {
    let rid = &req_id.0;
    validate_status(rid, body.status.as_deref())?;

    state
        .stores
        .update(&body.into_update(id))
        .await
        .map(Json)
        .map_err(|e| ApiError::from_repository(rid, &e))
}

/// DELETE /api/clients/{id}
pub(in crate::api) async fn delete_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .stores
        .delete(&id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| ApiError::from_repository(&req_id.0, &e))
}
