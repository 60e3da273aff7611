//! Route handlers. Each one extracts parameters, calls the engine and
//! formats the result; all failures become [`ApiError`].

use crate::error::ApiError;
use crate::response::{DeleteConfirmation, TableList};
use crate::state::AppState;
use autorest_core::ListRequest;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

fn path_params<T>(path: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    path.map(|Path(params)| params)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "service": "autorest" }))
}

pub async fn list_tables(State(state): State<Arc<AppState>>) -> ApiResult<Json<TableList>> {
    let exposed = state.engine.exposed_tables().await?;
    Ok(Json(TableList::from(&exposed)))
}

pub async fn refresh_tables(State(state): State<Arc<AppState>>) -> ApiResult<Json<TableList>> {
    let exposed = state.engine.refresh_catalog().await?;
    tracing::info!(tables = exposed.len(), "Catalog refreshed on request");
    Ok(Json(TableList::from(&exposed)))
}

pub async fn table_schema(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult<Response> {
    let (schema, table) = path_params(path)?;
    let desc = state.engine.validate_table(&schema, &table).await?;
    Ok(Json(desc.view()).into_response())
}

pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Response> {
    let (schema, table) = path_params(path)?;
    let Query(pairs) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = ListRequest::from_pairs(&pairs)?;
    let page = state.engine.list(&schema, &table, &request).await?;
    Ok(Json(page).into_response())
}

pub async fn get_row(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let (schema, table, id) = path_params(path)?;
    Ok(Json(state.engine.get(&schema, &table, &id).await?))
}

pub async fn create_row(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (schema, table) = path_params(path)?;
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let row = state.engine.create(&schema, &table, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_row(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, String)>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let (schema, table, id) = path_params(path)?;
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(state.engine.update(&schema, &table, &id, payload).await?))
}

pub async fn delete_row(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> ApiResult<Json<DeleteConfirmation>> {
    let (schema, table, id) = path_params(path)?;
    let key = state.engine.delete(&schema, &table, &id).await?;
    Ok(Json(DeleteConfirmation::new(key)))
}

pub async fn fallback(uri: Uri) -> ApiError {
    ApiError::RouteNotFound(format!("No route for {}", uri.path()))
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method.to_string())
}
