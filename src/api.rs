//! Operational HTTP surface: health, refresh trigger and fact queries

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;
use crate::domain::aggregates::SalesFact;
use crate::domain::value_objects::MatchType;
use crate::engine::{FactQuery, RefreshReport, RefreshRequest, RefreshService};
use crate::EngineError;

#[derive(Clone)]
pub struct AppState { pub refresher: Arc<RefreshService>, pub shutdown: CancellationToken }

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "sales-facts"})) }))
        .route("/api/v1/sales-facts", get(list_facts))
        .route("/api/v1/sales-facts/status", get(status))
        .route("/api/v1/sales-facts/refresh", post(refresh))
        .route("/api/v1/sales-facts/:order_item_id", get(get_fact))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    pub from: Option<DateTime<Utc>>, pub to: Option<DateTime<Utc>>, pub category: Option<String>, pub channel_id: Option<i64>,
    pub sku_primario: Option<String>, pub source: Option<String>, pub match_type: Option<MatchType>,
    #[validate(range(min = 1))] pub page: Option<u32>,
    #[validate(range(min = 1, max = 500))] pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)] pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: usize, pub page: u32, pub version: u64 }
#[derive(Debug, Serialize)] pub struct StatusResponse { pub version: u64, pub rows: usize, pub refreshed_at: Option<DateTime<Utc>> }

async fn list_facts(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<SalesFact>>, (StatusCode, String)> {
    p.validate().map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let page = p.page.unwrap_or(1); let per_page = p.per_page.unwrap_or(100);
    let query = FactQuery { from: p.from, to: p.to, category: p.category, channel_id: p.channel_id, sku_primario: p.sku_primario, source: p.source, match_type: p.match_type };
    let set = s.refresher.store().current();
    let total = set.query(&query).count();
    let offset = (page as usize - 1).saturating_mul(per_page as usize);
    let data = set.query(&query).skip(offset).take(per_page as usize).cloned().collect();
    Ok(Json(PaginatedResponse { data, total, page, version: set.version() }))
}

async fn get_fact(State(s): State<AppState>, Path(id): Path<i64>) -> Result<Json<SalesFact>, (StatusCode, String)> {
    s.refresher.store().current().get(id).cloned().map(Json).ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))
}

async fn status(State(s): State<AppState>) -> Json<StatusResponse> {
    let set = s.refresher.store().current();
    Json(StatusResponse { version: set.version(), rows: set.len(), refreshed_at: set.refreshed_at() })
}

async fn refresh(State(s): State<AppState>, body: Option<Json<RefreshRequest>>) -> Result<Json<RefreshReport>, (StatusCode, String)> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    s.refresher.refresh(request, &s.shutdown.child_token()).await.map(Json).map_err(|e| match e {
        EngineError::Cancelled => (StatusCode::CONFLICT, e.to_string()),
        e => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })
}
