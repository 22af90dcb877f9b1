// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Addon resource handlers plus the public health and metrics endpoints.
//!
//! Catalog lookups that fail never surface as HTTP errors: Stremio treats any
//! non-200 from an addon as broken, so failures become empty payloads.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use amanogawa_catalog::Episode;
use amanogawa_core::{HealthStatus, MessagingBackend};
use amanogawa_stremio::{
    CatalogExtra, CatalogResponse, ContentType, Manifest, MetaResponse, StreamResponse,
    parse_stream_id, parse_title_id,
};

use crate::server::AppState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "unhealthy".
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Messaging session state.
    pub session: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Strips the `.json` suffix Stremio appends to the last path segment.
pub(crate) fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// GET /manifest.json
pub async fn get_manifest<B: MessagingBackend>(State(state): State<AppState<B>>) -> Json<Manifest> {
    Json(amanogawa_stremio::manifest(state.catalog.base_url()))
}

/// GET /catalog/{type}/{catalog_id}.json
pub async fn get_catalog<B: MessagingBackend>(
    State(state): State<AppState<B>>,
    Path((kind, file)): Path<(String, String)>,
) -> Json<CatalogResponse> {
    Json(catalog(&state, &kind, strip_json(&file), CatalogExtra::None).await)
}

/// GET /catalog/{type}/{catalog_id}/{extra}.json
pub async fn get_catalog_extra<B: MessagingBackend>(
    State(state): State<AppState<B>>,
    Path((kind, catalog_id, extra)): Path<(String, String, String)>,
) -> Json<CatalogResponse> {
    let extra = CatalogExtra::parse(strip_json(&extra));
    Json(catalog(&state, &kind, &catalog_id, extra).await)
}

async fn catalog<B: MessagingBackend>(
    state: &AppState<B>,
    kind: &str,
    catalog_id: &str,
    extra: CatalogExtra,
) -> CatalogResponse {
    let Ok(content_type) = ContentType::from_str(kind) else {
        debug!(kind, "catalog requested for unknown type");
        return CatalogResponse::default();
    };
    let catalog_base = state.catalog.base_url();

    let titles = match &extra {
        CatalogExtra::Search(query) => match state.catalog.all_titles().await {
            Ok(titles) => titles
                .iter()
                .filter(|t| t.is_movie == content_type.is_movie() && t.matches(query))
                .map(|t| amanogawa_stremio::to_catalog_meta(t, catalog_base))
                .collect(),
            Err(e) => {
                error!(catalog_id, query = %query, error = %e, "catalog search failed");
                Vec::new()
            }
        },
        _ => {
            let page = extra.page(state.page_size);
            match state.catalog.catalog_page(page).await {
                Ok(titles) => titles
                    .data
                    .iter()
                    .filter(|t| t.is_movie == content_type.is_movie())
                    .map(|t| amanogawa_stremio::to_catalog_meta(t, catalog_base))
                    .collect(),
                Err(e) => {
                    error!(catalog_id, page, error = %e, "catalog page fetch failed");
                    Vec::new()
                }
            }
        }
    };

    CatalogResponse { metas: titles }
}

/// GET /meta/{type}/{id}.json
pub async fn get_meta<B: MessagingBackend>(
    State(state): State<AppState<B>>,
    Path((_kind, file)): Path<(String, String)>,
) -> Json<MetaResponse> {
    let Some(title_id) = parse_title_id(strip_json(&file)) else {
        return Json(MetaResponse { meta: None });
    };

    let title = match state.catalog.title(title_id).await {
        Ok(title) => title,
        Err(e) => {
            error!(title_id, error = %e, "title fetch failed");
            return Json(MetaResponse { meta: None });
        }
    };

    let episodes: Arc<Vec<Episode>> = if title.is_movie {
        Arc::default()
    } else {
        match state.catalog.episodes(title_id).await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(title_id, error = %e, "episode list fetch failed");
                Arc::default()
            }
        }
    };

    Json(MetaResponse {
        meta: Some(amanogawa_stremio::to_meta(
            &title,
            &episodes,
            state.catalog.base_url(),
        )),
    })
}

/// GET /stream/{type}/{id}.json
pub async fn get_streams<B: MessagingBackend>(
    State(state): State<AppState<B>>,
    Path((_kind, file)): Path<(String, String)>,
) -> Json<StreamResponse> {
    let Some((title_id, episode)) = parse_stream_id(strip_json(&file)) else {
        return Json(StreamResponse::default());
    };

    let title = match state.catalog.title(title_id).await {
        Ok(title) => title,
        Err(e) => {
            error!(title_id, error = %e, "title fetch for streams failed");
            return Json(StreamResponse::default());
        }
    };

    let mut bot_id = None;
    if let Some(number) = episode {
        match state.catalog.episodes(title_id).await {
            Ok(episodes) => {
                bot_id = episodes
                    .iter()
                    .find(|e| e.number == number)
                    .and_then(|e| e.bot_id);
            }
            Err(e) => warn!(title_id, error = %e, "episode list fetch for streams failed"),
        }
    }

    Json(StreamResponse {
        streams: amanogawa_stremio::to_streams(&title, bot_id, &state.base_url),
    })
}

/// GET /health (unauthenticated, for monitors)
pub async fn get_health<B: MessagingBackend>(State(state): State<AppState<B>>) -> Response {
    let (code, status) = match state.bridge.health() {
        HealthStatus::Healthy => (StatusCode::OK, "ok"),
        HealthStatus::Unhealthy(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        session: state.bridge.session().state().to_string(),
    };
    (code, Json(body)).into_response()
}

/// GET /metrics (unauthenticated, for Prometheus scraping)
pub async fn get_metrics<B: MessagingBackend>(State(state): State<AppState<B>>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_json_only_removes_suffix() {
        assert_eq!(strip_json("amngw:133.json"), "amngw:133");
        assert_eq!(strip_json("skip=20.json"), "skip=20");
        assert_eq!(strip_json("amngw:133"), "amngw:133");
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".into(),
            version: "0.1.0".into(),
            uptime_secs: 42,
            session: "disconnected".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["uptime_secs"], 42);
        assert_eq!(json["session"], "disconnected");
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "video not found".into(),
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"error":"video not found"}"#
        );
    }
}
