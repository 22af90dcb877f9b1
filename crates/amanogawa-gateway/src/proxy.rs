// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `GET /stream-proxy/{content_id}`: resolves the episode through the bridge
//! and relays the video bytes, honouring an open-ended `Range` start.

use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use futures::StreamExt;
use tracing::{info, warn};

use amanogawa_core::{EpisodeId, MessagingBackend};

use crate::handlers::ErrorResponse;
use crate::server::AppState;

/// Content type used when the backend does not report one.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Reads the start offset of a `Range` header.
///
/// Only a single `bytes=N-` or `bytes=N-M` range is understood; the end bound
/// is ignored. Suffix ranges, multi-ranges and anything malformed yield `None`.
pub fn parse_range_start(value: &str) -> Option<u64> {
    let spec = value.trim().strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }
    let (start, end) = spec.split_once('-')?;
    let start = start.trim().parse::<u64>().ok()?;
    let end = end.trim();
    if !end.is_empty() && end.parse::<u64>().is_err() {
        return None;
    }
    Some(start)
}

/// Status and length headers for one proxied response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePlan {
    pub status: StatusCode,
    /// Byte offset the body starts at.
    pub offset: u64,
    pub content_length: Option<u64>,
    pub content_range: Option<String>,
}

impl ResponsePlan {
    /// Whether a body should be streamed at all.
    pub fn has_body(&self) -> bool {
        self.status != StatusCode::RANGE_NOT_SATISFIABLE
    }
}

/// Maps the requested range start and the media size to a response shape.
///
/// Any parsed range gets 206 when the size is known, `bytes=0-` included.
pub fn plan_response(range_start: Option<u64>, size: Option<u64>) -> ResponsePlan {
    let offset = range_start.unwrap_or(0);
    match (range_start, size) {
        (Some(offset), Some(size)) if offset >= size => ResponsePlan {
            status: StatusCode::RANGE_NOT_SATISFIABLE,
            offset,
            content_length: None,
            content_range: Some(format!("bytes */{size}")),
        },
        (Some(offset), Some(size)) => ResponsePlan {
            status: StatusCode::PARTIAL_CONTENT,
            offset,
            content_length: Some(size - offset),
            content_range: Some(format!("bytes {offset}-{}/{size}", size - 1)),
        },
        (None, Some(size)) => ResponsePlan {
            status: StatusCode::OK,
            offset: 0,
            content_length: Some(size),
            content_range: None,
        },
        (_, None) => ResponsePlan {
            status: StatusCode::OK,
            offset,
            content_length: None,
            content_range: None,
        },
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "video not found".to_string(),
        }),
    )
        .into_response()
}

/// GET /stream-proxy/{content_id}
pub async fn stream_proxy<B: MessagingBackend>(
    State(state): State<AppState<B>>,
    Path(content_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Ok(id) = content_id.parse::<i64>() else {
        warn!(content_id = %content_id, "stream requested for non-numeric id");
        return not_found();
    };
    let episode_id = EpisodeId(id);

    let handle = match state.bridge.resolve(episode_id).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(%episode_id, reason = e.kind(), error = %e, "stream unavailable");
            return not_found();
        }
    };

    let range_start = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range_start);
    let plan = plan_response(range_start, handle.size_bytes());
    info!(
        %episode_id,
        offset = plan.offset,
        size_bytes = ?handle.size_bytes(),
        status = plan.status.as_u16(),
        "serving stream"
    );

    let content_type = handle
        .mime_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let mut response_headers: Vec<(HeaderName, String)> = vec![
        (header::CONTENT_TYPE, content_type),
        (header::ACCEPT_RANGES, "bytes".to_string()),
    ];
    if let Some(length) = plan.content_length {
        response_headers.push((header::CONTENT_LENGTH, length.to_string()));
    }
    if let Some(range) = &plan.content_range {
        response_headers.push((header::CONTENT_RANGE, range.clone()));
    }

    if !plan.has_body() {
        return (plan.status, AppendHeaders(response_headers)).into_response();
    }

    let stream = match state.bridge.open_stream(&handle, plan.offset).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%episode_id, error = %e, "opening stream failed");
            return not_found();
        }
    };
    let stream = stream.take_until(state.shutdown.clone().cancelled_owned());
    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));

    (plan.status, AppendHeaders(response_headers), body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_range() {
        assert_eq!(parse_range_start("bytes=5000000-"), Some(5_000_000));
        assert_eq!(parse_range_start("bytes=0-"), Some(0));
    }

    #[test]
    fn closed_range_keeps_start_only() {
        assert_eq!(parse_range_start("bytes=100-199"), Some(100));
    }

    #[test]
    fn unsupported_ranges_are_ignored() {
        assert_eq!(parse_range_start("bytes=-500"), None);
        assert_eq!(parse_range_start("bytes=0-99,200-"), None);
        assert_eq!(parse_range_start("items=0-"), None);
        assert_eq!(parse_range_start("bytes=abc-"), None);
        assert_eq!(parse_range_start("bytes=10-x"), None);
        assert_eq!(parse_range_start(""), None);
    }

    #[test]
    fn known_size_with_range_is_partial() {
        let plan = plan_response(Some(5_000_000), Some(10_000_000));
        assert_eq!(plan.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(plan.content_length, Some(5_000_000));
        assert_eq!(
            plan.content_range.as_deref(),
            Some("bytes 5000000-9999999/10000000")
        );
    }

    #[test]
    fn range_from_zero_is_still_partial() {
        let plan = plan_response(Some(0), Some(10));
        assert_eq!(plan.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(plan.content_range.as_deref(), Some("bytes 0-9/10"));
    }

    #[test]
    fn known_size_without_range_is_full() {
        let plan = plan_response(None, Some(10_000_000));
        assert_eq!(plan.status, StatusCode::OK);
        assert_eq!(plan.content_length, Some(10_000_000));
        assert_eq!(plan.content_range, None);
    }

    #[test]
    fn unknown_size_has_no_length_headers() {
        let plan = plan_response(Some(4096), None);
        assert_eq!(plan.status, StatusCode::OK);
        assert_eq!(plan.offset, 4096);
        assert_eq!(plan.content_length, None);
        assert_eq!(plan.content_range, None);
    }

    #[test]
    fn offset_past_end_is_unsatisfiable() {
        let plan = plan_response(Some(10), Some(10));
        assert_eq!(plan.status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(plan.content_range.as_deref(), Some("bytes */10"));
        assert!(!plan.has_body());
    }
}
