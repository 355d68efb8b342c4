//! Video proxy
//!
//! `GET <endpoint>?url=<absolute URL>` fetches the URL upstream. Playlists
//! are rewritten so every reference comes back through this endpoint; any
//! other response (segments, keys, subtitles) is streamed through as-is.

use academy_gate_lib::rewrite_with_report;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use bytes::Bytes;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use url::Url;

use crate::error::{RedirectRefused, Result, ServerError};
use crate::state::AppState;

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Response headers copied from upstream on passthrough.
const PASSTHROUGH_HEADERS: [header::HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// GET /api/video-proxy?url=...
pub async fn video_proxy(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    state.metrics.record_request("video_proxy");

    let target = parse_target(&state, query.url.as_deref())?;

    let mut request = state.http_client.get(target.clone());
    if let Some(range) = headers.get(header::RANGE).filter(|_| forwards_range(&target)) {
        request = request.header(header::RANGE, range.clone());
    }

    let upstream = request.send().await.map_err(|e| {
        if let Some(refused) = redirect_refused(&e) {
            tracing::warn!("Refusing redirect from {}: {}", redact(&target), refused);
            return ServerError::Forbidden(refused.to_string());
        }
        state.metrics.record_upstream_error();
        ServerError::Upstream(format!("{}: {}", redact(&target), e))
    })?;

    let final_host = upstream.url().host_str().unwrap_or_default();
    if !state.config.proxy.host_allowed(final_host) {
        return Err(ServerError::Forbidden(format!(
            "Host not allowed: {}",
            final_host
        )));
    }
    tracing::debug!(
        "Upstream {} for {}",
        upstream.status(),
        redact(upstream.url())
    );

    if upstream.status().is_success() && is_playlist(&upstream) {
        playlist_response(&state, upstream).await
    } else {
        passthrough_response(&state, upstream)
    }
}

/// Validate the `url` parameter: present, absolute http(s), allowed host.
fn parse_target(state: &AppState, raw: Option<&str>) -> Result<Url> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing url parameter".to_string()))?;

    let target = Url::parse(raw.trim())
        .map_err(|e| ServerError::BadRequest(format!("Invalid url parameter: {}", e)))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(ServerError::BadRequest(format!(
            "Unsupported url scheme: {}",
            target.scheme()
        )));
    }

    let host = target.host_str().unwrap_or_default();
    if !state.config.proxy.host_allowed(host) {
        tracing::warn!("Refusing to proxy host {}", host);
        return Err(ServerError::Forbidden(format!("Host not allowed: {}", host)));
    }

    Ok(target)
}

/// Playlists are always fetched whole; a partial playlist cannot be rewritten.
fn forwards_range(target: &Url) -> bool {
    !target.path().to_ascii_lowercase().ends_with(".m3u8")
}

/// The redirect policy's refusal, if that is why the fetch failed.
fn redirect_refused(error: &reqwest::Error) -> Option<&RedirectRefused> {
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        if let Some(refused) = err.downcast_ref::<RedirectRefused>() {
            return Some(refused);
        }
        source = err.source();
    }
    None
}

fn is_playlist(response: &reqwest::Response) -> bool {
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    content_type.contains("mpegurl")
        || response
            .url()
            .path()
            .to_ascii_lowercase()
            .ends_with(".m3u8")
}

async fn playlist_response(state: &AppState, upstream: reqwest::Response) -> Result<Response> {
    let status = upstream.status();
    // Relative references are relative to where the playlist ended up
    // after redirects, not to the URL we were asked for.
    let source = upstream.url().clone();

    let body = upstream.bytes().await.map_err(|e| {
        state.metrics.record_upstream_error();
        ServerError::Upstream(format!("{}: {}", redact(&source), e))
    })?;

    let text = decode_playlist(&body);
    let report = rewrite_with_report(&text, source.as_str(), &state.rewrite_options);
    state.metrics.record_manifest(report.rewritten, report.skipped);
    if report.skipped > 0 {
        tracing::warn!(
            "{} playlist reference(s) left unmodified in {}",
            report.skipped,
            redact(&source)
        );
    }

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(report.text))?;
    Ok(response)
}

fn passthrough_response(state: &AppState, upstream: reqwest::Response) -> Result<Response> {
    state.metrics.record_passthrough();

    let mut builder = Response::builder().status(upstream.status());
    if let Some(headers) = builder.headers_mut() {
        for name in PASSTHROUGH_HEADERS {
            if let Some(value) = upstream.headers().get(&name) {
                headers.insert(name, value.clone());
            }
        }
        headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/octet-stream"));
        headers
            .entry(header::ACCEPT_RANGES)
            .or_insert(HeaderValue::from_static("bytes"));
    }

    // Stream the body without buffering it.
    let body = Body::from_stream(upstream.bytes_stream());
    Ok(builder.body(body)?)
}

/// Playlists are UTF-8; a leading BOM is dropped and invalid bytes replaced.
fn decode_playlist(body: &Bytes) -> Cow<'_, str> {
    let bytes = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&body[..]);
    String::from_utf8_lossy(bytes)
}

/// Scheme, host and path only; query strings often carry CDN signatures.
fn redact(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}
