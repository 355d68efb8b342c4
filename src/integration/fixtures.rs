//! Fake CDN and session service

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;

pub const MASTER: &str = "#EXTM3U\n\
#EXT-X-VERSION:4\n\
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"es\",URI=\"audio/index.m3u8\"\n\
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720,AUDIO=\"aud\"\n\
720p/index.m3u8\n";

/// Served as `text/plain` so only the `.m3u8` path marks it as a playlist.
pub const MEDIA: &str = "#EXTM3U\r\n\
#EXT-X-TARGETDURATION:6\r\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"/keys/k1\"\r\n\
#EXTINF:6.000,\r\n\
seg0.ts\r\n\
#EXT-X-ENDLIST\r\n";

pub const SEGMENT: &[u8] = b"\x47\x40\x00\x10segment-bytes";

/// Handle to a running upstream.
pub struct Upstream {
    pub addr: SocketAddr,
}

impl Upstream {
    /// Start the upstream on an ephemeral loopback port.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(addr)).await.unwrap();
        });
        Self { addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

fn router(addr: SocketAddr) -> Router {
    // Same server under another host name, for redirects off the allowlist.
    let elsewhere = format!("http://localhost:{}/videos/720p/seg0.ts", addr.port());

    Router::new()
        .route("/videos/master.m3u8", get(master))
        .route("/videos/720p/index.m3u8", get(media))
        .route("/videos/720p/seg0.ts", get(segment))
        .route("/videos/missing.ts", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/moved/master.m3u8",
            get(|| async { Redirect::temporary("/videos/master.m3u8") }),
        )
        .route(
            "/escape",
            get(move || async move { Redirect::temporary(&elsewhere) }),
        )
        .route("/videos/ranged.m3u8", get(ranged_playlist))
        .route("/videos/stalled.m3u8", get(stalled_playlist))
        .route("/session", get(session))
}

async fn master() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
        MASTER,
    )
}

async fn media() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], MEDIA)
}

/// Answers a `Range` request with a partial playlist, like a CDN would.
async fn ranged_playlist(headers: HeaderMap) -> Response {
    let content_type = (header::CONTENT_TYPE, "application/vnd.apple.mpegurl");
    if headers.contains_key(header::RANGE) {
        (StatusCode::PARTIAL_CONTENT, [content_type], &MEDIA[..10]).into_response()
    } else {
        ([content_type], MEDIA).into_response()
    }
}

/// Accepts the connection, then never answers in time.
async fn stalled_playlist() -> impl IntoResponse {
    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    MEDIA
}

/// Serves SEGMENT, honouring a single `bytes=start-end` range.
async fn segment(headers: HeaderMap) -> Response {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.split_once('-'))
        .and_then(|(start, end)| Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?)));

    match range {
        Some((start, end)) if start <= end && end < SEGMENT.len() => Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, "video/mp2t")
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, SEGMENT.len()),
            )
            .body(Body::from(&SEGMENT[start..=end]))
            .unwrap(),
        _ => Response::builder()
            .header(header::CONTENT_TYPE, "video/mp2t")
            .body(Body::from(SEGMENT))
            .unwrap(),
    }
}

/// `Bearer good` is a subscriber to Classes, `Bearer lapsed` has only an
/// expired plan, `Bearer broken` makes the service fail.
async fn session(headers: HeaderMap) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match token {
        "Bearer good" => Json(json!({
            "user": {
                "role": "USER",
                "subscriptions": [
                    {"plan": "Classes", "status": "active", "expiresAt": "2999-01-01"}
                ]
            }
        }))
        .into_response(),
        "Bearer lapsed" => Json(json!({
            "role": "USER",
            "subscriptions": [{"plan": "Classes", "expiresAt": "2020-01-01T00:00:00Z"}]
        }))
        .into_response(),
        "Bearer broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}
