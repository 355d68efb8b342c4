//! Router against the fake upstream

use academy_gate_lib::{classify, proxy_url, uri_references, ManifestLine, RewriteOptions};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

use super::fixtures::{Upstream, SEGMENT};
use crate::config::ServerConfig;
use crate::http::create_router;
use crate::state::AppState;

fn gate(upstream: &Upstream) -> Router {
    gate_with(upstream, |_| {})
}

fn gate_with(upstream: &Upstream, adjust: impl FnOnce(&mut ServerConfig)) -> Router {
    let mut config = ServerConfig::default();
    config.proxy.allowed_hosts = vec!["127.0.0.1".to_string()];
    config.guard.session_url = Some(upstream.url("/session"));
    adjust(&mut config);
    create_router(Arc::new(AppState::new(config).unwrap()))
}

fn proxy_request(target: &str) -> Request<Body> {
    let uri = proxy_url(target, &RewriteOptions::default());
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn proxied(absolute: &str) -> String {
    proxy_url(absolute, &RewriteOptions::default())
}

/// Every reference in `text` points at the proxy.
fn assert_all_proxied(text: &str) {
    let options = RewriteOptions::default();
    for line in text.lines() {
        let references = match classify(line, &options) {
            ManifestLine::TagWithUri(tag) => uri_references(tag),
            ManifestLine::MediaReference(reference) => vec![reference],
            ManifestLine::Other(other) => vec![other],
            ManifestLine::Blank | ManifestLine::Tag(_) => continue,
        };
        for reference in references {
            assert!(
                reference.starts_with("/api/video-proxy?url=http"),
                "not proxied: {}",
                line
            );
        }
    }
}

#[tokio::test]
async fn test_master_playlist_rewritten_after_redirect() {
    let upstream = Upstream::start().await;
    let response = gate(&upstream)
        .oneshot(proxy_request(&upstream.url("/moved/master.m3u8")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-cache");

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    // Relative references follow the redirect target, not the requested URL.
    let variant = proxied(&upstream.url("/videos/720p/index.m3u8"));
    let audio = proxied(&upstream.url("/videos/audio/index.m3u8"));
    assert!(text.lines().any(|line| line == variant), "{}", text);
    assert!(text.contains(&format!("URI=\"{}\"", audio)), "{}", text);
    assert!(text.contains("AUDIO=\"aud\""));
    assert_all_proxied(&text);
}

#[tokio::test]
async fn test_media_playlist_detected_by_path() {
    let upstream = Upstream::start().await;
    let response = gate(&upstream)
        .oneshot(proxy_request(&upstream.url("/videos/720p/index.m3u8")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.apple.mpegurl"
    );

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let expected = format!(
        "#EXTM3U\r\n\
#EXT-X-TARGETDURATION:6\r\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"{}\"\r\n\
#EXTINF:6.000,\r\n\
{}\r\n\
#EXT-X-ENDLIST\r\n",
        proxied(&upstream.url("/keys/k1")),
        proxied(&upstream.url("/videos/720p/seg0.ts")),
    );
    assert_eq!(text, expected);
    assert_all_proxied(&text);
}

#[tokio::test]
async fn test_segment_passthrough() {
    let upstream = Upstream::start().await;
    let response = gate(&upstream)
        .oneshot(proxy_request(&upstream.url("/videos/720p/seg0.ts")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "video/mp2t");
    assert_eq!(response.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
    assert_eq!(body_bytes(response).await, SEGMENT);
}

#[tokio::test]
async fn test_segment_range_forwarded() {
    let upstream = Upstream::start().await;
    let mut request = proxy_request(&upstream.url("/videos/720p/seg0.ts"));
    request
        .headers_mut()
        .insert(header::RANGE, "bytes=0-3".parse().unwrap());

    let response = gate(&upstream).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(header::CONTENT_RANGE).unwrap(),
        format!("bytes 0-3/{}", SEGMENT.len()).as_str()
    );
    assert_eq!(body_bytes(response).await, &SEGMENT[..4]);
}

#[tokio::test]
async fn test_redirect_to_other_host_refused() {
    let upstream = Upstream::start().await;
    let app = gate(&upstream);
    let elsewhere = format!("http://localhost:{}/videos/720p/seg0.ts", upstream.addr.port());

    let response = app
        .clone()
        .oneshot(proxy_request(&elsewhere))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Same target, reached through a redirect from an allowed host.
    let response = app
        .oneshot(proxy_request(&upstream.url("/escape")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_ne!(body_bytes(response).await, SEGMENT);
}

#[tokio::test]
async fn test_playlist_fetched_whole_despite_range() {
    let upstream = Upstream::start().await;
    let mut request = proxy_request(&upstream.url("/videos/ranged.m3u8"));
    request
        .headers_mut()
        .insert(header::RANGE, "bytes=0-9".parse().unwrap());

    let response = gate(&upstream).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.ends_with("#EXT-X-ENDLIST\r\n"), "{}", text);
    assert!(text.contains(&proxied(&upstream.url("/videos/seg0.ts"))));
}

#[tokio::test]
async fn test_stalled_upstream_times_out() {
    let upstream = Upstream::start().await;
    let app = gate_with(&upstream, |config| config.proxy.upstream_timeout_secs = 1);

    let response = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        app.oneshot(proxy_request(&upstream.url("/videos/stalled.m3u8"))),
    )
    .await
    .expect("proxy should give up on a stalled upstream")
    .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_upstream_status_passed_through() {
    let upstream = Upstream::start().await;
    let response = gate(&upstream)
        .oneshot(proxy_request(&upstream.url("/videos/missing.ts")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let upstream = Upstream::start().await;

    // A port that was just released has nothing listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = listener.local_addr().unwrap();
    drop(listener);

    let app = gate(&upstream);
    let response = app
        .clone()
        .oneshot(proxy_request(&format!("http://{}/a.m3u8", closed)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let metrics = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = String::from_utf8(body_bytes(metrics).await).unwrap();
    assert!(text.contains("academy_gate_upstream_errors_total 1\n"));
}

async fn guard_with(upstream: &Upstream, module: &str, token: Option<&str>) -> Response {
    let mut request = Request::get(format!("/api/access/{}", module));
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    gate(upstream)
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_guard_renders_for_subscriber() {
    let upstream = Upstream::start().await;
    let response = guard_with(&upstream, "Classes", Some("good")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["decision"], "render");
}

#[tokio::test]
async fn test_guard_redirects_lapsed_subscriber_to_plans() {
    let upstream = Upstream::start().await;
    let body = body_json(guard_with(&upstream, "Classes", Some("lapsed")).await).await;

    assert_eq!(body["decision"], "redirect");
    assert_eq!(body["location"], "/plans");
    assert_eq!(body["reason"], "access_required");
}

#[tokio::test]
async fn test_guard_redirects_other_module_to_plans() {
    let upstream = Upstream::start().await;
    let body = body_json(guard_with(&upstream, "Signals", Some("good")).await).await;
    assert_eq!(body["location"], "/plans");
}

#[tokio::test]
async fn test_guard_signed_out() {
    let upstream = Upstream::start().await;

    for token in [None, Some("unknown")] {
        let body = body_json(guard_with(&upstream, "Classes", token).await).await;
        assert_eq!(body["decision"], "redirect");
        assert_eq!(body["location"], "/login");
        assert_eq!(body["reason"], "sign_in_required");
    }
}

#[tokio::test]
async fn test_guard_session_service_failure() {
    let upstream = Upstream::start().await;
    let response = guard_with(&upstream, "Classes", Some("broken")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
