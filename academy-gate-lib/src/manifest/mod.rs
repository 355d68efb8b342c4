//! HLS manifest rewriting
//!
//! Playlists fetched from the CDN reference their segments, variant
//! playlists, renditions and keys by relative or absolute URL. Rewriting
//! routes every one of those references through a proxy endpoint (or, with
//! proxying off, just makes them absolute), line by line:
//! - [`line`]: classification of a single playlist line
//! - [`resolve`]: reference resolution and proxy URL construction
//! - [`rewriter`]: the whole-playlist pass

pub mod line;
pub mod resolve;
pub mod rewriter;

pub use line::{classify, uri_references, ManifestLine};
pub use resolve::{proxy_url, resolve_reference};
pub use rewriter::{rewrite, rewrite_with_report, RewriteReport};

/// Default path of the video proxy route.
pub const DEFAULT_PROXY_ENDPOINT: &str = "/api/video-proxy";

/// How references are rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Path (or URL) of the proxy route; the target goes in its `url` parameter.
    pub proxy_endpoint: String,
    /// When false, references are made absolute but not proxied.
    pub proxy_enabled: bool,
    /// File extensions, without the dot, that mark a line as a media reference.
    pub media_extensions: Vec<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            proxy_enabled: true,
            media_extensions: vec!["m3u8".to_string(), "ts".to_string()],
        }
    }
}

impl RewriteOptions {
    pub fn proxied(endpoint: impl Into<String>) -> Self {
        Self {
            proxy_endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Absolute URLs only, for direct-CDN playback.
    pub fn direct() -> Self {
        Self {
            proxy_enabled: false,
            ..Default::default()
        }
    }
}
