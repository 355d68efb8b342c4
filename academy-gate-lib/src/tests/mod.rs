//! Scenario tests
//!
//! End-to-end checks over realistic inputs:
//! - CDN playlists rewritten for the dev proxy and for direct playback
//! - Rewritten playlists still validating as HLS
//! - Subscriber documents as stored by the auth service
