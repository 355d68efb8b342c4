//! Core rules for the academy platform.
//!
//! Two independent, synchronous components:
//! - [`access`]: decides whether a user's role and subscriptions grant a
//!   module or plan, plus the page guard built on top of it.
//! - [`manifest`]: rewrites HLS playlists so every segment, sub-playlist
//!   and `URI="..."` attribute is fetched through a proxy endpoint.

pub mod access;
pub(crate) mod error;
pub mod manifest;

#[cfg(test)]
pub(crate) mod tests;

pub use access::{
    granted_plans, guard, has_access, has_any_access, DenyReason, Expiry, GuardDecision,
    GuardRoutes, Role, SessionState, Subscription, SubscriptionRecord, User,
};
pub use error::{ResolveError, Result};
pub use manifest::{
    classify, proxy_url, resolve_reference, rewrite, rewrite_with_report, uri_references,
    ManifestLine, RewriteOptions, RewriteReport,
};
