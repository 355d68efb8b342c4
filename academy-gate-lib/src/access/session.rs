//! Session resolution state and the page guard
//!
//! A guard has three possible inputs: the session is still being looked up,
//! it resolved to a user, or there is no session at all. Each maps to
//! exactly one [`GuardDecision`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluator::has_access;
use super::subscription::User;

/// Where the caller's session currently stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user", rename_all = "lowercase")]
pub enum SessionState {
    /// Lookup has not finished yet.
    Pending,
    Resolved(User),
    /// Not signed in, or the session service does not know the caller.
    Absent,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Resolved(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Pending)
    }
}

/// Redirect targets used by [`guard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRoutes {
    pub sign_in: String,
    pub upgrade: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            sign_in: "/login".to_string(),
            upgrade: "/plans".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    SignInRequired,
    AccessRequired,
}

/// What a gated page should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GuardDecision {
    Render,
    /// Show a loading state; the session has not resolved.
    Wait,
    Redirect { location: String, reason: DenyReason },
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }
}

/// Decide what a page gated on `target` should do for `session` at `now`.
pub fn guard(
    session: &SessionState,
    target: &str,
    now: DateTime<Utc>,
    routes: &GuardRoutes,
) -> GuardDecision {
    match session {
        SessionState::Pending => GuardDecision::Wait,
        SessionState::Absent => GuardDecision::Redirect {
            location: routes.sign_in.clone(),
            reason: DenyReason::SignInRequired,
        },
        SessionState::Resolved(user) if has_access(user, target, now) => GuardDecision::Render,
        SessionState::Resolved(_) => GuardDecision::Redirect {
            location: routes.upgrade.clone(),
            reason: DenyReason::AccessRequired,
        },
    }
}
