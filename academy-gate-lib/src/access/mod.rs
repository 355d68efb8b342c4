//! Subscription and module access rules
//!
//! This module decides whether a user may see a gated area:
//! - Roles, with the admin override
//! - Subscription entries (bare plan names or structured records)
//! - The grant rule, evaluated against an explicit `now`
//! - The page guard, which folds in whether the session has resolved

pub mod evaluator;
pub mod role;
pub mod session;
pub mod subscription;

pub use evaluator::{granted_plans, has_access, has_any_access};
pub use role::Role;
pub use session::{guard, DenyReason, GuardDecision, GuardRoutes, SessionState};
pub use subscription::{Expiry, Subscription, SubscriptionRecord, User};
