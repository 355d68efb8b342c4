//! Access evaluation over a whole user

use chrono::{DateTime, Utc};

use super::subscription::User;

/// Whether `user` may access the module or plan named `target` at `now`.
///
/// Admins always pass. Everyone else needs at least one subscription entry
/// that grants `target`; anything unreadable counts as no grant.
pub fn has_access(user: &User, target: &str, now: DateTime<Utc>) -> bool {
    if user.role.is_admin() {
        return true;
    }
    user.subscriptions
        .iter()
        .any(|subscription| subscription.grants(target, now))
}

/// Like [`has_access`], for pages unlocked by any one of several modules.
pub fn has_any_access<S: AsRef<str>>(user: &User, targets: &[S], now: DateTime<Utc>) -> bool {
    targets
        .iter()
        .any(|target| has_access(user, target.as_ref(), now))
}

/// Plans currently in force for `user`, in subscription order, without
/// duplicates. The admin override does not add anything here.
pub fn granted_plans(user: &User, now: DateTime<Utc>) -> Vec<&str> {
    let mut plans: Vec<&str> = Vec::new();
    for subscription in &user.subscriptions {
        if let Some(plan) = subscription.plan() {
            if subscription.is_live(now) && !plans.contains(&plan) {
                plans.push(plan);
            }
        }
    }
    plans
}
