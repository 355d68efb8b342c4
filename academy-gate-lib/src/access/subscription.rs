//! Subscription entries and the per-entry grant rule

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;

/// Status value that keeps a structured subscription alive.
pub const ACTIVE_STATUS: &str = "active";

/// A user as returned by the session service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl User {
    pub fn new(role: Role, subscriptions: Vec<Subscription>) -> Self {
        Self {
            role,
            subscriptions,
        }
    }
}

/// One entry of a user's `subscriptions` array.
///
/// The array mixes bare plan names (permanent grants) with structured
/// records. Anything else is kept as `Unrecognized` so that a single bad
/// entry does not make the whole user unreadable; it never grants access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subscription {
    Plan(String),
    Record(SubscriptionRecord),
    Unrecognized(Value),
}

impl Subscription {
    /// A permanent grant for `plan`.
    pub fn permanent(plan: impl Into<String>) -> Self {
        Subscription::Plan(plan.into())
    }

    /// Plan name, if the entry carries one.
    pub fn plan(&self) -> Option<&str> {
        match self {
            Subscription::Plan(plan) => Some(plan),
            Subscription::Record(record) => record.plan.as_deref(),
            Subscription::Unrecognized(_) => None,
        }
    }

    /// Whether the entry is in force at `now`, regardless of its plan.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self {
            Subscription::Plan(_) => true,
            Subscription::Record(record) => record.is_live(now),
            Subscription::Unrecognized(_) => false,
        }
    }

    /// Whether this entry grants `target` at `now`.
    pub fn grants(&self, target: &str, now: DateTime<Utc>) -> bool {
        self.plan() == Some(target) && self.is_live(now)
    }
}

impl From<SubscriptionRecord> for Subscription {
    fn from(record: SubscriptionRecord) -> Self {
        Subscription::Record(record)
    }
}

/// Structured subscription, usually created by the checkout webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Kept raw: the stored representation varies and a bad value must
    /// deny access instead of failing deserialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl SubscriptionRecord {
    pub fn for_plan(plan: impl Into<String>) -> Self {
        Self {
            plan: Some(plan.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Store the expiry as epoch milliseconds, the checkout webhook's format.
    pub fn with_expiry(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(Value::from(at.timestamp_millis()));
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn expiry(&self) -> Expiry {
        Expiry::parse(self.expires_at.as_ref())
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        if self.deleted == Some(true) {
            return false;
        }
        if let Some(status) = &self.status {
            if status != ACTIVE_STATUS {
                return false;
            }
        }
        self.expiry().is_live(now)
    }
}

/// Parsed `expiresAt` of a structured subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
    /// Present but unreadable. Treated as already expired.
    Malformed,
}

impl Expiry {
    /// Accepted shapes: epoch milliseconds (number or numeric string),
    /// RFC 3339 text, a bare `YYYY-MM-DD` date (midnight UTC), or a
    /// document-store timestamp object with `seconds`/`_seconds`.
    pub fn parse(value: Option<&Value>) -> Expiry {
        let value = match value {
            None | Some(Value::Null) => return Expiry::Never,
            Some(value) => value,
        };
        match parse_timestamp(value) {
            Some(at) => Expiry::At(at),
            None => {
                tracing::debug!("Unreadable subscription expiry: {}", value);
                Expiry::Malformed
            }
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => true,
            Expiry::At(at) => *at > now,
            Expiry::Malformed => false,
        }
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(millis) => DateTime::from_timestamp_millis(millis),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| DateTime::from_timestamp_millis(f as i64)),
        },
        Value::String(s) => parse_text(s.trim()),
        Value::Object(map) => {
            let secs = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = match map.get("nanoseconds").or_else(|| map.get("_nanoseconds")) {
                Some(v) => u32::try_from(v.as_u64()?).ok()?,
                None => 0,
            };
            DateTime::from_timestamp(secs, nanos)
        }
        _ => None,
    }
}

fn parse_text(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(millis) = s.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
