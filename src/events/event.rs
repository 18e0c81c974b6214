//! Event Module
//!
//! Lifecycle notifications published by the store.

use std::fmt;

use serde::Serialize;

use crate::timer::Timestamp;

// == Event Kind ==
/// The closed set of lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A live entry was returned by `get`
    Hit,
    /// `get` found nothing, or only an expired entry
    Miss,
    /// An entry's timer fired
    Expired,
    /// A new key was rejected because the store is at capacity
    Drop,
    /// An entry was installed or replaced
    Set,
    /// An entry was removed
    Del,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 6] = [
        EventKind::Hit,
        EventKind::Miss,
        EventKind::Expired,
        EventKind::Drop,
        EventKind::Set,
        EventKind::Del,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Hit => "hit",
            EventKind::Miss => "miss",
            EventKind::Expired => "expired",
            EventKind::Drop => "drop",
            EventKind::Set => "set",
            EventKind::Del => "del",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Event ==
/// One lifecycle notification.
///
/// `value` is absent on `miss`; `expires_at` is present only on `hit`, `set`
/// and `del`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event<V> {
    pub kind: EventKind,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl<V> Event<V> {
    pub fn hit(key: &str, value: V, expires_at: Timestamp) -> Self {
        Self::new(EventKind::Hit, key, Some(value), Some(expires_at))
    }

    pub fn miss(key: &str) -> Self {
        Self::new(EventKind::Miss, key, None, None)
    }

    pub fn expired(key: &str, value: V) -> Self {
        Self::new(EventKind::Expired, key, Some(value), None)
    }

    pub fn drop(key: &str, value: V) -> Self {
        Self::new(EventKind::Drop, key, Some(value), None)
    }

    pub fn set(key: &str, value: V, expires_at: Timestamp) -> Self {
        Self::new(EventKind::Set, key, Some(value), Some(expires_at))
    }

    pub fn del(key: &str, value: V, expires_at: Timestamp) -> Self {
        Self::new(EventKind::Del, key, Some(value), Some(expires_at))
    }

    fn new(kind: EventKind, key: &str, value: Option<V>, expires_at: Option<Timestamp>) -> Self {
        Self {
            kind,
            key: key.to_string(),
            value,
            expires_at,
        }
    }
}
