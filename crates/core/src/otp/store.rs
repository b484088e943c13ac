//! Storage for issued OTP records.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live one-time code for one email key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Six ASCII digits.
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// Display name given when the code was requested.
    pub name: String,
}

impl OtpRecord {
    /// Whether the record is past its expiry at `now`.
    ///
    /// A record is still valid at exactly `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Keyed storage for OTP records.
///
/// Keys are already-normalized email addresses. Implementations must give
/// last-writer-wins semantics on [`OtpStore::set`]. Expiry is carried in the
/// record and checked by the caller on read; stores don't need to sweep.
///
/// [`MemoryOtpStore`] is process-local. Running more than one storefront
/// instance requires an implementation backed by a shared store, otherwise a
/// code issued by one instance can't be verified by another.
pub trait OtpStore: Send + Sync {
    /// Fetch the record for `key`.
    fn get(&self, key: &str) -> Option<OtpRecord>;

    /// Insert or overwrite the record for `key`.
    fn set(&self, key: &str, record: OtpRecord);

    /// Delete the record for `key`, returning it if present.
    fn remove(&self, key: &str) -> Option<OtpRecord>;
}

impl<T: OtpStore + ?Sized> OtpStore for Box<T> {
    fn get(&self, key: &str) -> Option<OtpRecord> {
        (**self).get(key)
    }

    fn set(&self, key: &str, record: OtpRecord) {
        (**self).set(key, record);
    }

    fn remove(&self, key: &str) -> Option<OtpRecord> {
        (**self).remove(key)
    }
}

/// In-process OTP store.
#[derive(Debug, Default)]
pub struct MemoryOtpStore {
    records: Mutex<HashMap<String, OtpRecord>>,
}

impl MemoryOtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Every critical section is a single map call; poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, OtpRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OtpStore for MemoryOtpStore {
    fn get(&self, key: &str) -> Option<OtpRecord> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, record: OtpRecord) {
        self.lock().insert(key.to_owned(), record);
    }

    fn remove(&self, key: &str) -> Option<OtpRecord> {
        self.lock().remove(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn record(code: &str) -> OtpRecord {
        OtpRecord {
            code: code.to_owned(),
            expires_at: Utc::now() + TimeDelta::minutes(10),
            name: "Al".to_owned(),
        }
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryOtpStore::new();
        store.set("a@b.com", record("111111"));
        store.set("a@b.com", record("222222"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a@b.com").unwrap().code, "222222");
    }

    #[test]
    fn test_remove_returns_record() {
        let store = MemoryOtpStore::new();
        store.set("a@b.com", record("111111"));

        assert_eq!(store.remove("a@b.com").unwrap().code, "111111");
        assert!(store.remove("a@b.com").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_boxed_store_delegates() {
        let store: Box<dyn OtpStore> = Box::new(MemoryOtpStore::new());
        store.set("a@b.com", record("111111"));

        assert_eq!(store.get("a@b.com").unwrap().code, "111111");
        assert!(store.remove("a@b.com").is_some());
        assert!(store.get("a@b.com").is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let rec = record("111111");
        assert!(!rec.is_expired_at(rec.expires_at));
        assert!(rec.is_expired_at(rec.expires_at + TimeDelta::milliseconds(1)));
    }
}
