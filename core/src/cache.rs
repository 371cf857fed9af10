//! Time-boxed lookup cache.
//!
//! Entries expire after a fixed TTL measured on the desk clock. Writes to
//! the underlying tables never invalidate an entry, so a reader may see a
//! list up to one TTL old.

use crate::error::DeskResult;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug)]
pub struct TtlCache<T> {
    ttl:   Duration,
    entry: Option<(T, DateTime<Utc>)>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Return the cached value, or run `load` if absent or expired at `now`.
    pub fn get_or_load<F>(&mut self, now: DateTime<Utc>, load: F) -> DeskResult<T>
    where
        F: FnOnce() -> DeskResult<T>,
    {
        if let Some((value, loaded_at)) = &self.entry {
            if now - *loaded_at < self.ttl {
                return Ok(value.clone());
            }
        }
        let value = load()?;
        log::debug!("cache: refreshed entry at {now}");
        self.entry = Some((value.clone(), now));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    #[test]
    fn serves_cached_value_until_ttl_passes() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let loads = Cell::new(0);
        let mut cache = TtlCache::new(Duration::seconds(3600));
        let load = || -> DeskResult<Vec<String>> {
            loads.set(loads.get() + 1);
            Ok(vec![format!("load{}", loads.get())])
        };

        assert_eq!(cache.get_or_load(t0, load).unwrap(), vec!["load1"]);
        let within = t0 + Duration::seconds(3599);
        assert_eq!(cache.get_or_load(within, load).unwrap(), vec!["load1"]);
        let after = t0 + Duration::seconds(3600);
        assert_eq!(cache.get_or_load(after, load).unwrap(), vec!["load2"]);
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn failed_load_leaves_cache_empty() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let mut cache: TtlCache<i32> = TtlCache::new(Duration::seconds(60));
        let err = cache.get_or_load(t0, || Err(anyhow::anyhow!("db down").into()));
        assert!(err.is_err());
        assert_eq!(cache.get_or_load(t0, || Ok(5)).unwrap(), 5);
    }
}
