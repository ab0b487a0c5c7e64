use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::api::ProfileLookup;

pub const UNKNOWN_NAME: &str = "Unknown";

type Pacer = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Owner identifier to display name, memoized for the whole session.
///
/// Each identifier gets one cell; concurrent callers for the same identifier
/// wait on the same lookup. Failures are cached as [`UNKNOWN_NAME`] and never
/// retried.
pub struct NameResolver<L> {
    lookup: L,
    cache: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
    pacer: Option<Pacer>,
}

impl<L: ProfileLookup> NameResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: Mutex::new(HashMap::new()),
            pacer: None,
        }
    }

    /// Caps outbound lookups at `per_second`.
    pub fn with_rate(lookup: L, per_second: u32) -> Self {
        let pacer = NonZeroU32::new(per_second).map(|rate| RateLimiter::direct(Quota::per_second(rate)));
        Self {
            lookup,
            cache: Mutex::new(HashMap::new()),
            pacer,
        }
    }

    pub async fn resolve(&self, identifier: &str) -> String {
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            cache
                .entry(identifier.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(|| self.fetch(identifier)).await.clone()
    }

    /// Resolves one page worth of owners as a single joined batch.
    pub async fn resolve_page(&self, owners: &[Option<String>]) -> Vec<String> {
        join_all(owners.iter().map(|owner| async move {
            match owner.as_deref() {
                Some(id) if !id.trim().is_empty() => self.resolve(id).await,
                _ => UNKNOWN_NAME.to_string(),
            }
        }))
        .await
    }

    pub fn cached(&self, identifier: &str) -> Option<String> {
        let cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        cache.get(identifier).and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        let cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        cache.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn fetch(&self, identifier: &str) -> String {
        if let Some(pacer) = self.pacer.as_ref() {
            pacer.until_ready().await;
        }
        match self.lookup.profile_name(identifier).await {
            Ok(Some(name)) => {
                debug!(identifier, name = %name, "resolved owner");
                name
            }
            Ok(None) => {
                warn!(identifier, "no profile for owner");
                UNKNOWN_NAME.to_string()
            }
            Err(e) => {
                warn!(identifier, error = %e, "owner lookup failed");
                UNKNOWN_NAME.to_string()
            }
        }
    }
}
