use dashmap::DashMap;
use tokio::sync::Mutex;

/// Per-subscription logical lock (§5): serializes admission, fast-trade
/// counter updates, and Position Ledger mutations for one subscription pk.
/// Shaped after the reference crate's `DashMap`-keyed concurrency pattern
/// (`DedupCache`), swapping the `Instant` value for a `Mutex<()>` so the
/// map itself doubles as the lock table.
///
/// This is the single-process realization of the lock; the multi-process
/// fallback (row-level CAS via `Store::apply_subscription_delta`) is
/// always in effect underneath it, so horizontal scaling needs no
/// different code path.
#[derive(Default)]
pub struct SubscriptionLocks {
    locks: DashMap<i64, std::sync::Arc<Mutex<()>>>,
}

impl SubscriptionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, subscription_pk: i64) -> OwnedGuard {
        let mutex = self
            .locks
            .entry(subscription_pk)
            .or_insert_with(|| std::sync::Arc::new(Mutex::new(())))
            .clone();
        OwnedGuard(mutex.lock_owned().await)
    }
}

/// Thin wrapper so `lock()` can return something `MutexGuard`-shaped
/// without exposing `tokio::sync::OwnedMutexGuard` directly to callers.
pub struct OwnedGuard(tokio::sync::OwnedMutexGuard<()>);

impl std::ops::Deref for OwnedGuard {
    type Target = ();
    fn deref(&self) -> &() {
        &self.0
    }
}
