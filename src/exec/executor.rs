//! Executor Module
//!
//! The cached execution entry point: answer from the store while an entry is
//! fresh, otherwise run the producer, store its success and classify its
//! failure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, Clock, SystemClock};
use crate::config::Config;
use crate::error::{ExecError, Result};
use crate::exec::classifier::{ErrorClassifier, TextMatchClassifier};
use crate::tasks::spawn_cleanup_task;

// == Coalescing ==
/// How concurrent calls for the same uncached key are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coalescing {
    /// Concurrent callers share one producer run per key.
    #[default]
    Enabled,
    /// Every caller that misses runs its own producer; the last one to
    /// settle determines the stored value.
    Disabled,
}

impl From<bool> for Coalescing {
    fn from(enabled: bool) -> Self {
        if enabled {
            Coalescing::Enabled
        } else {
            Coalescing::Disabled
        }
    }
}

type Flight<T> = Shared<BoxFuture<'static, Result<T>>>;
type WeakFlight<T> = WeakShared<BoxFuture<'static, Result<T>>>;
type FlightMap<T> = Arc<Mutex<HashMap<String, WeakFlight<T>>>>;

// == Executor ==
/// TTL memoization in front of an unreliable, rate-limited upstream.
///
/// Cloning is cheap and every clone shares the same store.
pub struct Executor<T> {
    /// Shared entry storage
    store: Arc<RwLock<CacheStore<T>>>,
    /// Producer runs that have not settled yet, by key. Only the callers
    /// awaiting a run keep it alive; the map holds weak handles.
    in_flight: FlightMap<T>,
    classifier: Arc<dyn ErrorClassifier>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
}

impl<T> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            in_flight: self.in_flight.clone(),
            classifier: self.classifier.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Executor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("classifier", &self.classifier)
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T> Executor<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an executor with its own empty store, the system clock and the
    /// `429`/`quota` text classifier.
    pub fn new(config: Config) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::with_max_entries(config.max_entries))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            classifier: Arc::new(TextMatchClassifier::default()),
            clock: Arc::new(SystemClock::new()),
            config: Arc::new(config),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying store, for background maintenance.
    pub fn store(&self) -> Arc<RwLock<CacheStore<T>>> {
        self.store.clone()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// A copy of the entry currently stored under `key`, fresh or not.
    pub async fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.store.read().await.get(key).cloned()
    }

    /// Starts the periodic retention sweep configured for this executor.
    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        spawn_cleanup_task(
            self.store(),
            self.clock.clone(),
            self.config.cleanup_interval,
            self.config.retention,
        )
    }

    // == Execute ==
    /// Returns the value cached under `key` if it is younger than `ttl`
    /// (or the configured default), otherwise runs `producer`.
    ///
    /// A successful result is stored and returned. A failure is classified and
    /// returned without touching the store.
    pub async fn execute<F, Fut>(&self, key: &str, ttl: Option<Duration>, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.execute_with_cancel(key, ttl, &CancellationToken::new(), producer)
            .await
    }

    /// Same as [`Executor::execute`], abandoning the call once `cancel` fires.
    ///
    /// The caller that starts a producer run owns it: cancelling that caller
    /// aborts the producer and every caller sharing it gets
    /// [`ExecError::Cancelled`]. A caller that joined someone else's run only
    /// stops waiting. Nothing is written to the store for an aborted run.
    ///
    /// Dropping the returned future detaches the caller the same way. A run
    /// is dropped once every caller sharing it has gone, and the next call for
    /// the key starts a new one.
    pub async fn execute_with_cancel<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        cancel: &CancellationToken,
        producer: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let ttl = ttl.unwrap_or(self.config.default_ttl);

        if let Some(value) = self.lookup(key, ttl).await {
            debug!(key = %key, "cache hit");
            return Ok(value);
        }
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "cache miss");

        match self.config.coalescing {
            Coalescing::Disabled => {
                self.run_producer(key, producer(), cancel.clone(), None)
                    .await
            }
            Coalescing::Enabled => self.join_or_start(key, ttl, cancel, producer).await,
        }
    }

    async fn lookup(&self, key: &str, ttl: Duration) -> Option<T> {
        let now = self.clock.now_ms();
        self.store.write().await.lookup_fresh(key, ttl, now)
    }

    async fn join_or_start<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        cancel: &CancellationToken,
        producer: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            let existing = in_flight.get(key).and_then(WeakShared::upgrade);

            if let Some(flight) = existing {
                drop(in_flight);
                self.store.write().await.stats_mut().record_coalesced();
                debug!(key = %key, "joined in-flight producer");

                return tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ExecError::Cancelled),
                    result = flight => result,
                };
            }

            // A run for this key may have settled between the lookup and
            // taking the lock; its result is already in the store. The call
            // was counted as a miss already.
            {
                let now = self.clock.now_ms();
                let store = self.store.read().await;
                if let Some(entry) = store.get(key).filter(|entry| entry.is_fresh(ttl, now)) {
                    return Ok(entry.value.clone());
                }
            }

            let flight: Flight<T> = self
                .run_producer(key, producer(), cancel.clone(), Some(self.in_flight.clone()))
                .boxed()
                .shared();

            // Runs abandoned by all of their callers never clear their own slot.
            in_flight.retain(|_, slot| slot.upgrade().is_some());
            if let Some(slot) = flight.downgrade() {
                in_flight.insert(key.to_string(), slot);
            }
            flight
        };

        // The leader's own token is observed inside the run itself.
        flight.await
    }

    /// Wraps one producer run with the deadline, cancellation and store write.
    ///
    /// When `in_flight` is given, the run removes its own slot after settling.
    fn run_producer<Fut>(
        &self,
        key: &str,
        work: Fut,
        cancel: CancellationToken,
        in_flight: Option<FlightMap<T>>,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let key = key.to_string();
        let store = self.store.clone();
        let clock = self.clock.clone();
        let classifier = self.classifier.clone();
        let deadline = self.config.producer_deadline;

        async move {
            store.write().await.stats_mut().record_producer_call();
            debug!(key = %key, "invoking producer");

            let bounded = async {
                match deadline {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(outcome) => outcome.map_err(|err| classifier.into_exec_error(err)),
                        Err(_) => Err(ExecError::DeadlineExceeded(limit)),
                    },
                    None => work.await.map_err(|err| classifier.into_exec_error(err)),
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ExecError::Cancelled),
                outcome = bounded => outcome,
            };

            match &outcome {
                Ok(value) => {
                    let now = clock.now_ms();
                    store.write().await.put(key.clone(), value.clone(), now);
                    debug!(key = %key, stored_at = now, "stored producer result");
                }
                Err(err) => {
                    store
                        .write()
                        .await
                        .stats_mut()
                        .record_failure(err.is_quota_exceeded());
                    warn!(key = %key, error = %err, "producer failed, nothing cached");
                }
            }

            if let Some(in_flight) = in_flight {
                in_flight.lock().await.remove(&key);
            }

            outcome
        }
    }
}
