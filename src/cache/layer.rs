//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Report, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::storage::{CacheStorage, CachedValue};
use super::traits::{CacheResult, Cacheable, QueryKey};

/// Default time before cached data is considered stale, in seconds.
pub const CACHE_TTL_SECS: i64 = 5 * 60;

type FlightOutcome = std::result::Result<CacheResult<Value>, Arc<Report>>;
type Flight = Shared<BoxFuture<'static, FlightOutcome>>;

/// One cache slot: a whole query result, or a single entity.
#[derive(Debug, Clone)]
enum Slot {
  Query(String),
  Entity {
    entity_type: &'static str,
    key: String,
  },
}

impl Slot {
  /// Key in the in-flight table. Query and entity keys never collide.
  fn flight_key(&self) -> String {
    match self {
      Self::Query(key) => format!("query:{}", key),
      Self::Entity { entity_type, key } => format!("entity:{}:{}", entity_type, key),
    }
  }

  fn read(&self, storage: &dyn CacheStorage) -> Result<Option<CachedValue>> {
    match self {
      Self::Query(key) => storage.get_query_result(key),
      Self::Entity { entity_type, key } => storage.get_entity(entity_type, key),
    }
  }

  fn write(&self, storage: &dyn CacheStorage, data: Value) -> Result<()> {
    match self {
      Self::Query(key) => storage.store_query_result(key, data),
      Self::Entity { entity_type, key } => storage.store_entity(entity_type, key, data),
    }
  }
}

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between a repository and its remote source. Per slot it
/// implements cache-aside reads with stale-on-error fallback:
///
/// | cache   | fetch | result              |
/// |---------|-------|---------------------|
/// | fresh   | -     | cached, no fetch    |
/// | stale   | ok    | new data, stored    |
/// | stale   | err   | stale cached data   |
/// | missing | ok    | new data, stored    |
/// | missing | err   | the fetch error     |
///
/// Concurrent requests for the same slot share a single fetch.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  in_flight: Arc<Mutex<HashMap<String, Flight>>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new<S: CacheStorage + 'static>(storage: S) -> Self {
    Self::from_shared(Arc::new(storage))
  }

  /// Create a cache layer over storage that is also held elsewhere.
  pub fn from_shared(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      in_flight: Arc::new(Mutex::new(HashMap::new())),
      stale_time: Duration::seconds(CACHE_TTL_SECS),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Check if cached data is stale based on cached_at timestamp.
  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at >= self.stale_time
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// The `key` identifies the collection slot. The whole list is stored as
  /// one entry; its items do not populate the single-entity slots.
  pub async fn fetch_list<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<Vec<T>>>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
  {
    let description = key.description();
    let result = self
      .fetch_slot(Slot::Query(key.cache_hash()), &description, || {
        let fut = fetcher();
        async move {
          let data = fut.await?;
          serde_json::to_value(data).map_err(|e| eyre!("Failed to serialize {}: {}", T::entity_type(), e))
        }
      })
      .await?;

    result
      .try_map(serde_json::from_value)
      .map_err(|e| eyre!("Failed to deserialize cached {}: {}", description, e))
  }

  /// Fetch a single entity with caching.
  pub async fn fetch_one<T, F, Fut>(&self, entity_key: &str, fetcher: F) -> Result<CacheResult<T>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let slot = Slot::Entity {
      entity_type: T::entity_type(),
      key: entity_key.to_string(),
    };
    let description = format!("{} {}", T::entity_type(), entity_key);

    let result = self
      .fetch_slot(slot, &description, || {
        let fut = fetcher();
        async move {
          let data = fut.await?;
          serde_json::to_value(data).map_err(|e| eyre!("Failed to serialize {}: {}", T::entity_type(), e))
        }
      })
      .await?;

    result
      .try_map(serde_json::from_value)
      .map_err(|e| eyre!("Failed to deserialize cached {}: {}", description, e))
  }

  async fn fetch_slot<F, Fut>(
    &self,
    slot: Slot,
    description: &str,
    fetcher: F,
  ) -> Result<CacheResult<Value>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>> + Send + 'static,
  {
    let flight_key = slot.flight_key();

    // The cache check and the in-flight registration happen under one lock,
    // so a finished flight has always written the cache before it leaves
    // the table.
    let flight = {
      let mut in_flight = self
        .in_flight
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;

      if let Some(flight) = in_flight.get(&flight_key) {
        debug!(key = %description, "joining in-flight request");
        flight.clone()
      } else {
        let cached = slot.read(self.storage.as_ref())?;

        if let Some(cached) = &cached {
          if !self.is_stale(cached.cached_at) {
            debug!(key = %description, cached_at = %cached.cached_at, "cache hit");
            return Ok(CacheResult::from_cache(cached.data.clone(), cached.cached_at));
          }
        }

        info!(key = %description, stale = cached.is_some(), "fetching from network");
        let flight = self.start_flight(slot, flight_key.clone(), description.to_string(), cached, fetcher());
        in_flight.insert(flight_key, flight.clone());
        flight
      }
    };

    flight.await.map_err(|e| eyre!("{}", e))
  }

  /// Spawn the remote fetch and wrap it so any number of callers can await it.
  ///
  /// The fetch runs to completion even if every caller goes away.
  fn start_flight<Fut>(
    &self,
    slot: Slot,
    flight_key: String,
    description: String,
    cached: Option<CachedValue>,
    fetch: Fut,
  ) -> Flight
  where
    Fut: Future<Output = Result<Value>> + Send + 'static,
  {
    let storage = Arc::clone(&self.storage);
    let in_flight = Arc::clone(&self.in_flight);
    let task_in_flight = Arc::clone(&in_flight);
    let task_key = flight_key.clone();

    let task = tokio::spawn(async move {
      let fetched = AssertUnwindSafe(fetch)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(eyre!("Fetch panicked: {}", panic_message(&*panic))));

      let outcome = match fetched {
        Ok(data) => slot
          .write(storage.as_ref(), data.clone())
          .map(|()| CacheResult::from_network(data)),
        Err(err) => match cached {
          Some(cached) => {
            warn!(key = %description, error = %err, cached_at = %cached.cached_at, "fetch failed, serving stale cache");
            Ok(CacheResult::offline(cached.data, cached.cached_at))
          }
          None => {
            warn!(key = %description, error = %err, "fetch failed, nothing cached");
            Err(err)
          }
        },
      };

      remove_flight(&task_in_flight, &task_key);
      outcome.map_err(Arc::new)
    });

    async move {
      task.await.unwrap_or_else(|e| {
        // Only reached when the runtime drops the task
        remove_flight(&in_flight, &flight_key);
        Err(Arc::new(eyre!("Fetch task failed: {}", e)))
      })
    }
    .boxed()
    .shared()
  }
}

fn remove_flight(in_flight: &Mutex<HashMap<String, Flight>>, flight_key: &str) {
  if let Ok(mut in_flight) = in_flight.lock() {
    in_flight.remove(flight_key);
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
  if let Some(message) = panic.downcast_ref::<&str>() {
    message
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message
  } else {
    "unknown panic"
  }
}
