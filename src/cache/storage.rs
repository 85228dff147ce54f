//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// A stored payload with the time it was written.
#[derive(Debug, Clone)]
pub struct CachedValue {
  /// Serialized payload (a single entity or a list of entities)
  pub data: Value,
  /// When the payload was cached
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Payloads are stored as JSON values so a single backend can hold any
/// `Cacheable` type; the layer above handles (de)serialization.
pub trait CacheStorage: Send + Sync {
  /// Store the full result of a query, replacing any previous one.
  fn store_query_result(&self, key: &str, data: Value) -> Result<()>;

  /// Get the cached result of a query.
  fn get_query_result(&self, key: &str) -> Result<Option<CachedValue>>;

  /// Get a single entity by type and key.
  fn get_entity(&self, entity_type: &str, entity_key: &str) -> Result<Option<CachedValue>>;

  /// Store (upsert) a single entity.
  fn store_entity(&self, entity_type: &str, entity_key: &str, data: Value) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store_query_result(&self, _key: &str, _data: Value) -> Result<()> {
    Ok(()) // Discard
  }

  fn get_query_result(&self, _key: &str) -> Result<Option<CachedValue>> {
    Ok(None) // Always miss
  }

  fn get_entity(&self, _entity_type: &str, _entity_key: &str) -> Result<Option<CachedValue>> {
    Ok(None) // Always miss
  }

  fn store_entity(&self, _entity_type: &str, _entity_key: &str, _data: Value) -> Result<()> {
    Ok(()) // Discard
  }
}

#[derive(Default)]
struct MemoryTables {
  /// query key -> full query result
  queries: HashMap<String, CachedValue>,
  /// (entity type, entity key) -> entity
  entities: HashMap<(String, String), CachedValue>,
}

/// Process-lifetime cache storage.
///
/// Entries are never evicted; a newer write for the same key overwrites the
/// older one.
#[derive(Default)]
pub struct MemoryStorage {
  tables: Mutex<MemoryTables>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store a query result with an explicit timestamp.
  pub fn store_query_result_at(&self, key: &str, data: Value, cached_at: DateTime<Utc>) -> Result<()> {
    let mut tables = self
      .tables
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    tables
      .queries
      .insert(key.to_string(), CachedValue { data, cached_at });

    Ok(())
  }

  /// Store an entity with an explicit timestamp.
  pub fn store_entity_at(
    &self,
    entity_type: &str,
    entity_key: &str,
    data: Value,
    cached_at: DateTime<Utc>,
  ) -> Result<()> {
    let mut tables = self
      .tables
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    tables.entities.insert(
      (entity_type.to_string(), entity_key.to_string()),
      CachedValue { data, cached_at },
    );

    Ok(())
  }
}

impl CacheStorage for MemoryStorage {
  fn store_query_result(&self, key: &str, data: Value) -> Result<()> {
    self.store_query_result_at(key, data, Utc::now())
  }

  fn get_query_result(&self, key: &str) -> Result<Option<CachedValue>> {
    let tables = self
      .tables
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(tables.queries.get(key).cloned())
  }

  fn get_entity(&self, entity_type: &str, entity_key: &str) -> Result<Option<CachedValue>> {
    let tables = self
      .tables
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(
      tables
        .entities
        .get(&(entity_type.to_string(), entity_key.to_string()))
        .cloned(),
    )
  }

  fn store_entity(&self, entity_type: &str, entity_key: &str, data: Value) -> Result<()> {
    self.store_entity_at(entity_type, entity_key, data, Utc::now())
  }
}
