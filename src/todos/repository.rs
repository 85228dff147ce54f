//! Todo repository: cache-aside access to the remote todo source.

use color_eyre::Result;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheLayer, CacheResult, MemoryStorage, NoopStorage};
use crate::config::{CachePolicy, Config};

use super::cache::TodoQueryKey;
use super::client::{TodoSource, TodosClient};
use super::types::{FetchResult, TodoRecord};

/// Todo repository with transparent caching support.
///
/// With [`CachePolicy::CacheAside`] results are kept in memory for the
/// configured TTL, and an expired copy is served when the remote source
/// fails. With [`CachePolicy::Passthrough`] every call goes to the remote
/// source and failures are reported as they are.
#[derive(Clone)]
pub struct TodoRepository {
  source: Arc<dyn TodoSource>,
  cache: CacheLayer,
}

impl TodoRepository {
  /// Create a repository talking to the configured HTTP API.
  pub fn new(config: &Config) -> Result<Self> {
    let source = TodosClient::new(config)?;
    Ok(Self::with_source(Arc::new(source), config))
  }

  /// Create a repository over any todo source.
  pub fn with_source(source: Arc<dyn TodoSource>, config: &Config) -> Self {
    let cache = match config.cache.policy {
      CachePolicy::CacheAside => CacheLayer::new(MemoryStorage::new()),
      CachePolicy::Passthrough => CacheLayer::new(NoopStorage),
    };
    let cache = cache.with_stale_time(config.cache.ttl());

    Self::from_parts(source, cache)
  }

  /// Build from an already configured cache layer.
  pub fn from_parts(source: Arc<dyn TodoSource>, cache: CacheLayer) -> Self {
    Self { source, cache }
  }

  /// Get all todos.
  pub async fn fetch_all_todos(&self) -> FetchResult<Vec<TodoRecord>> {
    let result = self
      .cache
      .fetch_list(&TodoQueryKey::AllTodos, || {
        let source = Arc::clone(&self.source);
        async move { source.get_todos().await }
      })
      .await;

    log_source("all todos", &result);
    result.map(|r| r.data).into()
  }

  /// Get a single todo by id.
  pub async fn fetch_todo_details(&self, id: i64) -> FetchResult<TodoRecord> {
    let result = self
      .cache
      .fetch_one(&id.to_string(), || {
        let source = Arc::clone(&self.source);
        async move { source.get_todo(id).await }
      })
      .await;

    log_source(&format!("todo {}", id), &result);
    result.map(|r| r.data).into()
  }
}

fn log_source<T>(what: &str, result: &Result<CacheResult<T>>) {
  match result {
    Ok(r) => debug!(request = what, source = ?r.source, cached_at = ?r.cached_at, "request served"),
    Err(e) => debug!(request = what, error = %e, "request failed"),
  }
}
