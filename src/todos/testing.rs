//! Test doubles for the todo source.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::client::TodoSource;
use super::types::TodoRecord;

type Scripted<T> = std::result::Result<T, String>;

/// Scripted remote source that counts calls.
///
/// Each call pops the next scripted outcome; an empty script is a failure.
#[derive(Default)]
pub struct SpySource {
  all: Mutex<VecDeque<Scripted<Vec<TodoRecord>>>>,
  by_id: Mutex<HashMap<i64, VecDeque<Scripted<TodoRecord>>>>,
  all_calls: AtomicUsize,
  id_calls: Mutex<HashMap<i64, usize>>,
  delay_ms: u64,
}

impl SpySource {
  /// A source whose list call takes `delay_ms` to answer.
  pub fn with_delay(delay_ms: u64) -> Self {
    Self {
      delay_ms,
      ..Default::default()
    }
  }

  pub fn push_all(&self, outcome: std::result::Result<Vec<TodoRecord>, &str>) -> &Self {
    self
      .all
      .lock()
      .unwrap()
      .push_back(outcome.map_err(String::from));
    self
  }

  pub fn push_one(&self, id: i64, outcome: std::result::Result<TodoRecord, &str>) -> &Self {
    self
      .by_id
      .lock()
      .unwrap()
      .entry(id)
      .or_default()
      .push_back(outcome.map_err(String::from));
    self
  }

  pub fn all_calls(&self) -> usize {
    self.all_calls.load(Ordering::SeqCst)
  }

  pub fn id_calls(&self, id: i64) -> usize {
    self.id_calls.lock().unwrap().get(&id).copied().unwrap_or(0)
  }
}

#[async_trait]
impl TodoSource for SpySource {
  async fn get_todos(&self) -> Result<Vec<TodoRecord>> {
    self.all_calls.fetch_add(1, Ordering::SeqCst);
    let next = self.all.lock().unwrap().pop_front();
    if self.delay_ms > 0 {
      tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
    }
    match next {
      Some(Ok(todos)) => Ok(todos),
      Some(Err(msg)) => Err(eyre!(msg)),
      None => Err(eyre!("no scripted response")),
    }
  }

  async fn get_todo(&self, id: i64) -> Result<TodoRecord> {
    *self.id_calls.lock().unwrap().entry(id).or_default() += 1;
    let next = self
      .by_id
      .lock()
      .unwrap()
      .get_mut(&id)
      .and_then(|q| q.pop_front());
    match next {
      Some(Ok(todo)) => Ok(todo),
      Some(Err(msg)) => Err(eyre!(msg)),
      None => Err(eyre!("no scripted response for {}", id)),
    }
  }
}

pub fn todo(id: i64, title: &str, user_id: i64, completed: bool) -> TodoRecord {
  TodoRecord {
    completed,
    id,
    title: title.to_string(),
    user_id,
    user_image: None,
  }
}
