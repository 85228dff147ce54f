//! Caching implementations for todo types.

use crate::cache::{Cacheable, QueryKey};

use super::types::TodoRecord;

/// Single todos are cached by id under this type.
impl Cacheable for TodoRecord {
  fn entity_type() -> &'static str {
    "todo"
  }
}

/// Query key types for todo API calls.
#[derive(Clone, Debug)]
pub enum TodoQueryKey {
  /// The full todo collection
  AllTodos,
}

impl QueryKey for TodoQueryKey {
  fn cache_hash(&self) -> String {
    match self {
      Self::AllTodos => "todos:all".to_string(),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::AllTodos => "all todos".to_string(),
    }
  }
}
