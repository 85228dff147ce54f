//! View state for the list and detail screens.
//!
//! Each view starts out `Loading`, takes the repository result as-is and
//! renders itself to plain text lines.

use crate::todos::{FetchResult, TodoRecord};

/// Filters applied to the todo list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
  pub user_id: Option<i64>,
  /// `Some(true)` for done only, `Some(false)` for pending only
  pub completed: Option<bool>,
}

impl ListFilter {
  fn matches(&self, todo: &TodoRecord) -> bool {
    self.user_id.map_or(true, |id| todo.user_id == id)
      && self.completed.map_or(true, |done| todo.completed == done)
  }

  fn describe(&self) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(id) = self.user_id {
      parts.push(format!("user {}", id));
    }
    match self.completed {
      Some(true) => parts.push("done".to_string()),
      Some(false) => parts.push("pending".to_string()),
      None => {}
    }

    if parts.is_empty() {
      None
    } else {
      Some(parts.join(", "))
    }
  }
}

#[derive(Debug)]
pub struct ListView {
  state: FetchResult<Vec<TodoRecord>>,
  filter: ListFilter,
}

impl Default for ListView {
  fn default() -> Self {
    Self {
      state: FetchResult::Loading,
      filter: ListFilter::default(),
    }
  }
}

impl ListView {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn apply(&mut self, result: FetchResult<Vec<TodoRecord>>) {
    self.state = result;
  }

  pub fn state(&self) -> &FetchResult<Vec<TodoRecord>> {
    &self.state
  }

  pub fn filter(&self) -> ListFilter {
    self.filter
  }

  pub fn set_filter(&mut self, filter: ListFilter) {
    self.filter = filter;
  }

  /// Todos that pass the current filter, in API order
  pub fn visible(&self) -> Vec<&TodoRecord> {
    self
      .state
      .data()
      .map(|todos| todos.iter().filter(|t| self.filter.matches(t)).collect())
      .unwrap_or_default()
  }

  pub fn render(&self) -> Vec<String> {
    match &self.state {
      FetchResult::Loading => vec!["Loading...".to_string()],
      FetchResult::Error(message) => vec![format!("Error: {}", message)],
      FetchResult::Success(todos) => {
        let visible = self.visible();
        let mut lines = Vec::with_capacity(visible.len() + 1);

        let header = match self.filter.describe() {
          Some(filter) => format!("{} of {} todos ({})", visible.len(), todos.len(), filter),
          None => format!("{} todos", todos.len()),
        };
        lines.push(header);

        if visible.is_empty() {
          lines.push("No todos".to_string());
        }
        lines.extend(visible.into_iter().map(list_row));
        lines
      }
    }
  }
}

fn list_row(todo: &TodoRecord) -> String {
  format!(
    "[{}] #{:<4} {} (user {})",
    if todo.completed { "x" } else { " " },
    todo.id,
    todo.title,
    todo.user_id
  )
}

#[derive(Debug)]
pub struct DetailView {
  id: i64,
  state: FetchResult<TodoRecord>,
}

impl DetailView {
  pub fn new(id: i64) -> Self {
    Self {
      id,
      state: FetchResult::Loading,
    }
  }

  pub fn apply(&mut self, result: FetchResult<TodoRecord>) {
    self.state = result;
  }

  pub fn state(&self) -> &FetchResult<TodoRecord> {
    &self.state
  }

  pub fn render(&self) -> Vec<String> {
    match &self.state {
      FetchResult::Loading => vec![format!("Loading todo #{}...", self.id)],
      FetchResult::Error(message) => vec![format!("Error: {}", message)],
      FetchResult::Success(todo) => {
        let mut lines = vec![
          format!("#{} {}", todo.id, todo.title),
          format!("  Status: {}", if todo.completed { "done" } else { "pending" }),
          format!("  User:   {}", todo.user_id),
        ];
        if let Some(image) = &todo.user_image {
          lines.push(format!("  Image:  {}", image));
        }
        lines
      }
    }
  }
}
