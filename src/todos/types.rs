use serde::{Deserialize, Serialize};

/// A single todo as served by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
  pub completed: bool,
  pub id: i64,
  pub title: String,
  pub user_id: i64,
  /// Avatar URL. Missing on the wire means the shared placeholder avatar;
  /// an explicit `null` means no avatar.
  #[serde(default = "default_user_image")]
  pub user_image: Option<String>,
}

pub const DEFAULT_USER_IMAGE: &str = "https://i.pravatar.cc/300";

fn default_user_image() -> Option<String> {
  Some(DEFAULT_USER_IMAGE.to_string())
}

/// Outcome of a repository call, as seen by views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult<T> {
  Success(T),
  Error(String),
  /// Placeholder held by a view before its first result arrives.
  /// The repository never returns it.
  Loading,
}

impl<T> FetchResult<T> {
  /// The payload, if this is a success
  pub fn data(&self) -> Option<&T> {
    match self {
      Self::Success(data) => Some(data),
      _ => None,
    }
  }

  /// The error message, if this is an error
  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Error(message) => Some(message),
      _ => None,
    }
  }
}

impl<T> From<color_eyre::Result<T>> for FetchResult<T> {
  fn from(result: color_eyre::Result<T>) -> Self {
    match result {
      Ok(data) => Self::Success(data),
      Err(e) => Self::Error(e.to_string()),
    }
  }
}
