use crate::config::Config;
use crate::todos::types::TodoRecord;
use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Remote source of todo records.
///
/// Every call is a single attempt; failures of any kind (transport, status,
/// decoding) come back as an error with a readable message.
#[async_trait]
pub trait TodoSource: Send + Sync {
  /// Fetch the full todo collection
  async fn get_todos(&self) -> Result<Vec<TodoRecord>>;

  /// Fetch a single todo by id
  async fn get_todo(&self, id: i64) -> Result<TodoRecord>;
}

/// HTTP client for the todo REST API
#[derive(Clone)]
pub struct TodosClient {
  client: Client,
  base_url: Url,
}

impl TodosClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = parse_base_url(&config.api.base_url)?;

    let mut builder = Client::builder().user_agent(concat!("todos/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.api.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }

    let client = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid request path {}: {}", path, e))?;

    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    response
      .json::<T>()
      .await
      .map_err(|e| eyre!("Failed to parse response from {}: {}", url, e))
  }
}

#[async_trait]
impl TodoSource for TodosClient {
  async fn get_todos(&self) -> Result<Vec<TodoRecord>> {
    self
      .get_json("todos")
      .await
      .map_err(|e| eyre!("Failed to get todos: {}", e))
  }

  async fn get_todo(&self, id: i64) -> Result<TodoRecord> {
    self
      .get_json(&format!("todos/{}", id))
      .await
      .map_err(|e| eyre!("Failed to get todo {}: {}", id, e))
  }
}

/// Parse the configured base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut raw = raw.trim().to_string();
  if !raw.ends_with('/') {
    raw.push('/');
  }

  let url = Url::parse(&raw).map_err(|e| eyre!("Invalid base URL {}: {}", raw, e))?;
  if url.cannot_be_a_base() {
    return Err(eyre!("Invalid base URL {}: cannot be a base", raw));
  }

  Ok(url)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client_for(server: &MockServer) -> TodosClient {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.timeout_secs = Some(5);
    TodosClient::new(&config).unwrap()
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let url = parse_base_url("https://example.com/api/v1").unwrap();
    assert_eq!(url.join("todos").unwrap().as_str(), "https://example.com/api/v1/todos");
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(parse_base_url("not a url").is_err());
    assert!(parse_base_url("mailto:someone@example.com").is_err());
  }

  #[tokio::test]
  async fn test_get_todos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/todos"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        {"completed": false, "id": 1, "title": "Buy milk", "userId": 7},
        {"completed": true, "id": 2, "title": "Walk dog", "userId": 7}
      ])))
      .expect(1)
      .mount(&server)
      .await;

    let todos = client_for(&server).get_todos().await.unwrap();

    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0].title, "Buy milk");
    assert!(todos[1].completed);
  }

  #[tokio::test]
  async fn test_get_todo_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/todos/42"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!(
        {"completed": true, "id": 42, "title": "Ship it", "userId": 3}
      )))
      .mount(&server)
      .await;

    let todo = client_for(&server).get_todo(42).await.unwrap();

    assert_eq!(todo.id, 42);
    assert_eq!(todo.user_id, 3);
  }

  #[tokio::test]
  async fn test_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/todos/999"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let err = client_for(&server).get_todo(999).await.unwrap_err();
    let message = err.to_string();

    assert!(message.contains("Failed to get todo 999"));
    assert!(message.contains("404"));
  }

  #[tokio::test]
  async fn test_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/todos"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
      .mount(&server)
      .await;

    let err = client_for(&server).get_todos().await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse response"));
  }

  #[tokio::test]
  async fn test_unreachable_server() {
    let mut config = Config::default();
    // Port 9 (discard) is not expected to be listening
    config.api.base_url = "http://127.0.0.1:9/".to_string();
    config.api.timeout_secs = Some(2);
    let client = TodosClient::new(&config).unwrap();

    let err = client.get_todos().await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to get todos"));
  }
}
