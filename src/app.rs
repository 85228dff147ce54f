use crate::commands::{self, Action};
use crate::todos::TodoRepository;
use crate::view::{DetailView, ListFilter, ListView};
use color_eyre::{eyre::eyre, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const PROMPT: &str = "todos> ";

/// Main application state
pub struct App {
  repo: TodoRepository,

  /// List screen, kept across commands so filters persist
  list: ListView,

  /// Last opened detail screen
  detail: Option<DetailView>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(repo: TodoRepository) -> Self {
    Self {
      repo,
      list: ListView::new(),
      detail: None,
      should_quit: false,
    }
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  pub fn list_view(&self) -> &ListView {
    &self.list
  }

  pub fn detail_view(&self) -> Option<&DetailView> {
    self.detail.as_ref()
  }

  /// Load the list with the given filter and render it.
  pub async fn list(&mut self, filter: ListFilter) -> Vec<String> {
    self.list.set_filter(filter);
    let result = self.repo.fetch_all_todos().await;
    self.list.apply(result);
    self.list.render()
  }

  /// Load one todo and render it.
  pub async fn show(&mut self, id: i64) -> Vec<String> {
    let detail = self.detail.insert(DetailView::new(id));
    let result = self.repo.fetch_todo_details(id).await;
    detail.apply(result);
    detail.render()
  }

  /// Run one action and return the lines to print.
  pub async fn execute(&mut self, action: Action) -> Vec<String> {
    debug!(?action, "executing");
    let current = self.list.filter();

    match action {
      Action::Todos => self.list(ListFilter::default()).await,
      Action::Todo(id) => self.show(id).await,
      Action::User(user_id) => self.list(ListFilter { user_id, ..current }).await,
      Action::Pending => {
        self
          .list(ListFilter {
            completed: Some(false),
            ..current
          })
          .await
      }
      Action::Done => {
        self
          .list(ListFilter {
            completed: Some(true),
            ..current
          })
          .await
      }
      Action::Help => {
        let mut lines = vec!["Commands:".to_string()];
        lines.extend(commands::help_lines());
        lines
      }
      Action::Quit => {
        self.should_quit = true;
        Vec::new()
      }
    }
  }

  /// Interactive loop: read commands line by line until quit or end of input.
  pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
  where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
  {
    let mut lines = input.lines();

    while !self.should_quit() {
      write_str(&mut output, PROMPT).await?;

      let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| eyre!("Failed to read input: {}", e))?
      else {
        break;
      };

      let out = match commands::parse(&line) {
        Ok(Some(action)) => self.execute(action).await,
        Ok(None) => Vec::new(),
        Err(message) => vec![message],
      };

      for line in out {
        write_str(&mut output, &line).await?;
        write_str(&mut output, "\n").await?;
      }
    }

    Ok(())
  }
}

async fn write_str<W: AsyncWrite + Unpin>(output: &mut W, s: &str) -> Result<()> {
  output
    .write_all(s.as_bytes())
    .await
    .map_err(|e| eyre!("Failed to write output: {}", e))?;
  output
    .flush()
    .await
    .map_err(|e| eyre!("Failed to write output: {}", e))
}
