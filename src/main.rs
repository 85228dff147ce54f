mod app;
mod cache;
mod commands;
mod config;
mod logging;
mod todos;
mod view;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tokio::io::BufReader;

use crate::config::CachePolicy;
use crate::view::ListFilter;

#[derive(Parser, Debug)]
#[command(name = "todos")]
#[command(about = "A terminal client for a remote todo list")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./todos.yaml or $XDG_CONFIG_HOME/todos/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Base URL of the todo API
  #[arg(long, global = true)]
  base_url: Option<String>,

  /// Request timeout in seconds
  #[arg(long, global = true)]
  timeout: Option<u64>,

  /// Disable caching; every request goes to the API
  #[arg(long, global = true)]
  no_cache: bool,

  #[command(subcommand)]
  command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// List todos
  List {
    /// Only todos of this user
    #[arg(short, long)]
    user: Option<i64>,

    /// Only todos that are not done
    #[arg(long, conflicts_with = "done")]
    pending: bool,

    /// Only completed todos
    #[arg(long)]
    done: bool,
  },
  /// Show a single todo
  Show { id: i64 },
  /// Interactive session reading commands from stdin
  Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line overrides
  if let Some(url) = args.base_url {
    config.api.base_url = url;
  }
  if let Some(timeout) = args.timeout {
    config.api.timeout_secs = Some(timeout);
  }
  if args.no_cache {
    config.cache.policy = CachePolicy::Passthrough;
  }

  let log_guard = logging::init(&config.log)?;
  tracing::debug!(?config, "configuration loaded");

  let repo = todos::TodoRepository::new(&config)?;
  let mut app = app::App::new(repo);

  let (lines, failed) = match args.command.unwrap_or(Cmd::List {
    user: None,
    pending: false,
    done: false,
  }) {
    Cmd::List {
      user,
      pending,
      done,
    } => {
      let completed = match (pending, done) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
      };
      let lines = app
        .list(ListFilter {
          user_id: user,
          completed,
        })
        .await;
      (lines, app.list_view().state().error().is_some())
    }
    Cmd::Show { id } => {
      let lines = app.show(id).await;
      let failed = app
        .detail_view()
        .and_then(|view| view.state().error())
        .is_some();
      (lines, failed)
    }
    Cmd::Shell => {
      let stdin = BufReader::new(tokio::io::stdin());
      app.run(stdin, tokio::io::stdout()).await?;
      return Ok(());
    }
  };

  if failed {
    for line in lines {
      eprintln!("{}", line);
    }
    // exit() skips destructors; flush file logging first
    drop(log_guard);
    std::process::exit(1);
  }

  for line in lines {
    println!("{}", line);
  }

  Ok(())
}
