/// Available commands, autocomplete and input parsing

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "todos",
    aliases: &["t", "list", "ls"],
    usage: "todos",
    description: "List all todos (clears filters)",
  },
  Command {
    name: "todo",
    aliases: &["show", "get"],
    usage: "todo <id>",
    description: "Show one todo",
  },
  Command {
    name: "user",
    aliases: &["u"],
    usage: "user [id]",
    description: "Only list todos of a user (no id clears)",
  },
  Command {
    name: "pending",
    aliases: &["p", "open"],
    usage: "pending",
    description: "Only list todos that are not done",
  },
  Command {
    name: "done",
    aliases: &["d", "completed"],
    usage: "done",
    description: "Only list completed todos",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show this help",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit todos",
  },
];

/// Parsed user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Todos,
  Todo(i64),
  User(Option<i64>),
  Pending,
  Done,
  Help,
  Quit,
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Parse one line of input into an action.
///
/// The first word must be a command name, an alias, or a prefix of exactly
/// one command name; the rest are arguments. Returns `Ok(None)` for a
/// blank line.
pub fn parse(input: &str) -> Result<Option<Action>, String> {
  let mut words = input.split_whitespace();
  let Some(word) = words.next() else {
    return Ok(None);
  };
  let arg = words.next();

  let cmd = resolve(word)?;

  let action = match cmd.name {
    "todos" => Action::Todos,
    "todo" => {
      let raw = arg.ok_or_else(|| format!("Usage: {}", cmd.usage))?;
      Action::Todo(parse_id(raw)?)
    }
    "user" => Action::User(arg.map(parse_id).transpose()?),
    "pending" => Action::Pending,
    "done" => Action::Done,
    "help" => Action::Help,
    "quit" => Action::Quit,
    other => return Err(format!("Unknown command: {}", other)),
  };

  Ok(Some(action))
}

fn resolve(word: &str) -> Result<&'static Command, String> {
  let word = word.to_lowercase();

  if let Some(cmd) = COMMANDS
    .iter()
    .find(|cmd| cmd.name == word || cmd.aliases.contains(&word.as_str()))
  {
    return Ok(cmd);
  }

  let prefixed: Vec<&Command> = COMMANDS.iter().filter(|cmd| cmd.name.starts_with(&word)).collect();
  match prefixed.as_slice() {
    [cmd] => Ok(*cmd),
    [] => {
      let hint = match get_suggestions(&word).first() {
        Some(cmd) => format!("did you mean {}?", cmd.name),
        None => "try help".to_string(),
      };
      Err(format!("Unknown command: {} ({})", word, hint))
    }
    many => {
      let names: Vec<&str> = many.iter().map(|cmd| cmd.name).collect();
      Err(format!("Ambiguous command: {} ({})", word, names.join(", ")))
    }
  }
}

fn parse_id(raw: &str) -> Result<i64, String> {
  raw
    .trim_start_matches('#')
    .parse()
    .map_err(|_| format!("Not a valid id: {}", raw))
}

/// Help text, one line per command
pub fn help_lines() -> Vec<String> {
  COMMANDS
    .iter()
    .map(|cmd| {
      let aliases = if cmd.aliases.is_empty() {
        String::new()
      } else {
        format!(" ({})", cmd.aliases.join(", "))
      };
      format!("  {:<12}{}{}", cmd.usage, cmd.description, aliases)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match_beats_prefix() {
    let suggestions = get_suggestions("todo");
    assert_eq!(suggestions[0].name, "todo");
    assert_eq!(suggestions[1].name, "todos");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("ls");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "todos");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("pen");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "pending");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("uit");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "quit");
  }

  #[test]
  fn test_parse_blank() {
    assert_eq!(parse("   "), Ok(None));
  }

  #[test]
  fn test_parse_todo_with_id() {
    assert_eq!(parse("todo 42"), Ok(Some(Action::Todo(42))));
    assert_eq!(parse("show #7"), Ok(Some(Action::Todo(7))));
  }

  #[test]
  fn test_parse_todo_requires_id() {
    let err = parse("todo").unwrap_err();
    assert!(err.contains("Usage: todo <id>"));
  }

  #[test]
  fn test_parse_bad_id() {
    let err = parse("todo abc").unwrap_err();
    assert!(err.contains("Not a valid id"));
  }

  #[test]
  fn test_parse_user_filter() {
    assert_eq!(parse("user 3"), Ok(Some(Action::User(Some(3)))));
    assert_eq!(parse("u"), Ok(Some(Action::User(None))));
  }

  #[test]
  fn test_parse_aliases() {
    assert_eq!(parse("t"), Ok(Some(Action::Todos)));
    assert_eq!(parse("q"), Ok(Some(Action::Quit)));
    assert_eq!(parse("?"), Ok(Some(Action::Help)));
    assert_eq!(parse("DONE"), Ok(Some(Action::Done)));
  }

  #[test]
  fn test_parse_unique_prefix() {
    assert_eq!(parse("pen"), Ok(Some(Action::Pending)));
    assert_eq!(parse("qu"), Ok(Some(Action::Quit)));
  }

  #[test]
  fn test_parse_does_not_run_fuzzy_match() {
    assert!(parse("x").unwrap_err().contains("did you mean quit?"));
    assert!(parse("e").unwrap_err().contains("Unknown command"));
    assert!(parse("uit").is_err());
  }

  #[test]
  fn test_parse_ambiguous_prefix() {
    let err = parse("to").unwrap_err();
    assert!(err.contains("Ambiguous command"));
    assert!(err.contains("todos, todo"));
  }

  #[test]
  fn test_parse_unknown() {
    assert!(parse("zzz").unwrap_err().contains("Unknown command"));
  }

  #[test]
  fn test_help_lists_every_command() {
    assert_eq!(help_lines().len(), COMMANDS.len());
  }
}
