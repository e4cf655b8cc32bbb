//! Slash commands understood by the chat prompt.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Clear,
    Exit,
    History,
    /// SQL behind the last answer.
    Sql,
    /// Schema text in the system turn.
    Schema,
    /// Drop every turn after the system turn.
    Reset,
    Unknown(String),
}

/// Name, aliases, help line.
const COMMANDS: &[(&str, &[&str], &str)] = &[
    ("help", &["h", "?"], "Show this help message"),
    ("sql", &[], "Show the SQL behind the last answer"),
    ("schema", &[], "Show the schema the model was given"),
    ("history", &[], "Show the conversation so far"),
    ("reset", &[], "Forget the conversation, keep the schema"),
    ("clear", &["cls"], "Clear the screen"),
    ("exit", &["quit", "q"], "End the chat session"),
];

/// `None` unless the input starts with `/`. Arguments after the command
/// word are ignored.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or_default().to_lowercase();

    let name = COMMANDS
        .iter()
        .find(|(name, aliases, _)| *name == word || aliases.contains(&word.as_str()))
        .map(|(name, _, _)| *name);

    Some(match name {
        Some("help") => ChatCommand::Help,
        Some("sql") => ChatCommand::Sql,
        Some("schema") => ChatCommand::Schema,
        Some("history") => ChatCommand::History,
        Some("reset") => ChatCommand::Reset,
        Some("clear") => ChatCommand::Clear,
        Some("exit") => ChatCommand::Exit,
        _ => ChatCommand::Unknown(format!("/{word}")),
    })
}

pub fn print_help() {
    println!("\n  {}\n", style("Commands").bold());
    for (name, _, help) in COMMANDS {
        println!("  {:<10} {help}", style(format!("/{name}")).cyan());
    }
    println!(
        "\n  {}\n",
        style("Ctrl+C cancels the current line, Ctrl+D exits").dim()
    );
}
