//! Main chat loop orchestration.
//!
//! Reads questions, answers them through a `ChatSession` with the answer
//! streamed to the terminal, and handles slash commands. History lives only
//! as long as the process.

use std::io::Write;
use std::time::Instant;

use console::style;

use askdb_core::chat::session::ChatSession;
use askdb_core::database::SqlDatabase;
use askdb_core::pipeline::QueryPipeline;
use askdb_types::llm::MessageRole;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;
use crate::cli::spinner;

/// Longest turn preview shown by `/history`.
const HISTORY_PREVIEW_CHARS: usize = 100;

/// Run the interactive chat loop until `/exit` or Ctrl+D.
pub async fn run_chat_loop<D: SqlDatabase>(pipeline: QueryPipeline<D>) -> anyhow::Result<()> {
    let model = pipeline.settings().model.clone();
    print_welcome_banner(pipeline.dialect(), &model, pipeline.index().is_some());

    let mut session = ChatSession::new(pipeline);
    let renderer = ChatRenderer::new();

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep asking.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => {
                    renderer.clear_screen();
                    chat_input.clear();
                }
                ChatCommand::Exit => {
                    println!("\n  {}", style("Session ended.").dim());
                    break;
                }
                ChatCommand::History => print_history(&session),
                ChatCommand::Sql => match session.last_sql() {
                    Some(sql) => {
                        println!();
                        renderer.print_sql(sql, None);
                        println!();
                    }
                    None => println!("\n  {}\n", style("No query has run yet.").dim()),
                },
                ChatCommand::Schema => match session.schema_text() {
                    Some(schema) => println!("\n{}\n", indent_block(schema)),
                    None => println!(
                        "\n  {}\n",
                        style("The schema is loaded with the first question.").dim()
                    ),
                },
                ChatCommand::Reset => {
                    session.reset();
                    println!("\n  {} Conversation cleared.\n", style("*").cyan().bold());
                }
                ChatCommand::Unknown(name) => println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                ),
            }
            continue;
        }

        let spinner = spinner("thinking...");
        let start = Instant::now();
        let mut first_token = true;

        let result = session
            .ask_streaming(&text, |delta| {
                if first_token {
                    spinner.finish_and_clear();
                    first_token = false;
                    print!("\n  {} ", style("askdb").cyan().bold());
                    let _ = std::io::stdout().flush();
                }
                renderer.print_streaming_token(delta);
            })
            .await;

        if first_token {
            spinner.finish_and_clear();
        }

        match result {
            Ok(answer) => {
                println!();
                renderer.print_stats_footer(answer.result.row_count(), start.elapsed(), &model);
                println!();
            }
            Err(e) => {
                tracing::warn!(error = %e, "question failed");
                eprintln!("\n  {} {e}", style("!").red().bold());
                eprintln!(
                    "  {}",
                    style("Rephrase the question to retry, /exit to quit.").dim()
                );
                println!();
            }
        }
    }

    chat_input.flush();
    Ok(())
}

fn print_history<D: SqlDatabase>(session: &ChatSession<D>) {
    println!();
    for message in session.conversation().messages() {
        let label = match message.role {
            MessageRole::System => format!("{}", style("Schema").dim()),
            MessageRole::User => format!("{}", style("You").green()),
            MessageRole::Assistant => format!("{}", style("askdb").cyan()),
        };
        println!("  {} {}", style(label).bold(), preview(&message.content));
    }
    println!();
}

/// First line of `text`, cut to [`HISTORY_PREVIEW_CHARS`] characters.
fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let multiline = text.lines().nth(1).is_some();
    if first_line.chars().count() > HISTORY_PREVIEW_CHARS {
        let cut: String = first_line.chars().take(HISTORY_PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else if multiline {
        format!("{first_line} ...")
    } else {
        first_line.to_string()
    }
}

fn indent_block(text: &str) -> String {
    text.lines()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_line() {
        assert_eq!(preview("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_preview_multiline() {
        assert_eq!(preview("Schema:\nusers: id"), "Schema: ...");
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        let long = "é".repeat(150);
        let out = preview(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), HISTORY_PREVIEW_CHARS);
    }

    #[test]
    fn test_indent_block() {
        assert_eq!(indent_block("a\nb"), "  a\n  b");
    }
}
