//! Terminal output for answers and SQL.
//!
//! Answers are markdown (`termimad`), statements are highlighted with
//! `syntect`. Streamed answers are printed raw as deltas arrive.

use std::io::{self, Write};
use std::time::Duration;

use console::style;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;
use termimad::crossterm::style::Color as SkinColor;

const SQL_THEME: &str = "base16-ocean.dark";

pub struct ChatRenderer {
    skin: MadSkin,
    syntaxes: SyntaxSet,
    themes: ThemeSet,
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(SkinColor::Cyan);
        skin.inline_code.set_fg(SkinColor::Yellow);
        for header in skin.headers.iter_mut().take(2) {
            header.set_fg(SkinColor::Cyan);
        }

        Self {
            skin,
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
        }
    }

    pub fn render_final(&self, markdown: &str) -> String {
        self.skin.term_text(markdown).to_string()
    }

    pub fn print_streaming_token(&self, token: &str) {
        print!("{token}");
        let _ = io::stdout().flush();
    }

    /// SQL with 24-bit colour escapes, each line indented two spaces.
    pub fn highlight_sql(&self, sql: &str) -> String {
        let Some(theme) = self.themes.themes.get(SQL_THEME) else {
            return indent(sql);
        };
        let syntax = self
            .syntaxes
            .find_syntax_by_token("sql")
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, theme);

        sql.lines()
            .map(|line| match highlighter.highlight_line(line, &self.syntaxes) {
                Ok(ranges) => format!("  {}\x1b[0m\n", as_24_bit_terminal_escaped(&ranges, false)),
                Err(_) => format!("  {line}\n"),
            })
            .collect()
    }

    /// The executed statement, preceded by the failed first attempt when
    /// the query was regenerated.
    pub fn print_sql(&self, sql: &str, failed: Option<(&str, &str)>) {
        if let Some((failed_sql, error)) = failed {
            println!("  {}", style(rule("first attempt")).dim());
            print!("{}", self.highlight_sql(failed_sql));
            println!("  {} {}", style("error:").red(), style(error).dim());
        }
        println!("  {}", style(rule("sql")).dim());
        print!("{}", self.highlight_sql(sql));
    }

    /// `| 3 rows · 1.2s · gemini-2.5-flash`
    pub fn print_stats_footer(&self, rows: usize, elapsed: Duration, model: &str) {
        let noun = if rows == 1 { "row" } else { "rows" };
        let stats = format!(
            "| {rows} {noun} \u{00b7} {:.1}s \u{00b7} {model}",
            elapsed.as_secs_f64()
        );
        println!("\n  {}", style(stats).dim());
    }

    pub fn clear_screen(&self) {
        let _ = execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0));
    }
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// `--- label ---` padded with dashes to the terminal width (capped at 60).
fn rule(label: &str) -> String {
    let width = terminal::size().map_or(60, |(cols, _)| usize::from(cols).min(60));
    let head = format!("--- {label} ");
    let pad = width.saturating_sub(head.chars().count() + 2);
    format!("{head}{}", "-".repeat(pad.max(3)))
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {l}\n")).collect()
}
