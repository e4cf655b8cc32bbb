//! Prompt line for the chat loop (rustyline-async).

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

#[derive(Debug)]
pub enum InputEvent {
    /// A trimmed line, possibly empty.
    Message(String),
    Eof,
    Interrupted,
}

pub struct ChatInput {
    readline: Readline,
}

impl ChatInput {
    /// The `SharedWriter` prints above the prompt without garbling it.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (readline, writer) = Readline::new(prompt)?;
        Ok((Self { readline }, writer))
    }

    /// Next line. Non-empty lines are added to the in-memory history.
    pub async fn read_line(&mut self) -> InputEvent {
        let line = match self.readline.readline().await {
            Ok(ReadlineEvent::Line(line)) => line,
            Ok(ReadlineEvent::Interrupted) => return InputEvent::Interrupted,
            Ok(ReadlineEvent::Eof) | Err(_) => return InputEvent::Eof,
        };
        let question = line.trim();
        if !question.is_empty() {
            self.readline.add_history_entry(question.to_string());
        }
        InputEvent::Message(question.to_string())
    }

    pub fn clear(&mut self) {
        let _ = self.readline.clear();
    }

    pub fn flush(&mut self) {
        let _ = self.readline.flush();
    }
}
