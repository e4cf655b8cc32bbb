//! Query results and final answers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows returned by executing a generated statement.
///
/// Values are JSON scalars (null, bool, number, string). The [`Display`]
/// impl renders the rows as a list of tuples, which is the exact text
/// interpolated into the answer prompt.
///
/// [`Display`]: std::fmt::Display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "(")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write_scalar(f, value)?;
            }
            // Single-element tuples keep their trailing comma.
            if row.len() == 1 {
                write!(f, ",")?;
            }
            write!(f, ")")?;
        }
        write!(f, "]")
    }
}

fn write_scalar(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(f, "NULL"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Number(n) => write!(f, "{n}"),
        Value::String(s) => write_quoted(f, s),
        other => write!(f, "{other}"),
    }
}

/// Single quotes unless the text holds a `'` and no `"`, as a Python tuple prints.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

/// The outcome of one question: the SQL that ran, its rows, and the phrased answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub question: String,
    /// The statement whose result was used for the answer.
    pub sql: String,
    /// Set when the first statement failed and was regenerated once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairAttempt>,
    pub result: QueryResult,
    pub answer: String,
}

impl QueryAnswer {
    pub fn was_repaired(&self) -> bool {
        self.repair.is_some()
    }
}

/// The failed first statement and the error that triggered regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairAttempt {
    pub failed_sql: String,
    pub error: String,
}
