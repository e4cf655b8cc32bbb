//! Relational schema snapshot types.
//!
//! A [`DatabaseSchema`] is what introspection produces and what prompts are
//! built from. It has two text renderings: a compact one-line-per-table form
//! for direct prompting and a detailed form (types, keys, indexes) used as
//! the source text for retrieval chunking.

use serde::{Deserialize, Serialize};

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as reported by the database (e.g. `INTEGER`, `varchar`).
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A foreign key constraint on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

/// An index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Everything introspection knows about one table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A snapshot of all user tables in a database, in introspection order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// One line per table: `table: col1, col2, ...`.
    pub fn compact_text(&self) -> String {
        self.tables
            .iter()
            .map(|t| format!("{}: {}", t.name, t.column_names().join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full description of every table including types, keys and indexes.
    pub fn detailed_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        for table in &self.tables {
            parts.push(format!("Table: {}", table.name));

            for col in &table.columns {
                let mut line = format!(
                    "  - Column '{}' ({}), {}",
                    col.name,
                    col.data_type,
                    if col.nullable { "NULL allowed" } else { "NOT NULL" }
                );
                if let Some(default) = col.default.as_deref().filter(|d| !d.is_empty()) {
                    line.push_str(&format!(", default: {default}"));
                }
                parts.push(line);
            }

            if !table.primary_keys.is_empty() {
                parts.push(format!("  Primary Keys: {}", table.primary_keys.join(", ")));
            }
            parts.push(String::new());

            for fk in &table.foreign_keys {
                parts.push(format!(
                    "  Foreign Key: {} → {}({})",
                    list_repr(&fk.columns),
                    fk.referred_table,
                    list_repr(&fk.referred_columns)
                ));
            }

            for idx in &table.indexes {
                let mut line = format!("  Index: {} on {}", idx.name, list_repr(&idx.columns));
                if idx.unique {
                    line.push_str(" (unique)");
                }
                parts.push(line);
            }

            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// Render a list of names as `['a', 'b']`.
fn list_repr(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
    format!("[{}]", quoted.join(", "))
}
