//! `askdb schema`: print what the model is told about the database.

use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use askdb_core::database::SqlDatabase;
use askdb_types::schema::{DatabaseSchema, TableSchema};

pub async fn show_schema<D: SqlDatabase>(
    database: &D,
    detailed: bool,
    json: bool,
) -> anyhow::Result<()> {
    let schema = database.introspect().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }
    if detailed {
        println!("{}", schema.detailed_text());
        return Ok(());
    }
    if schema.is_empty() {
        println!("\n  {}\n", style("No tables found.").dim());
        return Ok(());
    }

    println!();
    println!(
        "  {} {} ({} tables)",
        style("Schema").bold(),
        style(database.dialect()).cyan(),
        schema.tables.len()
    );
    println!();
    println!("{}", schema_table(&schema));
    println!();
    Ok(())
}

fn schema_table(schema: &DatabaseSchema) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Table").fg(Color::White),
        Cell::new("Columns").fg(Color::White),
        Cell::new("Primary Key").fg(Color::White),
        Cell::new("References").fg(Color::White),
    ]);

    for t in &schema.tables {
        table.add_row(vec![
            Cell::new(&t.name).fg(Color::Cyan),
            Cell::new(columns_cell(t)),
            Cell::new(t.primary_keys.join(", ")),
            Cell::new(references_cell(t)).fg(Color::DarkGrey),
        ]);
    }
    table
}

fn columns_cell(table: &TableSchema) -> String {
    table
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.data_type))
        .collect::<Vec<_>>()
        .join("\n")
}

fn references_cell(table: &TableSchema) -> String {
    table
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "{} -> {}({})",
                fk.columns.join(", "),
                fk.referred_table,
                fk.referred_columns.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdb_types::schema::{ColumnInfo, ForeignKey};

    fn payments() -> TableSchema {
        let mut t = TableSchema::new("payments");
        t.columns = vec![
            ColumnInfo {
                name: "id".into(),
                data_type: "INTEGER".into(),
                nullable: false,
                default: None,
            },
            ColumnInfo {
                name: "user_id".into(),
                data_type: "INTEGER".into(),
                nullable: false,
                default: None,
            },
        ];
        t.primary_keys = vec!["id".into()];
        t.foreign_keys = vec![ForeignKey {
            columns: vec!["user_id".into()],
            referred_table: "users".into(),
            referred_columns: vec!["id".into()],
        }];
        t
    }

    #[test]
    fn test_cells() {
        let t = payments();
        assert_eq!(columns_cell(&t), "id INTEGER\nuser_id INTEGER");
        assert_eq!(references_cell(&t), "user_id -> users(id)");
    }

    #[test]
    fn test_table_lists_every_table() {
        let rendered = schema_table(&DatabaseSchema::new(vec![payments()])).to_string();
        assert!(rendered.contains("payments"));
        assert!(rendered.contains("Primary Key"));
    }
}
