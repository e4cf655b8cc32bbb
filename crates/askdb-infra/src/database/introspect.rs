//! Per-dialect schema introspection.
//!
//! Catalog identifiers are cast to text so every backend hands back plain
//! strings, whatever the catalog's native name type.

use serde_json::Value;

use askdb_types::error::DatabaseError;
use askdb_types::schema::{ColumnInfo, DatabaseSchema, ForeignKey, IndexInfo, TableSchema};

use super::Pool;
use super::dialect::Dialect;
use super::row::{int_at, text_at};

fn text(row: &[Value], index: usize) -> String {
    text_at(row, index).unwrap_or_default()
}

fn int(row: &[Value], index: usize, column: &str) -> Result<i64, DatabaseError> {
    int_at(row, index)
        .ok_or_else(|| DatabaseError::Introspection(format!("{column} is not an integer")))
}

async fn fetch(
    pool: &Pool,
    sql: &str,
    table: Option<&str>,
) -> Result<Vec<Vec<Value>>, DatabaseError> {
    let params: Vec<&str> = table.into_iter().collect();
    pool.fetch(sql, &params)
        .await
        .map(|result| result.rows)
        .map_err(|e| DatabaseError::Introspection(e.to_string()))
}

pub(crate) async fn introspect(
    pool: &Pool,
    dialect: Dialect,
) -> Result<DatabaseSchema, DatabaseError> {
    let names: Vec<String> = fetch(pool, table_list_query(dialect), None)
        .await?
        .iter()
        .map(|r| text(r, 0))
        .collect();

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let mut table = TableSchema::new(name.clone());
        match dialect {
            Dialect::Sqlite => sqlite_table(pool, &mut table).await?,
            Dialect::Postgres => catalog_table(pool, &POSTGRES, &mut table).await?,
            Dialect::MySql => catalog_table(pool, &MYSQL, &mut table).await?,
        }
        tables.push(table);
    }

    Ok(DatabaseSchema::new(tables))
}

/// SQLite exposes everything through table-valued pragma functions.
async fn sqlite_table(pool: &Pool, table: &mut TableSchema) -> Result<(), DatabaseError> {
    let name = table.name.clone();

    let rows = fetch(
        pool,
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
        Some(&name),
    )
    .await?;
    let mut pk: Vec<(i64, String)> = Vec::new();
    for row in &rows {
        let column = text(row, 0);
        let position = int(row, 4, "pk")?;
        if position > 0 {
            pk.push((position, column.clone()));
        }
        table.columns.push(ColumnInfo {
            name: column,
            data_type: text(row, 1),
            nullable: int(row, 2, "notnull")? == 0,
            default: text_at(row, 3),
        });
    }
    pk.sort_by_key(|(position, _)| *position);
    table.primary_keys = pk.into_iter().map(|(_, c)| c).collect();

    let rows = fetch(
        pool,
        "SELECT id, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?) ORDER BY id, seq",
        Some(&name),
    )
    .await?;
    let fk_rows = rows
        .iter()
        .map(|r| {
            Ok(FkRow {
                constraint: int(r, 0, "id")?.to_string(),
                referred_table: text(r, 1),
                column: text(r, 2),
                // NULL when the key targets the referred table's primary key implicitly.
                referred_column: text(r, 3),
            })
        })
        .collect::<Result<Vec<_>, DatabaseError>>()?;
    table.foreign_keys = group_foreign_keys(fk_rows);

    let rows = fetch(
        pool,
        "SELECT name, \"unique\" FROM pragma_index_list(?) WHERE origin <> 'pk' ORDER BY name",
        Some(&name),
    )
    .await?;
    for row in &rows {
        let index_name = text(row, 0);
        if index_name.starts_with("sqlite_autoindex") {
            continue;
        }
        let unique = int(row, 1, "unique")? != 0;
        let columns = fetch(
            pool,
            "SELECT name FROM pragma_index_info(?) ORDER BY seqno",
            Some(&index_name),
        )
        .await?
        .iter()
        .map(|r| text(r, 0))
        .collect();
        table.indexes.push(IndexInfo {
            name: index_name,
            columns,
            unique,
        });
    }

    Ok(())
}

/// PostgreSQL and MySQL share the shape of their catalog queries.
async fn catalog_table(
    pool: &Pool,
    queries: &CatalogQueries,
    table: &mut TableSchema,
) -> Result<(), DatabaseError> {
    let name = table.name.clone();

    for row in fetch(pool, queries.columns, Some(&name)).await? {
        table.columns.push(ColumnInfo {
            name: text(&row, 0),
            data_type: text(&row, 1),
            nullable: text(&row, 2).eq_ignore_ascii_case("YES"),
            default: text_at(&row, 3),
        });
    }

    table.primary_keys = fetch(pool, queries.primary_keys, Some(&name))
        .await?
        .iter()
        .map(|r| text(r, 0))
        .collect();

    let fk_rows = fetch(pool, queries.foreign_keys, Some(&name))
        .await?
        .iter()
        .map(|r| FkRow {
            constraint: text(r, 0),
            referred_table: text(r, 1),
            column: text(r, 2),
            referred_column: text(r, 3),
        })
        .collect();
    table.foreign_keys = group_foreign_keys(fk_rows);

    let index_rows = fetch(pool, queries.indexes, Some(&name))
        .await?
        .iter()
        .map(|r| IndexRow {
            name: text(r, 0),
            unique: text(r, 1) == "1" || text(r, 1).eq_ignore_ascii_case("true"),
            column: text(r, 2),
        })
        .collect();
    table.indexes = group_indexes(index_rows);

    Ok(())
}

fn table_list_query(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => {
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
        Dialect::Postgres => {
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        Dialect::MySql => {
            "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
    }
}

/// Per-table catalog queries, each taking the table name as its only parameter.
struct CatalogQueries {
    columns: &'static str,
    primary_keys: &'static str,
    foreign_keys: &'static str,
    indexes: &'static str,
}

const POSTGRES: CatalogQueries = CatalogQueries {
    columns: "SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
              FROM information_schema.columns \
              WHERE table_schema = current_schema() AND table_name = $1 \
              ORDER BY ordinal_position",
    primary_keys: "SELECT kcu.column_name::text \
                   FROM information_schema.table_constraints tc \
                   JOIN information_schema.key_column_usage kcu \
                     ON tc.constraint_name = kcu.constraint_name \
                    AND tc.table_schema = kcu.table_schema \
                   WHERE tc.constraint_type = 'PRIMARY KEY' \
                     AND tc.table_schema = current_schema() AND tc.table_name = $1 \
                   ORDER BY kcu.ordinal_position",
    foreign_keys: "SELECT c.conname::text, rt.relname::text, la.attname::text, ra.attname::text \
                   FROM pg_constraint c \
                   JOIN pg_class t ON t.oid = c.conrelid \
                   JOIN pg_namespace n ON n.oid = t.relnamespace \
                   JOIN pg_class rt ON rt.oid = c.confrelid \
                   CROSS JOIN LATERAL unnest(c.conkey, c.confkey) WITH ORDINALITY AS k(lnum, rnum, ord) \
                   JOIN pg_attribute la ON la.attrelid = c.conrelid AND la.attnum = k.lnum \
                   JOIN pg_attribute ra ON ra.attrelid = c.confrelid AND ra.attnum = k.rnum \
                   WHERE c.contype = 'f' AND n.nspname = current_schema() AND t.relname = $1 \
                   ORDER BY c.conname, k.ord",
    indexes: "SELECT i.relname::text, ix.indisunique::text, a.attname::text \
              FROM pg_index ix \
              JOIN pg_class t ON t.oid = ix.indrelid \
              JOIN pg_class i ON i.oid = ix.indexrelid \
              JOIN pg_namespace n ON n.oid = t.relnamespace \
              CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) \
              JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
              WHERE n.nspname = current_schema() AND t.relname = $1 AND NOT ix.indisprimary \
              ORDER BY i.relname, k.ord",
};

const MYSQL: CatalogQueries = CatalogQueries {
    columns: "SELECT CAST(column_name AS CHAR), CAST(column_type AS CHAR), \
                     CAST(is_nullable AS CHAR), CAST(column_default AS CHAR) \
              FROM information_schema.columns \
              WHERE table_schema = DATABASE() AND table_name = ? \
              ORDER BY ordinal_position",
    primary_keys: "SELECT CAST(column_name AS CHAR) FROM information_schema.key_column_usage \
                   WHERE table_schema = DATABASE() AND table_name = ? \
                     AND constraint_name = 'PRIMARY' \
                   ORDER BY ordinal_position",
    foreign_keys: "SELECT CAST(constraint_name AS CHAR), CAST(referenced_table_name AS CHAR), \
                          CAST(column_name AS CHAR), CAST(referenced_column_name AS CHAR) \
                   FROM information_schema.key_column_usage \
                   WHERE table_schema = DATABASE() AND table_name = ? \
                     AND referenced_table_name IS NOT NULL \
                   ORDER BY constraint_name, ordinal_position",
    indexes: "SELECT CAST(index_name AS CHAR), CAST(1 - non_unique AS CHAR), \
                     CAST(column_name AS CHAR) \
              FROM information_schema.statistics \
              WHERE table_schema = DATABASE() AND table_name = ? \
                AND index_name <> 'PRIMARY' \
              ORDER BY index_name, seq_in_index",
};

/// One column pair of a (possibly composite) foreign key.
struct FkRow {
    constraint: String,
    referred_table: String,
    column: String,
    referred_column: String,
}

/// Fold consecutive rows of the same constraint into one [`ForeignKey`].
fn group_foreign_keys(rows: Vec<FkRow>) -> Vec<ForeignKey> {
    let mut grouped: Vec<(String, ForeignKey)> = Vec::new();
    for row in rows {
        match grouped.last_mut() {
            Some((constraint, fk)) if *constraint == row.constraint => {
                fk.columns.push(row.column);
                if !row.referred_column.is_empty() {
                    fk.referred_columns.push(row.referred_column);
                }
            }
            _ => grouped.push((
                row.constraint,
                ForeignKey {
                    columns: vec![row.column],
                    referred_table: row.referred_table,
                    referred_columns: if row.referred_column.is_empty() {
                        Vec::new()
                    } else {
                        vec![row.referred_column]
                    },
                },
            )),
        }
    }
    grouped.into_iter().map(|(_, fk)| fk).collect()
}

struct IndexRow {
    name: String,
    unique: bool,
    column: String,
}

fn group_indexes(rows: Vec<IndexRow>) -> Vec<IndexInfo> {
    let mut indexes: Vec<IndexInfo> = Vec::new();
    for row in rows {
        match indexes.last_mut() {
            Some(idx) if idx.name == row.name => idx.columns.push(row.column),
            _ => indexes.push(IndexInfo {
                name: row.name,
                columns: vec![row.column],
                unique: row.unique,
            }),
        }
    }
    indexes
}
