use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::domain::entities::field::{FieldCatalog, ValueType};
use crate::infra::sqlite::queries::quote_ident;

pub const UNICODE_LOWER: &str = "unicode_lower";

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    register_functions(&conn)?;
    Ok(conn)
}

/// SQLite's built-in `LOWER` only folds ASCII; search needles are folded
/// with the full Unicode mapping, so columns must be too.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|value| value.to_lowercase()))
        },
    )
    .context("failed to register unicode_lower")
}

fn column_type(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Int | ValueType::Bool => "INTEGER",
        ValueType::String => "TEXT",
    }
}

/// Creates `table` with one column per catalog field if it does not exist.
pub fn init_table(db_path: &Path, table: &str, catalog: &FieldCatalog) -> Result<()> {
    if catalog.is_empty() {
        anyhow::bail!("cannot create table {table} without fields")
    }

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let columns = catalog
        .fields()
        .iter()
        .map(|field| {
            Ok(format!(
                "{} {}",
                quote_ident(&field.name)?,
                column_type(field.value_type)
            ))
        })
        .collect::<Result<Vec<_>>>()?
        .join(",\n            ");

    let conn = open_connection(db_path)?;
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {} (
            {columns}
        );
        ",
        quote_ident(table)?
    ))
    .with_context(|| format!("failed to initialize table {table}"))?;

    Ok(())
}
