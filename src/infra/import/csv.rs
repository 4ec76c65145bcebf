use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::field::FieldCatalog;
use crate::infra::sqlite::queries::insert_rows;
use crate::infra::sqlite::schema::{init_table, open_connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub row_count: u64,
}

/// Maps each catalog field to the csv column with the same header name.
fn column_positions(headers: &csv::StringRecord, catalog: &FieldCatalog) -> Result<Vec<usize>> {
    catalog
        .fields()
        .iter()
        .map(|field| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(&field.name))
                .with_context(|| format!("csv has no column named {}", field.name))
        })
        .collect()
}

pub fn import_csv_to_sqlite(
    db_path: &Path,
    csv_path: &Path,
    table: &str,
    catalog: &FieldCatalog,
) -> Result<ImportResult> {
    init_table(db_path, table, catalog)?;

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .clone();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }
    let positions = column_positions(&headers, catalog)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        rows.push(
            positions
                .iter()
                .map(|idx| record.get(*idx).unwrap_or("").to_string())
                .collect::<Vec<_>>(),
        );
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;
    let row_count = insert_rows(&tx, table, catalog, &rows)?;
    tx.commit().context("failed to commit import transaction")?;

    info!(
        table,
        rows = row_count,
        source = %csv_path.display(),
        "imported csv"
    );

    Ok(ImportResult { row_count })
}
