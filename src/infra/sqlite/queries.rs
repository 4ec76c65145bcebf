use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::domain::entities::field::{Field, FieldCatalog, FieldValue, ValueType};
use crate::domain::entities::filter::{FilterValue, Predicate};
use crate::domain::entities::order::OrderTerm;
use crate::domain::entities::projection::{Cell, Row};
use crate::infra::sqlite::schema::UNICODE_LOWER;
use crate::usecase::ports::store::PageQuery;

/// Query text plus the values bound to its `?` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Identifiers cannot be bound, so only plain names are let through.
pub fn quote_ident(name: &str) -> Result<String> {
    if !is_identifier(name) {
        anyhow::bail!("invalid identifier: {name:?}")
    }
    Ok(format!("\"{name}\""))
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn catalog_column(catalog: &FieldCatalog, name: &str) -> Result<String> {
    if !catalog.contains(name) {
        anyhow::bail!("field {name:?} is not part of the table")
    }
    quote_ident(name)
}

fn bind_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::Int(value) => Value::Integer(*value),
        FilterValue::Bool(value) => Value::Integer(i64::from(*value)),
        FilterValue::Text(value) => Value::Text(value.clone()),
    }
}

fn compile_node(
    catalog: &FieldCatalog,
    node: &Predicate,
    params: &mut Vec<Value>,
) -> Result<Option<String>> {
    let (children, joiner) = match node {
        Predicate::Equals { field, value } => {
            params.push(bind_value(value));
            return Ok(Some(format!("{} = ?", catalog_column(catalog, field)?)));
        }
        Predicate::Like { field, needle } => {
            params.push(Value::Text(format!("%{}%", escape_like(needle))));
            return Ok(Some(format!(
                "{UNICODE_LOWER}(CAST({} AS TEXT)) LIKE ? ESCAPE '\\'",
                catalog_column(catalog, field)?
            )));
        }
        Predicate::And(children) => (children, " AND "),
        Predicate::Or(children) => (children, " OR "),
    };

    let mut parts = Vec::new();
    for child in children {
        if let Some(part) = compile_node(catalog, child, params)? {
            parts.push(part);
        }
    }
    Ok(match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(format!("({})", parts.join(joiner))),
    })
}

/// Compiles to ` WHERE ...`, or to nothing when there is no effective clause.
pub fn compile_predicate(
    catalog: &FieldCatalog,
    predicate: Option<&Predicate>,
) -> Result<SqlFragment> {
    let mut params = Vec::new();
    let clause = match predicate {
        Some(predicate) => compile_node(catalog, predicate, &mut params)?,
        None => None,
    };
    Ok(match clause {
        Some(clause) => SqlFragment {
            sql: format!(" WHERE {clause}"),
            params,
        },
        None => SqlFragment::default(),
    })
}

/// Unknown fields are skipped; rowid keeps paging stable between equal keys.
pub fn compile_order(catalog: &FieldCatalog, order: &[OrderTerm]) -> String {
    let mut terms = Vec::new();
    for term in order {
        match catalog_column(catalog, &term.field) {
            Ok(column) => terms.push(format!("{column} {}", term.direction.as_sql())),
            Err(err) => warn!(field = term.field.as_str(), "dropping order term: {err}"),
        }
    }
    terms.push("rowid ASC".to_string());
    format!(" ORDER BY {}", terms.join(", "))
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn cell_from_value(field: &Field, value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Integer(value) if field.value_type == ValueType::Bool => Cell::Bool(value != 0),
        Value::Integer(value) => Cell::Int(value),
        Value::Real(value) => Cell::Real(value),
        Value::Text(value) => Cell::Text(value),
        Value::Blob(bytes) => Cell::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// Converts raw text into the value stored for `field`. Unparseable numbers
/// are stored as NULL.
pub fn value_for_field(field: &Field, raw: &str) -> Value {
    let raw = raw.trim();
    match field.value_type {
        ValueType::String => Value::Text(raw.to_string()),
        ValueType::Int => raw.parse::<i64>().map_or(Value::Null, Value::Integer),
        ValueType::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Integer(1),
            "false" | "0" | "no" => Value::Integer(0),
            _ => Value::Null,
        },
    }
}

pub fn count_rows(
    conn: &Connection,
    table: &str,
    catalog: &FieldCatalog,
    predicate: Option<&Predicate>,
) -> Result<u64> {
    let filter = compile_predicate(catalog, predicate)?;
    let count_sql = format!("SELECT COUNT(*) FROM {}{}", quote_ident(table)?, filter.sql);
    debug!(sql = count_sql.as_str(), params = filter.params.len(), "count query");

    let total: i64 = conn
        .query_row(&count_sql, rusqlite::params_from_iter(filter.params), |row| {
            row.get(0)
        })
        .context("failed to query row count")?;
    Ok(u64::try_from(total).unwrap_or_default())
}

pub fn fetch_rows(
    conn: &Connection,
    table: &str,
    catalog: &FieldCatalog,
    query: &PageQuery,
) -> Result<Vec<Row>> {
    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let columns = catalog
        .fields()
        .iter()
        .map(|field| quote_ident(&field.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    let filter = compile_predicate(catalog, query.predicate.as_ref())?;
    let row_sql = format!(
        "SELECT {columns} FROM {}{}{} LIMIT ? OFFSET ?",
        quote_ident(table)?,
        filter.sql,
        compile_order(catalog, &query.order)
    );
    debug!(
        sql = row_sql.as_str(),
        limit = query.limit,
        offset = query.offset,
        "page query"
    );

    let mut row_params = filter.params;
    row_params.push(Value::Integer(to_sql_int(query.limit)));
    row_params.push(Value::Integer(to_sql_int(query.offset)));

    let mut row_stmt = conn
        .prepare(&row_sql)
        .context("failed to prepare page query")?;
    let mut rows = row_stmt
        .query(rusqlite::params_from_iter(row_params))
        .context("failed to run page query")?;

    let mut page = Vec::new();
    while let Some(row) = rows.next().context("failed to read page row")? {
        let mut cells = Vec::with_capacity(catalog.len());
        for (idx, field) in catalog.fields().iter().enumerate() {
            let value: Value = row
                .get(idx)
                .with_context(|| format!("failed to read column {}", field.name))?;
            cells.push(cell_from_value(field, value));
        }
        page.push(Row(cells));
    }

    Ok(page)
}

pub fn distinct_values(
    conn: &Connection,
    table: &str,
    catalog: &FieldCatalog,
    field: &str,
    predicate: Option<&Predicate>,
    limit: u64,
) -> Result<Vec<FieldValue>> {
    let target = catalog
        .get(field)
        .with_context(|| format!("field {field:?} is not part of the table"))?;
    let column = quote_ident(&target.name)?;
    let filter = compile_predicate(catalog, predicate)?;
    let distinct_sql = format!(
        "SELECT {column}, COUNT(*) FROM {}{} GROUP BY {column} ORDER BY {column} ASC LIMIT ?",
        quote_ident(table)?,
        filter.sql
    );

    let mut params = filter.params;
    params.push(Value::Integer(to_sql_int(limit)));

    let mut stmt = conn
        .prepare(&distinct_sql)
        .context("failed to prepare distinct value query")?;
    let values = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            let value: Value = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((value, count))
        })
        .context("failed to query distinct values")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect distinct values")?;

    Ok(values
        .into_iter()
        .map(|(value, count)| FieldValue {
            value: cell_from_value(target, value).to_string(),
            count: u64::try_from(count).unwrap_or_default(),
        })
        .collect())
}

pub fn insert_rows(
    tx: &rusqlite::Transaction<'_>,
    table: &str,
    catalog: &FieldCatalog,
    rows: &[Vec<String>],
) -> Result<u64> {
    let columns = catalog
        .fields()
        .iter()
        .map(|field| quote_ident(&field.name))
        .collect::<Result<Vec<_>>>()?;
    let placeholders = std::iter::repeat_n("?", columns.len())
        .collect::<Vec<_>>()
        .join(", ");
    let mut insert_row = tx
        .prepare(&format!(
            "INSERT INTO {}({}) VALUES ({placeholders})",
            quote_ident(table)?,
            columns.join(", ")
        ))
        .context("failed to prepare row insert")?;

    let mut inserted = 0_u64;
    for row in rows {
        let values = catalog
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| value_for_field(field, row.get(idx).map_or("", String::as_str)));
        insert_row
            .execute(rusqlite::params_from_iter(values))
            .context("failed to insert row")?;
        inserted += 1;
    }

    Ok(inserted)
}
