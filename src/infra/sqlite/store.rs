use std::path::PathBuf;

use crate::domain::entities::field::{FieldCatalog, FieldValue};
use crate::domain::entities::filter::Predicate;
use crate::domain::entities::projection::Row;
use crate::infra::sqlite::queries::{count_rows, distinct_values, fetch_rows};
use crate::infra::sqlite::schema::{init_table, open_connection};
use crate::usecase::ports::store::{PageQuery, RecordStore, StoreError};

fn store_error(err: anyhow::Error) -> StoreError {
    StoreError::Message(format!("{err:#}"))
}

/// A single flat SQLite table whose columns are the catalog fields.
pub struct SqliteStore {
    pub db_path: PathBuf,
    pub table: String,
    pub catalog: FieldCatalog,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>, table: impl Into<String>, catalog: FieldCatalog) -> Self {
        Self {
            db_path: db_path.into(),
            table: table.into(),
            catalog,
        }
    }

    pub fn init(&self) -> Result<(), StoreError> {
        init_table(&self.db_path, &self.table, &self.catalog).map_err(store_error)
    }
}

impl RecordStore for SqliteStore {
    fn count(&self, predicate: Option<&Predicate>) -> Result<u64, StoreError> {
        let conn = open_connection(&self.db_path).map_err(store_error)?;
        count_rows(&conn, &self.table, &self.catalog, predicate).map_err(store_error)
    }

    fn fetch(&self, query: &PageQuery) -> Result<Vec<Row>, StoreError> {
        let conn = open_connection(&self.db_path).map_err(store_error)?;
        fetch_rows(&conn, &self.table, &self.catalog, query).map_err(store_error)
    }

    fn distinct_values(
        &self,
        field: &str,
        predicate: Option<&Predicate>,
        limit: u64,
    ) -> Result<Vec<FieldValue>, StoreError> {
        let conn = open_connection(&self.db_path).map_err(store_error)?;
        distinct_values(&conn, &self.table, &self.catalog, field, predicate, limit)
            .map_err(store_error)
    }
}
