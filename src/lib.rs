//! Server-side paging, filtering and sorting for HTML data tables backed by a
//! flat SQL record set.
//!
//! A request flows through [`PaginationState`] in two passes: `precompute`
//! normalizes the client payload before any count is known, and `finalize`
//! clamps the page once the filtered count is in. [`FilterBuilder`] turns the
//! filter terms into a [`Predicate`] tree that stores bind as parameters, and
//! [`project`] flattens fetched rows into the visible cells of a [`TableView`].

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ui;
pub mod usecase;


pub use config::{AppConfig, TableConfig};
pub use domain::entities::field::{Field, FieldCatalog, FieldValue, RecordShape, ValueType};
pub use domain::entities::filter::{FilterBuilder, FilterTerm, FilterValue, Predicate};
pub use domain::entities::order::{OrderDirection, OrderTerm};
pub use domain::entities::pagination::{
    Finalized, Fresh, PageRequest, PageSummary, PaginationConfig, PaginationState, Precomputed,
    RecordCounts,
};
pub use domain::entities::projection::{project, Cell, Record, Row};
pub use domain::entities::table_view::{TableMeta, TableView};
pub use error::{ConfigError, TableError};
pub use infra::sqlite::store::SqliteStore;
pub use usecase::ports::store::{PageQuery, RecordStore, StoreError};
pub use usecase::services::table_service::TableService;
