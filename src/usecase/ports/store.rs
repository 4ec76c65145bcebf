use thiserror::Error;

use crate::domain::entities::field::FieldValue;
use crate::domain::entities::filter::Predicate;
use crate::domain::entities::order::OrderTerm;
use crate::domain::entities::pagination::{Finalized, PaginationState};
use crate::domain::entities::projection::Row;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Message(String),
}

/// One bounded page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub predicate: Option<Predicate>,
    pub order: Vec<OrderTerm>,
    pub limit: u64,
    pub offset: u64,
}

impl PageQuery {
    /// Limit and offset are only trustworthy once the state is finalized.
    pub fn new(state: &PaginationState<Finalized>, predicate: Option<Predicate>) -> Self {
        Self {
            predicate,
            order: state.order_terms().to_vec(),
            limit: state.limit(),
            offset: state.offset(),
        }
    }
}

/// The row store behind a table. Rows come back in catalog field order.
pub trait RecordStore: Send + Sync {
    fn count(&self, predicate: Option<&Predicate>) -> Result<u64, StoreError>;
    fn fetch(&self, query: &PageQuery) -> Result<Vec<Row>, StoreError>;
    fn distinct_values(
        &self,
        field: &str,
        predicate: Option<&Predicate>,
        limit: u64,
    ) -> Result<Vec<FieldValue>, StoreError>;
}
