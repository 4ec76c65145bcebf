use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::entities::field::{Field, FieldCatalog, FieldValue};
use crate::domain::entities::pagination::{Finalized, PageSummary, PaginationState};

/// Where the rendered table lives and which endpoint serves its pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableMeta {
    pub table: String,
    pub url: String,
    pub target: String,
}

/// Everything the renderer needs for one page of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    #[serde(flatten)]
    pub meta: TableMeta,
    pub fields: Vec<Field>,
    pub headers: Vec<String>,
    pub pagination: PageSummary,
    pub state: String,
    pub rows: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filter_options: BTreeMap<String, Vec<FieldValue>>,
}

impl TableView {
    pub fn new(
        meta: TableMeta,
        catalog: &FieldCatalog,
        state: &PaginationState<Finalized>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            meta,
            fields: catalog.fields().to_vec(),
            headers: catalog.headers(),
            pagination: state.summary(),
            state: state.state_json()?,
            rows,
            filter_options: BTreeMap::new(),
        })
    }

    pub fn with_filter_options(mut self, options: BTreeMap<String, Vec<FieldValue>>) -> Self {
        self.filter_options = options;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
