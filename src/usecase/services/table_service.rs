use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, instrument};

use crate::config::TableConfig;
use crate::domain::entities::field::{FieldCatalog, FieldValue};
use crate::domain::entities::filter::{FilterBuilder, Predicate};
use crate::domain::entities::pagination::{
    PageRequest, PaginationConfig, PaginationState, RecordCounts,
};
use crate::domain::entities::projection::project;
use crate::domain::entities::table_view::{TableMeta, TableView};
use crate::error::TableError;
use crate::usecase::ports::store::{PageQuery, RecordStore};

/// Runs one table request end to end against a row store.
pub struct TableService {
    store: Arc<dyn RecordStore>,
    catalog: FieldCatalog,
    meta: TableMeta,
    pagination: PaginationConfig,
    field_filters_enabled: bool,
    filter_option_limit: u64,
}

impl TableService {
    pub fn new(store: Arc<dyn RecordStore>, config: &TableConfig) -> Self {
        Self {
            store,
            catalog: config.fields.clone(),
            meta: config.meta(),
            pagination: config.pagination.clone(),
            field_filters_enabled: config.field_filters_enabled,
            filter_option_limit: config.filter_option_limit,
        }
    }

    #[instrument(skip_all, fields(table = %self.meta.table))]
    pub fn load_page(&self, request: &PageRequest) -> Result<TableView, TableError> {
        let precomputed = PaginationState::new(self.pagination.clone()).precompute(request);
        let predicate = FilterBuilder::from_terms(&self.catalog, precomputed.filter_terms());

        let total = self.store.count(None).inspect_err(|err| {
            error!(error = %err, "total count query failed");
        })?;
        // A predicate without clauses selects every row, so total stands in.
        let counts = match &predicate {
            Some(predicate) if precomputed.is_filtered() && !predicate.is_vacuous() => {
                let filtered = self.store.count(Some(predicate)).inspect_err(|err| {
                    error!(error = %err, "filtered count query failed");
                })?;
                RecordCounts::filtered(total, filtered)
            }
            _ => RecordCounts::unfiltered(total),
        };

        let state = precomputed.finalize(counts);
        debug!(
            page = state.page_number(),
            pages = state.page_count(),
            offset = state.offset(),
            total = counts.total,
            filtered = counts.filtered,
            "page finalized"
        );

        let query = PageQuery::new(&state, predicate);
        let rows = self.store.fetch(&query).inspect_err(|err| {
            error!(error = %err, "page fetch failed");
        })?;
        let projected = project(self.catalog.fields(), &rows);

        let mut view = TableView::new(self.meta.clone(), &self.catalog, &state, projected)?;
        if self.field_filters_enabled {
            view = view.with_filter_options(self.filter_options(query.predicate.as_ref())?);
        }
        Ok(view)
    }

    /// The view to render when the store is unavailable: same request, no
    /// records.
    pub fn empty_view(&self, request: &PageRequest) -> Result<TableView, TableError> {
        let state = PaginationState::new(self.pagination.clone())
            .precompute(request)
            .finalize(RecordCounts::default());
        TableView::new(self.meta.clone(), &self.catalog, &state, Vec::new())
            .map_err(TableError::from)
    }

    /// Loads the page, falling back to the empty view on store failure.
    pub fn load_page_or_empty(&self, request: &PageRequest) -> Result<TableView, TableError> {
        match self.load_page(request) {
            Err(TableError::Store(_)) => self.empty_view(request),
            other => other,
        }
    }

    fn filter_options(
        &self,
        predicate: Option<&Predicate>,
    ) -> Result<BTreeMap<String, Vec<FieldValue>>, TableError> {
        let mut options = BTreeMap::new();
        for field in self.catalog.visible() {
            let values =
                self.store
                    .distinct_values(&field.name, predicate, self.filter_option_limit)?;
            options.insert(field.name.clone(), values);
        }
        Ok(options)
    }
}
