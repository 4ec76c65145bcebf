use dioxus::prelude::*;

use crate::domain::entities::field::ValueType;
use crate::domain::entities::filter::FilterTerm;
use crate::domain::entities::order::{OrderDirection, OrderTerm};
use crate::domain::entities::pagination::PageRequest;
use crate::domain::entities::table_view::TableView;

#[derive(Clone, Copy)]
pub struct AppState {
    pub view: Signal<Option<TableView>>,
    pub search_input: Signal<String>,
    pub status: Signal<String>,
}

impl AppState {
    /// `load` runs once, on the first render.
    pub fn new(load: impl FnOnce() -> Option<TableView>) -> Self {
        let view = use_signal(load);
        Self {
            view,
            search_input: use_signal(move || {
                view.peek()
                    .as_ref()
                    .and_then(|view| view.pagination.global_filter_term.clone())
                    .unwrap_or_default()
            }),
            status: use_signal(|| "Ready".to_string()),
        }
    }

    /// The next request starts from the state blob of the page on screen.
    pub fn current_request(&self) -> PageRequest {
        self.view
            .read()
            .as_ref()
            .map(|view| PageRequest::from_json(&view.state))
            .unwrap_or_default()
    }
}

pub fn with_page(mut request: PageRequest, page: u64) -> PageRequest {
    request.page_number = Some(i64::try_from(page).unwrap_or(i64::MAX));
    request
}

pub fn with_page_size(mut request: PageRequest, page_size: u64) -> PageRequest {
    request.page_size = Some(i64::try_from(page_size).unwrap_or(i64::MAX));
    request.page_number = Some(1);
    request
}

/// Replaces the global term; a blank term removes it.
pub fn with_global_term(mut request: PageRequest, term: &str) -> PageRequest {
    request.filter_terms.retain(|existing| !existing.is_global());
    if !term.trim().is_empty() {
        let mut global = FilterTerm::global(term.trim());
        global.is_new = true;
        request.filter_terms.insert(0, global);
    }
    request.page_number = Some(1);
    request
}

/// Replaces the term for `field`; a blank term removes it.
pub fn with_field_term(
    mut request: PageRequest,
    field: &str,
    value_type: ValueType,
    term: &str,
) -> PageRequest {
    request
        .filter_terms
        .retain(|existing| existing.field.as_deref() != Some(field));
    if !term.is_empty() {
        let mut added = FilterTerm::field(field, value_type, term);
        added.is_new = true;
        request.filter_terms.push(added);
    }
    request.page_number = Some(1);
    request
}

/// Clicking the primary sort column flips its direction; any other column
/// becomes the only, ascending, sort.
pub fn with_sort(mut request: PageRequest, field: &str) -> PageRequest {
    let direction = match request.order_terms.first() {
        Some(primary) if primary.field == field => primary.direction.toggled(),
        _ => OrderDirection::Asc,
    };
    request.order_terms = vec![OrderTerm {
        field: field.to_string(),
        direction,
    }];
    request
}

pub fn field_term<'a>(request: &'a PageRequest, field: &str) -> Option<&'a str> {
    request
        .filter_terms
        .iter()
        .find(|term| term.field.as_deref() == Some(field))
        .map(|term| term.term.as_str())
}
