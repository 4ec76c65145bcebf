use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use dioxus::prelude::*;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::domain::entities::field::Field;
use crate::domain::entities::order::OrderDirection;
use crate::domain::entities::pagination::PageRequest;
use crate::infra::import::csv::import_csv_to_sqlite;
use crate::infra::sqlite::store::SqliteStore;
use crate::ui::state::app_state::{
    field_term, with_field_term, with_global_term, with_page, with_page_size, with_sort, AppState,
};
use crate::usecase::ports::store::RecordStore;
use crate::usecase::services::table_service::TableService;

const NONE_OPTION_VALUE: &str = "__none__";

/// Opens the configured table, seeding it from csv on first run.
pub fn open_table(config: &AppConfig) -> anyhow::Result<TableService> {
    let db_path = config.resolved_db_path()?;
    let table = &config.table;
    let store = SqliteStore::new(db_path.clone(), table.table.clone(), table.fields.clone());
    store.init()?;

    if let Some(seed_csv) = &config.seed_csv {
        if store.count(None)? == 0 {
            let imported = import_csv_to_sqlite(&db_path, seed_csv, &table.table, &table.fields)
                .with_context(|| format!("failed to seed from {}", seed_csv.display()))?;
            info!(rows = imported.row_count, "seeded table");
        }
    }

    Ok(TableService::new(Arc::new(store), table))
}

#[derive(Clone)]
pub struct SharedService(pub Rc<TableService>);

impl PartialEq for SharedService {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn reload(service: &TableService, mut state: AppState, request: PageRequest) {
    match service.load_page(&request) {
        Ok(view) => {
            state.status.set(format!(
                "{} of {} records",
                view.pagination.filtered_count, view.pagination.total_count
            ));
            state.view.set(Some(view));
        }
        Err(err) => {
            error!(error = %err, "failed to load page");
            state.status.set(format!("Failed to load page: {err}"));
            state.view.set(service.empty_view(&request).ok());
        }
    }
}

fn sort_marker(
    field: &Field,
    order_element: Option<&str>,
    direction: Option<OrderDirection>,
) -> &'static str {
    if order_element != Some(field.name.as_str()) {
        return "";
    }
    match direction {
        Some(OrderDirection::Desc) => " ▼",
        _ => " ▲",
    }
}

#[component]
pub fn App() -> Element {
    let config = use_context::<AppConfig>();
    let service = use_hook(move || {
        open_table(&config)
            .map(Rc::new)
            .map_err(|err| format!("{err:#}"))
    });

    match service {
        Ok(service) => rsx! {
            TablePage { service: SharedService(service) }
        },
        Err(err) => rsx! {
            div {
                p { "Unable to open table: {err}" }
            }
        },
    }
}

#[component]
fn TablePage(service: SharedService) -> Element {
    let state = {
        let service = service.clone();
        AppState::new(move || {
            service
                .0
                .load_page_or_empty(&PageRequest::default())
                .inspect_err(|err| error!(error = %err, "initial page failed"))
                .ok()
        })
    };
    let mut search_input = state.search_input;

    let Some(view) = state.view.read().clone() else {
        return rsx! {
            div { "{state.status}" }
        };
    };

    let pagination = view.pagination.clone();
    let visible: Vec<Field> = view.fields.iter().filter(|f| f.visible).cloned().collect();
    let column_count = visible.len().max(1);
    let order_element = pagination.order_element.clone();
    let order_direction = pagination.order_direction;
    let current = state.current_request();

    rsx! {
        div {
            style: "display: flex; flex-direction: column; height: 100vh; padding: 12px; box-sizing: border-box; font-family: sans-serif;",

            div {
                style: "display: flex; gap: 12px; align-items: center; margin-bottom: 12px;",
                input {
                    placeholder: "Search",
                    value: "{search_input}",
                    oninput: move |event| search_input.set(event.value()),
                    onkeydown: {
                        let service = service.clone();
                        move |event: KeyboardEvent| {
                            if event.key() == Key::Enter {
                                let request = with_global_term(state.current_request(), &search_input());
                                reload(&service.0, state, request);
                            }
                        }
                    },
                }
                button {
                    onclick: {
                        let service = service.clone();
                        move |_| {
                            let request = with_global_term(state.current_request(), &search_input());
                            reload(&service.0, state, request);
                        }
                    },
                    "Search"
                }
                label { "Rows per page" }
                select {
                    value: "{pagination.page_size}",
                    onchange: {
                        let service = service.clone();
                        move |event: FormEvent| {
                            if let Ok(size) = event.value().parse::<u64>() {
                                let request = with_page_size(state.current_request(), size);
                                reload(&service.0, state, request);
                            }
                        }
                    },
                    {pagination.page_size_options.iter().map(|size| {
                        let selected = *size == pagination.page_size;
                        rsx!(
                            option { key: "{size}", value: "{size}", selected: selected, "{size}" }
                        )
                    })}
                }
                span { style: "color: #666;", "{state.status}" }
            }

            if !view.filter_options.is_empty() {
                div {
                    style: "display: flex; gap: 12px; align-items: center; margin-bottom: 12px; flex-wrap: wrap;",
                    {visible.iter().filter_map(|field| {
                        let values = view.filter_options.get(&field.name)?.clone();
                        let selected = field_term(&current, &field.name)
                            .unwrap_or(NONE_OPTION_VALUE)
                            .to_string();
                        let name = field.name.clone();
                        let value_type = field.value_type;
                        let header = field.header().to_string();
                        let service = service.clone();
                        Some(rsx!(
                            label { key: "{name}",
                                "{header} "
                                select {
                                    value: "{selected}",
                                    onchange: {
                                        let name = name.clone();
                                        move |event: FormEvent| {
                                            let raw = event.value();
                                            let term = if raw == NONE_OPTION_VALUE { String::new() } else { raw };
                                            let request = with_field_term(state.current_request(), &name, value_type, &term);
                                            reload(&service.0, state, request);
                                        }
                                    },
                                    option { value: NONE_OPTION_VALUE, "(all)" }
                                    {values.into_iter().map(|value| {
                                        let is_selected = value.value == selected;
                                        rsx!(
                                            option {
                                                key: "{value.value}",
                                                value: "{value.value}",
                                                selected: is_selected,
                                                "{value.value} ({value.count})"
                                            }
                                        )
                                    })}
                                }
                            }
                        ))
                    })}
                }
            }

            div {
                style: "flex: 1; overflow: auto; border: 1px solid #ddd;",
                table {
                    style: "border-collapse: collapse; width: 100%;",
                    thead {
                        tr {
                            {visible.iter().map(|field| {
                                let marker = sort_marker(field, order_element.as_deref(), order_direction);
                                let header = field.header().to_string();
                                let name = field.name.clone();
                                let service = service.clone();
                                rsx!(
                                    th {
                                        key: "{name}",
                                        style: "position: sticky; top: 0; background: #f5f5f5; text-align: left; padding: 6px 8px; cursor: pointer; border-bottom: 1px solid #ccc;",
                                        onclick: {
                                            let name = name.clone();
                                            move |_| {
                                                let request = with_sort(state.current_request(), &name);
                                                reload(&service.0, state, request);
                                            }
                                        },
                                        "{header}{marker}"
                                    }
                                )
                            })}
                        }
                    }
                    tbody {
                        if view.rows.is_empty() {
                            tr {
                                td {
                                    colspan: "{column_count}",
                                    style: "padding: 12px; text-align: center; color: #888;",
                                    "No records"
                                }
                            }
                        }
                        {view.rows.iter().enumerate().map(|(row_idx, row)| {
                            rsx!(
                                tr { key: "{row_idx}",
                                    {row.iter().map(|cell| rsx!(
                                        td { style: "padding: 4px 8px; border-bottom: 1px solid #eee;", "{cell}" }
                                    ))}
                                }
                            )
                        })}
                    }
                }
            }

            div {
                style: "display: flex; gap: 8px; align-items: center; margin-top: 12px;",
                span {
                    "Showing {pagination.first_record_index} to {pagination.last_record_index} of {pagination.filtered_count}"
                }
                if pagination.is_filtered {
                    span { style: "color: #666;", "(filtered from {pagination.total_count})" }
                }
                button {
                    disabled: pagination.previous_page.is_none(),
                    onclick: {
                        let service = service.clone();
                        move |_| {
                            let request = with_page(state.current_request(), 1);
                            reload(&service.0, state, request);
                        }
                    },
                    "First"
                }
                button {
                    disabled: pagination.previous_page.is_none(),
                    onclick: {
                        let service = service.clone();
                        let previous = pagination.previous_page.unwrap_or(1);
                        move |_| {
                            let request = with_page(state.current_request(), previous);
                            reload(&service.0, state, request);
                        }
                    },
                    "Previous"
                }
                span { "Page {pagination.page_number} of {pagination.page_count}" }
                button {
                    disabled: pagination.page_number == pagination.page_count,
                    onclick: {
                        let service = service.clone();
                        let next = pagination.next_page;
                        move |_| {
                            let request = with_page(state.current_request(), next);
                            reload(&service.0, state, request);
                        }
                    },
                    "Next"
                }
                button {
                    disabled: pagination.page_number == pagination.page_count,
                    onclick: {
                        let service = service.clone();
                        let last = pagination.page_count;
                        move |_| {
                            let request = with_page(state.current_request(), last);
                            reload(&service.0, state, request);
                        }
                    },
                    "Last"
                }
            }
        }
    }
}
