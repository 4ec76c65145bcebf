use std::marker::PhantomData;
use std::num::NonZeroU64;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::domain::entities::filter::FilterTerm;
use crate::domain::entities::order::{OrderDirection, OrderTerm};

pub const DEFAULT_PAGE_SIZE: NonZeroU64 = match NonZeroU64::new(10) {
    Some(size) => size,
    None => unreachable!(),
};
pub const DEFAULT_PAGE_SIZE_OPTIONS: [u64; 7] = [10, 25, 50, 100, 250, 500, 1000];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: NonZeroU64,
    pub page_size_options: Vec<u64>,
    pub default_order: Option<OrderTerm>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            default_order: None,
        }
    }
}

impl PaginationConfig {
    pub fn with_default_order(mut self, order: OrderTerm) -> Self {
        self.default_order = Some(order);
        self
    }
}

/// Inbound pagination payload. Every field is optional and decoded on its
/// own: a value of the wrong shape reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    #[serde(
        alias = "pagecurrent",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_number: Option<i64>,
    #[serde(
        alias = "limit",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_size: Option<i64>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub page_size_options: Option<Vec<i64>>,
    #[serde(alias = "fieldfilterterms", deserialize_with = "lenient_list")]
    pub filter_terms: Vec<FilterTerm>,
    #[serde(alias = "orderterms", deserialize_with = "lenient_list")]
    pub order_terms: Vec<OrderTerm>,
}

impl PageRequest {
    /// Falls back to the all-defaults request when the body is not JSON.
    pub fn from_json(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "malformed page request, using defaults");
                Self::default()
            }
        }
    }

    pub fn page(mut self, page_number: i64) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn filter(mut self, term: FilterTerm) -> Self {
        self.filter_terms.push(term);
        self
    }

    pub fn order(mut self, term: OrderTerm) -> Self {
        self.order_terms.push(term);
        self
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordCounts {
    pub total: u64,
    pub filtered: u64,
}

impl RecordCounts {
    pub fn unfiltered(total: u64) -> Self {
        Self {
            total,
            filtered: total,
        }
    }

    pub fn filtered(total: u64, filtered: u64) -> Self {
        Self { total, filtered }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fresh;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precomputed;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized;

/// Pagination state for one request: `Fresh -> Precomputed -> Finalized`.
/// Record counters can only be read once the state is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState<S> {
    config: PaginationConfig,
    page_number: u64,
    page_size: NonZeroU64,
    page_size_options: Vec<u64>,
    offset: u64,
    order_terms: Vec<OrderTerm>,
    filter_terms: Vec<FilterTerm>,
    is_filtered: bool,
    counts: RecordCounts,
    page_count: u64,
    first_record_index: u64,
    last_record_index: u64,
    previous_page: Option<u64>,
    next_page: u64,
    _stage: PhantomData<S>,
}

impl PaginationState<Fresh> {
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            page_size: config.default_page_size,
            page_size_options: Vec::new(),
            config,
            page_number: 1,
            offset: 0,
            order_terms: Vec::new(),
            filter_terms: Vec::new(),
            is_filtered: false,
            counts: RecordCounts::default(),
            page_count: 1,
            first_record_index: 0,
            last_record_index: 0,
            previous_page: None,
            next_page: 1,
            _stage: PhantomData,
        }
    }

    pub fn precompute(self, request: &PageRequest) -> PaginationState<Precomputed> {
        let page_size = request
            .page_size
            .filter(|size| *size > 0)
            .and_then(|size| NonZeroU64::new(size as u64))
            .unwrap_or(self.config.default_page_size);
        // Largest page whose offset still fits in a u64.
        let max_page = u64::MAX / page_size.get() + 1;
        let page_number = request
            .page_number
            .filter(|page| *page > 0)
            .map_or(1, |page| (page as u64).min(max_page));

        let mut page_size_options: Vec<u64> = request
            .page_size_options
            .iter()
            .flatten()
            .filter(|size| **size > 0)
            .map(|size| *size as u64)
            .collect();
        if page_size_options.is_empty() {
            page_size_options = self.config.page_size_options.clone();
        }

        let mut order_terms: Vec<OrderTerm> = request
            .order_terms
            .iter()
            .filter(|term| !term.field.trim().is_empty())
            .cloned()
            .collect();
        if order_terms.is_empty() {
            if let Some(default_order) = &self.config.default_order {
                order_terms.push(default_order.clone());
            }
        }

        let filter_terms: Vec<FilterTerm> = request
            .filter_terms
            .iter()
            .filter(|term| !term.term.trim().is_empty())
            .cloned()
            .collect();

        let offset = (page_number - 1) * page_size.get();

        PaginationState {
            is_filtered: !filter_terms.is_empty(),
            config: self.config,
            page_number,
            page_size,
            page_size_options,
            offset,
            order_terms,
            filter_terms,
            counts: self.counts,
            page_count: self.page_count,
            first_record_index: self.first_record_index,
            last_record_index: self.last_record_index,
            previous_page: self.previous_page,
            next_page: self.next_page,
            _stage: PhantomData,
        }
    }
}

impl<S> PaginationState<S> {
    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.get()
    }

    pub fn limit(&self) -> u64 {
        self.page_size.get()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size_options(&self) -> &[u64] {
        &self.page_size_options
    }

    pub fn order_terms(&self) -> &[OrderTerm] {
        &self.order_terms
    }

    pub fn primary_order(&self) -> Option<&OrderTerm> {
        self.order_terms.first()
    }

    pub fn filter_terms(&self) -> &[FilterTerm] {
        &self.filter_terms
    }

    pub fn global_term(&self) -> Option<&str> {
        self.filter_terms
            .iter()
            .find(|term| term.is_global())
            .map(|term| term.term.as_str())
    }

    pub fn is_filtered(&self) -> bool {
        self.is_filtered
    }

    fn apply_counts(mut self, counts: RecordCounts) -> PaginationState<Finalized> {
        let size = self.page_size.get();
        let filtered = counts.filtered;

        self.counts = counts;
        self.page_count = filtered.div_ceil(size).max(1);

        if self.offset.saturating_add(size) > filtered {
            self.page_number = self.page_count;
            self.offset = (self.page_number - 1) * size;
        }

        self.first_record_index = if filtered == 0 { 0 } else { self.offset + 1 };
        self.last_record_index = self.offset.saturating_add(size).min(filtered);
        self.previous_page = (self.page_number > 1).then(|| self.page_number - 1);
        self.next_page = if self.page_number != self.page_count {
            self.page_number + 1
        } else {
            self.page_count
        };

        PaginationState {
            config: self.config,
            page_number: self.page_number,
            page_size: self.page_size,
            page_size_options: self.page_size_options,
            offset: self.offset,
            order_terms: self.order_terms,
            filter_terms: self.filter_terms,
            is_filtered: self.is_filtered,
            counts: self.counts,
            page_count: self.page_count,
            first_record_index: self.first_record_index,
            last_record_index: self.last_record_index,
            previous_page: self.previous_page,
            next_page: self.next_page,
            _stage: PhantomData,
        }
    }
}

impl PaginationState<Precomputed> {
    pub fn finalize(self, counts: RecordCounts) -> PaginationState<Finalized> {
        self.apply_counts(counts)
    }
}

impl PaginationState<Finalized> {
    /// Re-applies counts; finalizing twice with the same counts is a no-op.
    pub fn finalize(self, counts: RecordCounts) -> PaginationState<Finalized> {
        self.apply_counts(counts)
    }

    pub fn total_count(&self) -> u64 {
        self.counts.total
    }

    pub fn filtered_count(&self) -> u64 {
        self.counts.filtered
    }

    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    pub fn first_record_index(&self) -> u64 {
        self.first_record_index
    }

    pub fn last_record_index(&self) -> u64 {
        self.last_record_index
    }

    pub fn previous_page(&self) -> Option<u64> {
        self.previous_page
    }

    pub fn next_page(&self) -> u64 {
        self.next_page
    }

    /// The request a client posts back to land on this same page.
    pub fn to_request(&self) -> PageRequest {
        PageRequest {
            page_number: Some(to_i64(self.page_number)),
            page_size: Some(to_i64(self.page_size.get())),
            page_size_options: Some(self.page_size_options.iter().copied().map(to_i64).collect()),
            filter_terms: self.filter_terms.clone(),
            order_terms: self.order_terms.clone(),
        }
    }

    pub fn state_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_request())
    }

    pub fn summary(&self) -> PageSummary {
        let primary = self.primary_order();
        PageSummary {
            page_number: self.page_number,
            page_size: self.page_size.get(),
            page_size_options: self.page_size_options.clone(),
            offset: self.offset,
            total_count: self.counts.total,
            filtered_count: self.counts.filtered,
            first_record_index: self.first_record_index,
            last_record_index: self.last_record_index,
            page_count: self.page_count,
            previous_page: self.previous_page,
            next_page: self.next_page,
            is_filtered: self.is_filtered,
            order_element: primary.map(|term| term.field.clone()),
            order_direction: primary.map(|term| term.direction),
            global_filter_term: self.global_term().map(str::to_string),
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Finalized counters as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub page_number: u64,
    pub page_size: u64,
    pub page_size_options: Vec<u64>,
    pub offset: u64,
    pub total_count: u64,
    pub filtered_count: u64,
    pub first_record_index: u64,
    pub last_record_index: u64,
    pub page_count: u64,
    pub previous_page: Option<u64>,
    pub next_page: u64,
    pub is_filtered: bool,
    pub order_element: Option<String>,
    pub order_direction: Option<OrderDirection>,
    pub global_filter_term: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::field::ValueType;

    fn precompute(request: PageRequest) -> PaginationState<Precomputed> {
        PaginationState::new(PaginationConfig::default()).precompute(&request)
    }

    #[test]
    fn page_number_normalizes_to_one() {
        for page in [None, Some(0), Some(-3)] {
            let request = PageRequest {
                page_number: page,
                ..PageRequest::default()
            };
            let state = precompute(request);
            assert_eq!(state.page_number(), 1, "page {page:?}");
            assert_eq!(state.offset(), 0);
        }
    }

    #[test]
    fn huge_page_numbers_keep_offset_exact() {
        for (page, size) in [(i64::MAX, 10), (i64::MAX, 1), (i64::MAX, i64::MAX), (7, i64::MAX)] {
            let state = precompute(PageRequest::default().page(page).size(size));
            let expected = (u128::from(state.page_number()) - 1) * u128::from(state.page_size());
            assert_eq!(u128::from(state.offset()), expected, "page {page} size {size}");
        }

        let state = precompute(PageRequest::default().page(i64::MAX).size(10));
        assert_eq!(state.page_number(), u64::MAX / 10 + 1);

        let finalized = state.finalize(RecordCounts::unfiltered(42));
        assert_eq!(finalized.page_number(), 5);
        assert_eq!(finalized.offset(), 40);
    }

    #[test]
    fn page_size_normalizes_to_default() {
        for size in [None, Some(0), Some(-25)] {
            let request = PageRequest {
                page_size: size,
                ..PageRequest::default()
            };
            assert_eq!(precompute(request).page_size(), 10, "size {size:?}");
        }
    }

    #[test]
    fn page_size_options_default_when_absent() {
        let state = precompute(PageRequest::default());
        assert_eq!(state.page_size_options(), &DEFAULT_PAGE_SIZE_OPTIONS);

        let request = PageRequest {
            page_size_options: Some(vec![5, -1, 15]),
            ..PageRequest::default()
        };
        assert_eq!(precompute(request).page_size_options(), &[5, 15]);
    }

    #[test]
    fn offset_follows_page_and_size() {
        let state = precompute(PageRequest::default().page(3).size(25));
        assert_eq!(state.offset(), 50);

        let state = state.finalize(RecordCounts::unfiltered(1000));
        assert_eq!(state.page_number(), 3);
        assert_eq!(state.offset(), 50);
        assert_eq!(state.first_record_index(), 51);
        assert_eq!(state.last_record_index(), 75);
    }

    #[test]
    fn default_order_is_injected_only_when_no_order_given() {
        let config = PaginationConfig::default().with_default_order(OrderTerm::asc("name"));

        let state = PaginationState::new(config.clone()).precompute(&PageRequest::default());
        assert_eq!(state.order_terms(), &[OrderTerm::asc("name")]);

        let request = PageRequest::default().order(OrderTerm::desc("id"));
        let state = PaginationState::new(config).precompute(&request);
        assert_eq!(state.order_terms(), &[OrderTerm::desc("id")]);
        assert_eq!(state.primary_order(), Some(&OrderTerm::desc("id")));
    }

    #[test]
    fn no_default_order_leaves_order_empty() {
        let state = precompute(PageRequest::default());
        assert!(state.order_terms().is_empty());
        assert_eq!(state.primary_order(), None);
    }

    #[test]
    fn blank_filter_terms_do_not_mark_filtered() {
        let request = PageRequest::default().filter(FilterTerm::global("  "));
        assert!(!precompute(request).is_filtered());

        let request = PageRequest::default().filter(FilterTerm::field("id", ValueType::Int, "4"));
        assert!(precompute(request).is_filtered());
    }

    #[test]
    fn clamps_past_last_page() {
        let state = precompute(PageRequest::default().page(5).size(10))
            .finalize(RecordCounts::unfiltered(42));

        assert_eq!(state.page_number(), 5);
        assert_eq!(state.page_count(), 5);
        assert_eq!(state.offset(), 40);
        assert_eq!(state.first_record_index(), 41);
        assert_eq!(state.last_record_index(), 42);
        assert_eq!(state.previous_page(), Some(4));
        assert_eq!(state.next_page(), 5);
    }

    #[test]
    fn clamps_when_filter_shrinks_result() {
        let request = PageRequest::default()
            .page(9)
            .size(10)
            .filter(FilterTerm::global("ann"));
        let state = precompute(request).finalize(RecordCounts::filtered(500, 23));

        assert_eq!(state.page_number(), 3);
        assert_eq!(state.offset(), 20);
        assert_eq!(state.first_record_index(), 21);
        assert_eq!(state.last_record_index(), 23);
        assert_eq!(state.total_count(), 500);
        assert_eq!(state.filtered_count(), 23);
    }

    #[test]
    fn empty_result_is_single_empty_page() {
        let state =
            precompute(PageRequest::default().page(1).size(10)).finalize(RecordCounts::default());

        assert_eq!(state.page_count(), 1);
        assert_eq!(state.page_number(), 1);
        assert_eq!(state.first_record_index(), 0);
        assert_eq!(state.last_record_index(), 0);
        assert_eq!(state.previous_page(), None);
        assert_eq!(state.next_page(), 1);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let state = precompute(PageRequest::default().page(2).size(10))
            .finalize(RecordCounts::unfiltered(35));

        assert_eq!(state.previous_page(), Some(1));
        assert_eq!(state.next_page(), 3);
        assert_eq!(state.page_count(), 4);
    }

    #[test]
    fn finalize_is_idempotent() {
        for filtered in [0, 1, 9, 10, 11, 42, 100] {
            for page in 1..=12 {
                let once = precompute(PageRequest::default().page(page).size(10))
                    .finalize(RecordCounts::unfiltered(filtered));
                let twice = once.clone().finalize(RecordCounts::unfiltered(filtered));
                assert_eq!(once, twice, "page {page}, filtered {filtered}");
            }
        }
    }

    #[test]
    fn finalized_page_never_starts_past_the_records() {
        for size in [1, 3, 10] {
            for filtered in 0..40 {
                for page in 1..20 {
                    let state = precompute(PageRequest::default().page(page).size(size))
                        .finalize(RecordCounts::unfiltered(filtered));
                    let ctx = format!("page {page}, size {size}, filtered {filtered}");

                    assert_eq!(
                        state.offset(),
                        (state.page_number() - 1) * state.page_size(),
                        "{ctx}"
                    );
                    assert!(state.page_number() <= state.page_count(), "{ctx}");
                    assert!(
                        state.offset() < filtered || state.page_number() == 1,
                        "{ctx}"
                    );
                    assert_eq!(
                        state.page_count(),
                        filtered.div_ceil(state.page_size()).max(1),
                        "{ctx}"
                    );
                    assert!(state.last_record_index() <= filtered, "{ctx}");
                }
            }
        }
    }

    #[test]
    fn lenient_decode_defaults_bad_fields() {
        let request = PageRequest::from_json(
            r#"{"pageNumber":"two","pageSize":25,"orderTerms":[{"field":"name"},42],"filterTerms":{"bad":true}}"#,
        );
        assert_eq!(request.page_number, None);
        assert_eq!(request.page_size, Some(25));
        assert_eq!(request.order_terms, vec![OrderTerm::asc("name")]);
        assert!(request.filter_terms.is_empty());
    }

    #[test]
    fn non_json_body_yields_defaults() {
        assert_eq!(PageRequest::from_json("page=2&limit=5"), PageRequest::default());
        assert_eq!(PageRequest::from_json(""), PageRequest::default());
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let request = PageRequest::from_json(
            r#"{"pagecurrent":4,"limit":50,"orderterms":[{"element":"id","direction":"desc"}]}"#,
        );
        assert_eq!(request.page_number, Some(4));
        assert_eq!(request.page_size, Some(50));
        assert_eq!(request.order_terms, vec![OrderTerm::desc("id")]);
    }

    #[test]
    fn state_blob_round_trips_to_same_page() {
        let request = PageRequest::default()
            .page(7)
            .size(25)
            .filter(FilterTerm::global("ann"))
            .order(OrderTerm::desc("name"));
        let finalized = precompute(request).finalize(RecordCounts::filtered(1000, 400));

        let blob = finalized.state_json().expect("state should serialize");
        let replayed = precompute(PageRequest::from_json(&blob))
            .finalize(RecordCounts::filtered(1000, 400));

        assert_eq!(replayed, finalized);
    }

    #[test]
    fn summary_exposes_primary_order_and_global_term() {
        let request = PageRequest::default()
            .filter(FilterTerm::global("Ann"))
            .order(OrderTerm::desc("name"))
            .order(OrderTerm::asc("id"));
        let summary = precompute(request)
            .finalize(RecordCounts::filtered(10, 2))
            .summary();

        assert_eq!(summary.order_element.as_deref(), Some("name"));
        assert_eq!(summary.order_direction, Some(OrderDirection::Desc));
        assert_eq!(summary.global_filter_term.as_deref(), Some("Ann"));
        assert!(summary.is_filtered);

        let json = serde_json::to_value(&summary).expect("summary should serialize");
        assert_eq!(json["orderDirection"], "desc");
        assert_eq!(json["firstRecordIndex"], 1);
        assert_eq!(json["previousPage"], serde_json::Value::Null);
    }
}
