//! View model assembly and the list-view controller the rendering layer drives.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use url::form_urlencoded;

use crate::facets::{field_facets, FacetCount};
use crate::filter::{filter_records, FilterState};
use crate::paginate::{paginate, total_pages};
use crate::schema::{Listable, Schema};

/// Everything a list page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel<'a, R> {
    /// Facets by field name, counted over the unfiltered base collection.
    pub facets: BTreeMap<String, Vec<FacetCount>>,
    pub filtered_count: usize,
    pub page_items: Vec<&'a R>,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Derives facets, filters, and paginates `records` in one pure pass.
pub fn assemble<'a, R>(
    records: &'a [R],
    schema: &Schema<R>,
    state: &FilterState,
    page_size: usize,
    page: usize,
) -> ViewModel<'a, R> {
    let facets = schema
        .fields
        .iter()
        .map(|field| (field.name.to_string(), field_facets(records, field)))
        .collect();

    let filtered = filter_records(records, schema, state);
    let page = paginate(&filtered, page_size, page);

    ViewModel {
        facets,
        filtered_count: page.total_count,
        page_items: page.items.to_vec(),
        total_pages: page.total_pages,
        current_page: page.current_page,
    }
}

/// Side effect the rendering layer must perform after an event.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEffect {
    None,
    ScrollToTop,
}

/// Identifies one fetch so a slower, older response cannot overwrite a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Ephemeral state of one list page: base records, selections, current page.
pub struct ListView<R> {
    schema: Schema<R>,
    records: Vec<R>,
    filters: FilterState,
    page: usize,
    page_size: usize,
    issued: u64,
    applied: u64,
}

impl<R: Listable> ListView<R> {
    pub fn new(page_size: usize) -> Self {
        Self::with_schema(R::schema(), page_size)
    }
}

impl<R> ListView<R> {
    pub fn with_schema(schema: Schema<R>, page_size: usize) -> Self {
        Self {
            schema,
            records: Vec::new(),
            filters: FilterState::default(),
            page: 1,
            page_size: page_size.max(1),
            issued: 0,
            applied: 0,
        }
    }

    /// Seeds selections and page from URL query parameters.
    pub fn with_query_string(mut self, query_string: &str) -> Self {
        self.filters = FilterState::from_query_string(query_string, &self.schema);
        self.page = form_urlencoded::parse(query_string.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        self
    }

    pub fn schema(&self) -> &Schema<R> {
        &self.schema
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True while a fetch has been started that has not been applied yet.
    pub fn is_loading(&self) -> bool {
        self.issued > self.applied
    }

    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Applies fetched records unless a newer fetch was started since
    /// `ticket` was issued. Returns whether the records were applied.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, records: Vec<R>) -> bool {
        if ticket.0 != self.issued {
            debug!(ticket = ticket.0, latest = self.issued, "dropping stale fetch result");
            return false;
        }
        self.records = records;
        self.applied = ticket.0;
        self.page = 1;
        true
    }

    pub fn view_model(&self) -> ViewModel<'_, R> {
        assemble(&self.records, &self.schema, &self.filters, self.page_size, self.page)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(
            filter_records(&self.records, &self.schema, &self.filters).len(),
            self.page_size,
        )
    }

    pub fn on_query_change(&mut self, text: &str) {
        self.filters.query = text.to_string();
        self.page = 1;
    }

    pub fn on_toggle_multi_select(&mut self, field: &str, value: &str) {
        self.filters.toggle(field, value);
        self.page = 1;
    }

    pub fn on_set_single_select(&mut self, field: &str, value: Option<&str>) {
        self.filters.set_single(field, value);
        self.page = 1;
    }

    /// Moves to `page`, clamped to the available pages. Filters are untouched.
    pub fn on_page_change(&mut self, page: usize) -> UiEffect {
        let page = page.clamp(1, self.total_pages());
        if page == self.page {
            return UiEffect::None;
        }
        self.page = page;
        UiEffect::ScrollToTop
    }

    pub fn on_reset_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, Record};

    fn jobs(n: usize) -> Vec<Job> {
        (1..=n)
            .map(|i| Job {
                id: i.to_string(),
                title: format!("Job {}", i),
                company: "Acme".to_string(),
                location: if i % 2 == 0 { "Remote" } else { "Austin, TX" }.to_string(),
                job_type: if i % 3 == 0 { "Contract" } else { "Full-time" }.to_string(),
                categories: vec!["Engineering".to_string()],
                salary: None,
                created_at: None,
                featured: false,
                employer_id: None,
                description: None,
            })
            .collect()
    }

    fn page_ids(view: &ListView<Job>) -> Vec<String> {
        view.view_model().page_items.iter().map(|j| j.id().to_string()).collect()
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let records = jobs(9);
        let schema = Job::schema();
        let state = FilterState::new().with_multi("type", ["Full-time"]);
        let a = assemble(&records, &schema, &state, 4, 2);
        let b = assemble(&records, &schema, &state, 4, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_facets_ignore_active_filters() {
        let records = jobs(9);
        let schema = Job::schema();
        let state = FilterState::new().with_multi("type", ["Contract"]);
        let vm = assemble(&records, &schema, &state, 10, 1);
        assert_eq!(vm.filtered_count, 3);
        let types = &vm.facets["type"];
        assert_eq!(types[0], FacetCount { value: "Full-time".to_string(), count: 6 });
        assert_eq!(types[1], FacetCount { value: "Contract".to_string(), count: 3 });
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut view = ListView::<Job>::new(2);
        view.set_records(jobs(9));
        assert_eq!(view.on_page_change(3), UiEffect::ScrollToTop);
        assert_eq!(view.page(), 3);

        view.on_toggle_multi_select("type", "Full-time");
        assert_eq!(view.page(), 1);
        let _ = view.on_page_change(2);
        view.on_query_change("job");
        assert_eq!(view.page(), 1);
        let _ = view.on_page_change(2);
        view.on_set_single_select("location", Some("Remote"));
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_blank_toggle_keeps_every_record() {
        let mut view = ListView::<Job>::new(20);
        view.set_records(jobs(9));
        view.on_toggle_multi_select("type", "");
        view.on_toggle_multi_select("category", "   ");
        assert!(view.filters().is_empty());
        assert_eq!(view.view_model().filtered_count, 9);
    }

    #[test]
    fn test_page_change_keeps_filters_and_clamps() {
        let mut view = ListView::<Job>::new(2);
        view.set_records(jobs(9));
        view.on_set_single_select("location", Some("Remote"));
        let before = view.filters().clone();

        assert_eq!(view.on_page_change(99), UiEffect::ScrollToTop);
        assert_eq!(view.page(), 2);
        assert_eq!(view.filters(), &before);
        assert_eq!(view.on_page_change(2), UiEffect::None);
        assert_eq!(view.on_page_change(0), UiEffect::ScrollToTop);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_stale_fetch_is_dropped() {
        let mut view = ListView::<Job>::new(5);
        let first = view.begin_fetch();
        let second = view.begin_fetch();
        assert!(view.is_loading());

        assert!(view.finish_fetch(second, jobs(2)));
        assert!(!view.finish_fetch(first, jobs(7)));
        assert_eq!(view.records().len(), 2);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_query_string_seeds_filters_and_page() {
        let mut view = ListView::<Job>::new(2).with_query_string("?type=Full-time&page=2");
        assert_eq!(view.page(), 2);
        assert!(view.filters().is_selected("type", "Full-time"));
        view.set_records(jobs(9));
        assert_eq!(page_ids(&view), vec!["4", "5"]);
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let mut view = ListView::<Job>::new(4);
        view.set_records(jobs(9));
        let initial = view.view_model();
        let initial_ids: Vec<String> = initial.page_items.iter().map(|j| j.id.clone()).collect();
        let initial_pages = initial.total_pages;

        view.on_query_change("Job 1");
        view.on_toggle_multi_select("type", "Contract");
        view.on_reset_filters();

        assert!(view.filters().is_empty());
        assert_eq!(view.page(), 1);
        assert_eq!(page_ids(&view), initial_ids);
        assert_eq!(view.view_model().total_pages, initial_pages);
    }
}
