use serde::Serialize;

use crate::model::{HouseRecord, SortKey};

pub const PAGE_SIZE: usize = 10;

/// Tag handed out by [`DataStore::begin_fetch`]. Only the latest one may load,
/// so a slow response from an earlier fetch never replaces a newer list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchId(u64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub page: usize,
    pub sort_key: SortKey,
    /// Every search applied since the last clear, oldest first.
    pub search_terms: Vec<String>,
}

/// Working list of houses plus the view over it.
///
/// Every mutation of the working list (load, filter, sort) puts the view
/// back on the first page. Rows on screen are always a function of the
/// loaded list, the sort key, the chain of search terms and the page index.
#[derive(Clone, Debug)]
pub struct DataStore {
    loaded: Vec<HouseRecord>,
    working: Vec<HouseRecord>,
    sort_key: SortKey,
    search_terms: Vec<String>,
    page: usize,
    page_size: usize,
    latest_fetch: u64,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            loaded: Vec::new(),
            working: Vec::new(),
            sort_key: SortKey::None,
            search_terms: Vec::new(),
            page: 0,
            page_size: page_size.max(1),
            latest_fetch: 0,
        }
    }

    /// Replaces the list. The current sort key and every search term are
    /// applied to the new records.
    pub fn load(&mut self, records: Vec<HouseRecord>) {
        self.loaded = records;
        self.rebuild();
    }

    pub fn begin_fetch(&mut self) -> FetchId {
        self.latest_fetch += 1;
        FetchId(self.latest_fetch)
    }

    /// Loads `records` only when `id` is the most recent fetch.
    pub fn load_fetched(&mut self, id: FetchId, records: Vec<HouseRecord>) -> bool {
        if id.0 != self.latest_fetch {
            return false;
        }
        self.load(records);
        true
    }

    /// Narrows the working list to names containing `term`, ignoring case
    /// and formatting codes. Successive filters narrow further.
    pub fn filter(&mut self, term: &str) {
        let needle = term.trim().to_lowercase();
        if !needle.is_empty() {
            narrow(&mut self.working, &needle);
            self.search_terms.push(needle);
        }
        self.page = 0;
    }

    /// Back to the last loaded list, keeping the sort key.
    pub fn clear_filter(&mut self) {
        self.search_terms.clear();
        self.rebuild();
    }

    pub fn sort_by(&mut self, key: SortKey) {
        self.sort_key = key;
        sort_records(&mut self.working, key);
        self.page = 0;
    }

    pub fn page(&mut self, index: usize) {
        self.page = index.min(self.total_pages() - 1);
    }

    pub fn next_page(&mut self) -> bool {
        let before = self.page;
        self.page(self.page.saturating_add(1));
        self.page != before
    }

    pub fn prev_page(&mut self) -> bool {
        let before = self.page;
        self.page(self.page.saturating_sub(1));
        self.page != before
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn current_page_slice(&self) -> &[HouseRecord] {
        let start = (self.page * self.page_size).min(self.working.len());
        let end = (start + self.page_size).min(self.working.len());
        &self.working[start..end]
    }

    pub fn total_pages(&self) -> usize {
        self.working.len().div_ceil(self.page_size).max(1)
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn records(&self) -> &[HouseRecord] {
        &self.working
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            page: self.page,
            sort_key: self.sort_key,
            search_terms: self.search_terms.clone(),
        }
    }

    fn rebuild(&mut self) {
        self.working = self.loaded.clone();
        sort_records(&mut self.working, self.sort_key);
        for term in &self.search_terms {
            narrow(&mut self.working, term);
        }
        self.page = 0;
    }
}

fn narrow(records: &mut Vec<HouseRecord>, needle: &str) {
    records.retain(|house| house.display_name().to_lowercase().contains(needle));
}

/// Stable, descending. `SortKey::None` keeps the current order.
fn sort_records(records: &mut [HouseRecord], key: SortKey) {
    match key {
        SortKey::None => {}
        SortKey::Cookies => records.sort_by(|a, b| b.cookie_count().cmp(&a.cookie_count())),
        SortKey::Players => records.sort_by(|a, b| b.players.cmp(&a.players)),
    }
}
