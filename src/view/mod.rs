//! Pure rendering: page slice + resolved names in, [`RenderedPage`] out.
//! Nothing here touches the terminal; see `output` for that.

use serde::Serialize;

use crate::model::HouseRecord;
use crate::names::UNKNOWN_NAME;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Row {
    pub house: String,
    pub owner: String,
    pub cookies: u64,
    pub players: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl Pagination {
    pub fn new(page: usize, total_pages: usize) -> Self {
        let total_pages = total_pages.max(1);
        let page = page.min(total_pages - 1);
        Self {
            page,
            total_pages,
            prev_enabled: page > 0,
            next_enabled: page + 1 < total_pages,
        }
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page + 1, self.total_pages)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub rows: Vec<Row>,
    pub pagination: Pagination,
    pub total_records: usize,
}

/// `owners[i]` is the resolved name for `slice[i]`; missing entries show as
/// unknown.
pub fn render(
    slice: &[HouseRecord],
    owners: &[String],
    page: usize,
    total_pages: usize,
    total_records: usize,
) -> RenderedPage {
    let rows = slice
        .iter()
        .enumerate()
        .map(|(i, house)| Row {
            house: house.display_name(),
            owner: owners
                .get(i)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            cookies: house.cookie_count(),
            players: house.players,
        })
        .collect();
    RenderedPage {
        rows,
        pagination: Pagination::new(page, total_pages),
        total_records,
    }
}
