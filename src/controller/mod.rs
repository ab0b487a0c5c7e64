use tracing::{debug, error, info};

use crate::api::{HousingSource, ProfileLookup};
use crate::limiter::{lock_gate, SharedGate};
use crate::model::SortKey;
use crate::names::NameResolver;
use crate::store::DataStore;
use crate::view::{self, RenderedPage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Rendered(RenderedPage),
    Blocked {
        seconds_remaining: u32,
        message: String,
    },
    /// The fetch failed; `page` is whatever was on screen before.
    FetchFailed { reason: String, page: RenderedPage },
}

/// Wires user actions to a store mutation followed by a render.
pub struct Controller<H, L> {
    source: H,
    names: NameResolver<L>,
    store: DataStore,
    gate: SharedGate,
}

impl<H, L> Controller<H, L>
where
    H: HousingSource,
    L: ProfileLookup,
{
    pub fn new(source: H, names: NameResolver<L>, store: DataStore, gate: SharedGate) -> Self {
        Self {
            source,
            names,
            store,
            gate,
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn names(&self) -> &NameResolver<L> {
        &self.names
    }

    pub fn gate(&self) -> &SharedGate {
        &self.gate
    }

    /// Initial fetch, forced reload after a countdown, and manual refresh.
    ///
    /// `&mut self` keeps one fetch in flight per controller, so the store's
    /// fetch-id check only bites for callers that share a [`DataStore`] and
    /// overlap fetches.
    pub async fn load(&mut self) -> Outcome {
        {
            let mut gate = lock_gate(&self.gate);
            if !gate.authorize() {
                return Outcome::Blocked {
                    seconds_remaining: gate.seconds_remaining(),
                    message: gate.message(),
                };
            }
        }

        let fetch = self.store.begin_fetch();
        match self.source.active_houses().await {
            Ok(houses) => {
                let count = houses.len();
                if !self.store.load_fetched(fetch, houses) {
                    debug!("dropping response from a superseded fetch");
                }
                let calls = lock_gate(&self.gate).record_success();
                info!(houses = count, calls, "fetched active houses");
                Outcome::Rendered(self.render().await)
            }
            Err(e) => {
                error!(error = %e, "failed to fetch active houses");
                Outcome::FetchFailed {
                    reason: e.to_string(),
                    page: self.render().await,
                }
            }
        }
    }

    pub async fn next_page(&mut self) -> RenderedPage {
        self.store.next_page();
        self.render().await
    }

    pub async fn prev_page(&mut self) -> RenderedPage {
        self.store.prev_page();
        self.render().await
    }

    /// `page` is 1-based, as shown on screen.
    pub async fn goto_page(&mut self, page: usize) -> RenderedPage {
        self.store.page(page.saturating_sub(1));
        self.render().await
    }

    pub async fn sort(&mut self, key: SortKey) -> RenderedPage {
        self.store.sort_by(key);
        self.render().await
    }

    pub async fn search(&mut self, raw: &str) -> RenderedPage {
        let term = raw.trim().to_lowercase();
        self.store.filter(&term);
        self.render().await
    }

    pub async fn clear_search(&mut self) -> RenderedPage {
        self.store.clear_filter();
        self.render().await
    }

    /// Resolves owners for the visible slice only, then renders in one pass.
    pub async fn render(&self) -> RenderedPage {
        let slice = self.store.current_page_slice();
        let owners: Vec<Option<String>> = slice.iter().map(|house| house.owner.clone()).collect();
        let names = self.names.resolve_page(&owners).await;
        view::render(
            slice,
            &names,
            self.store.current_page(),
            self.store.total_pages(),
            self.store.len(),
        )
    }
}
