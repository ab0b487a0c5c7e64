use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::api::{ApiError, HousingSource};
use crate::controller::{Controller, Outcome};
use crate::limiter::counter::tests::BrokenStore;
use crate::limiter::counter::{COUNTDOWN_KEY, COUNTER_KEY};
use crate::limiter::{
    lock_gate, shared, Countdown, CountdownEvent, CounterDecay, GateState, PersistentCounter,
    RateLimitGate, SharedGate, DEFAULT_THRESHOLD,
};
use crate::model::{HouseRecord, SortKey};
use crate::names::tests::CountingLookup;
use crate::names::NameResolver;
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::store::DataStore;

/// Listing whose contents can be swapped between fetches.
#[derive(Clone, Default)]
struct Listing {
    houses: Arc<Mutex<Vec<HouseRecord>>>,
    calls: Arc<AtomicUsize>,
}

impl Listing {
    fn with(houses: Vec<HouseRecord>) -> Self {
        let listing = Self::default();
        listing.replace(houses);
        listing
    }

    fn replace(&self, houses: Vec<HouseRecord>) {
        *self.houses.lock().unwrap() = houses;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HousingSource for Listing {
    async fn active_houses(&self) -> Result<Vec<HouseRecord>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.houses.lock().unwrap().clone())
    }
}

fn houses(n: usize) -> Vec<HouseRecord> {
    (0..n)
        .map(|i| {
            HouseRecord::new(&format!("§6House {i}"), (i * 7 % 11) as u64, i as u64)
                .with_owner(&format!("uuid{i}"))
        })
        .collect()
}

fn temp_state(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "housing-lookup-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("state.json")
}

fn session(
    listing: Listing,
    counter: PersistentCounter,
) -> (Controller<Listing, CountingLookup>, SharedGate) {
    let gate = shared(RateLimitGate::new(counter, DEFAULT_THRESHOLD));
    let controller = Controller::new(
        listing,
        NameResolver::new(CountingLookup::default()),
        DataStore::new(),
        gate.clone(),
    );
    (controller, gate)
}

#[tokio::test]
async fn sixth_call_is_allowed_seventh_waits_a_minute() {
    let listing = Listing::with(houses(4));
    let counter = PersistentCounter::new(MemoryStore::new());
    let (mut ctl, gate) = session(listing.clone(), counter.clone());

    for _ in 0..6 {
        assert!(matches!(ctl.load().await, Outcome::Rendered(_)));
    }
    assert_eq!(counter.get(), 6);

    match ctl.load().await {
        Outcome::Blocked {
            seconds_remaining,
            message,
        } => {
            assert_eq!(seconds_remaining, 60);
            assert_eq!(
                message,
                "You have exceeded the API call limit. Please wait 60 seconds before trying again."
            );
        }
        other => panic!("expected block, got {other:?}"),
    }
    assert_eq!(listing.calls(), 6);
    assert_eq!(counter.countdown(), Some(60));
    assert_eq!(
        lock_gate(&gate).state(),
        GateState::Blocked {
            seconds_remaining: 60
        }
    );
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_allows_a_full_reload() {
    let listing = Listing::with(houses(12));
    let counter = PersistentCounter::new(
        MemoryStore::new().with_entry(COUNTER_KEY, &DEFAULT_THRESHOLD.to_string()),
    );
    let (mut ctl, gate) = session(listing.clone(), counter.clone());

    assert!(matches!(ctl.load().await, Outcome::Blocked { .. }));

    let (tx, mut rx) = mpsc::channel(8);
    let mut countdown = Countdown::default();
    countdown.start(gate.clone(), tx);

    let mut ticks = Vec::new();
    loop {
        match rx.recv().await {
            Some(CountdownEvent::Tick { seconds_remaining }) => ticks.push(seconds_remaining),
            Some(CountdownEvent::Expired) => break,
            None => panic!("countdown stopped without expiring"),
        }
    }
    assert_eq!(ticks.len(), 59);
    assert_eq!(ticks.first(), Some(&59));
    assert_eq!(ticks.last(), Some(&1));
    assert_eq!(counter.get(), 0);
    assert_eq!(counter.countdown(), None);

    match ctl.load().await {
        Outcome::Rendered(page) => {
            assert_eq!(page.total_records, 12);
            assert_eq!(page.pagination.label(), "Page 1 of 2");
        }
        other => panic!("expected reload, got {other:?}"),
    }
    assert_eq!(listing.calls(), 1);
    assert_eq!(counter.get(), 1);
}

#[tokio::test]
async fn unavailable_storage_never_blocks() {
    let listing = Listing::with(houses(3));
    let counter = PersistentCounter::new(BrokenStore);
    let (mut ctl, gate) = session(listing.clone(), counter.clone());

    for _ in 0..10 {
        assert!(matches!(ctl.load().await, Outcome::Rendered(_)));
    }
    assert_eq!(listing.calls(), 10);
    assert!(counter.is_degraded());
    assert!(!lock_gate(&gate).is_blocked());
}

#[tokio::test]
async fn persisted_countdown_resumes_in_next_session() {
    let path = temp_state("resume");
    {
        let mut seeded = JsonFileStore::new(&path);
        seeded.set(COUNTER_KEY, "7").unwrap();
        let (mut ctl, gate) = session(Listing::with(houses(2)), PersistentCounter::new(seeded));
        match ctl.load().await {
            Outcome::Blocked {
                seconds_remaining, ..
            } => assert_eq!(seconds_remaining, 120),
            other => panic!("expected block, got {other:?}"),
        }
        let mut gate = lock_gate(&gate);
        for _ in 0..30 {
            gate.tick();
        }
        assert_eq!(gate.seconds_remaining(), 90);
    }

    let store = JsonFileStore::new(&path);
    assert_eq!(store.get(COUNTDOWN_KEY).unwrap().as_deref(), Some("90"));

    let listing = Listing::with(houses(2));
    let (mut ctl, _gate) = session(listing.clone(), PersistentCounter::new(store));
    match ctl.load().await {
        Outcome::Blocked {
            seconds_remaining, ..
        } => assert_eq!(seconds_remaining, 90),
        other => panic!("expected resumed block, got {other:?}"),
    }
    assert_eq!(listing.calls(), 0);

    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test(start_paused = true)]
async fn decay_reopens_room_for_one_more_call() {
    let listing = Listing::with(houses(2));
    let counter = PersistentCounter::new(MemoryStore::new());
    let (mut ctl, _gate) = session(listing.clone(), counter.clone());
    let _decay = CounterDecay::start(counter.clone());

    for _ in 0..6 {
        ctl.load().await;
    }
    assert_eq!(counter.get(), 6);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(counter.get(), 5);

    assert!(matches!(ctl.load().await, Outcome::Rendered(_)));
    assert_eq!(listing.calls(), 7);
}

#[test]
fn only_latest_fetch_lands() {
    let mut store = DataStore::new();
    let first = store.begin_fetch();
    let second = store.begin_fetch();

    assert!(store.load_fetched(second, houses(3)));
    assert!(!store.load_fetched(first, houses(20)));
    assert_eq!(store.len(), 3);
    assert_eq!(store.total_pages(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_fetch_cannot_replace_newer_list() {
    let store = Arc::new(Mutex::new(DataStore::new()));
    let fetch = |delay: Duration, n: usize| {
        let store = store.clone();
        async move {
            let id = store.lock().unwrap().begin_fetch();
            tokio::time::sleep(delay).await;
            store.lock().unwrap().load_fetched(id, houses(n))
        }
    };

    let (slow, fast) = tokio::join!(fetch(Duration::from_secs(5), 20), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        fetch(Duration::from_secs(1), 3).await
    });

    assert!(fast);
    assert!(!slow);
    let store = store.lock().unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.records()[2].display_name(), "House 2");
}

#[tokio::test]
async fn reloading_same_listing_keeps_narrowed_rows() {
    let listing = Listing::with(houses(30));
    let (mut ctl, _gate) = session(listing.clone(), PersistentCounter::new(MemoryStore::new()));

    ctl.load().await;
    ctl.search("house 1").await;
    let narrowed = ctl.search("9").await;
    let before: Vec<String> = narrowed.rows.iter().map(|r| r.house.clone()).collect();
    assert_eq!(before, vec!["House 19"]);

    let page = match ctl.load().await {
        Outcome::Rendered(page) => page,
        other => panic!("expected reload, got {other:?}"),
    };
    let after: Vec<String> = page.rows.iter().map(|r| r.house.clone()).collect();
    assert_eq!(after, before);
    assert_eq!(page.total_records, 1);
    assert_eq!(ctl.store().view_state().search_terms, vec!["house 1", "9"]);

    let cleared = ctl.clear_search().await;
    assert_eq!(cleared.total_records, 30);
}

#[tokio::test]
async fn reload_keeps_sort_and_search() {
    let listing = Listing::with(houses(30));
    let (mut ctl, _gate) = session(listing.clone(), PersistentCounter::new(MemoryStore::new()));

    ctl.load().await;
    ctl.sort(SortKey::Players).await;
    let filtered = ctl.search("house 1").await;
    assert_eq!(filtered.total_records, 11);
    assert_eq!(filtered.rows[0].house, "House 19");

    ctl.next_page().await;
    listing.replace(houses(12));
    let page = match ctl.load().await {
        Outcome::Rendered(page) => page,
        other => panic!("expected reload, got {other:?}"),
    };
    assert_eq!(page.pagination.page, 0);
    assert_eq!(page.total_records, 3);
    let names: Vec<&str> = page.rows.iter().map(|r| r.house.as_str()).collect();
    assert_eq!(names, vec!["House 11", "House 10", "House 1"]);

    let state = ctl.store().view_state();
    assert_eq!(state.sort_key, SortKey::Players);
    assert_eq!(state.search_terms, vec!["house 1"]);
}

#[tokio::test]
async fn owners_are_looked_up_once_per_session() {
    let lookup = CountingLookup::default();
    let gate = shared(RateLimitGate::new(
        PersistentCounter::new(MemoryStore::new()),
        DEFAULT_THRESHOLD,
    ));
    let mut ctl = Controller::new(
        Listing::with(houses(15)),
        NameResolver::new(lookup.clone()),
        DataStore::new(),
        gate,
    );

    ctl.load().await;
    ctl.next_page().await;
    ctl.prev_page().await;
    ctl.load().await;
    ctl.sort(SortKey::Cookies).await;
    ctl.clear_search().await;

    assert_eq!(lookup.calls.load(Ordering::SeqCst), 15);
    assert_eq!(ctl.names().len(), 15);
}
