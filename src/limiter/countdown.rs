use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

use super::counter::PersistentCounter;
use super::gate::{GateTick, RateLimitGate};

pub type SharedGate = Arc<Mutex<RateLimitGate>>;

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
pub const DECAY_PERIOD: Duration = Duration::from_secs(60);

pub fn shared(gate: RateLimitGate) -> SharedGate {
    Arc::new(Mutex::new(gate))
}

pub fn lock_gate(gate: &SharedGate) -> MutexGuard<'_, RateLimitGate> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { seconds_remaining: u32 },
    Expired,
}

/// Drives a blocked gate once per period and reports each step.
///
/// Starting a new countdown aborts the previous task, so two timers never
/// tick the same gate.
pub struct Countdown {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::with_period(COUNTDOWN_PERIOD)
    }
}

impl Countdown {
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    pub fn start(&mut self, gate: SharedGate, tx: mpsc::Sender<CountdownEvent>) {
        self.cancel();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let tick = lock_gate(&gate).tick();
                let event = match tick {
                    GateTick::Idle => break,
                    GateTick::Waiting(seconds_remaining) => {
                        CountdownEvent::Tick { seconds_remaining }
                    }
                    GateTick::Expired => CountdownEvent::Expired,
                };
                if tx.send(event).await.is_err() || event == CountdownEvent::Expired {
                    break;
                }
            }
            debug!("countdown task finished");
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Gives back one call per period for as long as the session lives.
pub struct CounterDecay {
    handle: JoinHandle<()>,
}

impl CounterDecay {
    pub fn start(counter: PersistentCounter) -> Self {
        Self::with_period(counter, DECAY_PERIOD)
    }

    pub fn with_period(counter: PersistentCounter, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                counter.tick();
            }
        });
        Self { handle }
    }
}

impl Drop for CounterDecay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
