use tracing::{info, warn};

use super::counter::PersistentCounter;

pub const DEFAULT_THRESHOLD: u32 = 6;
pub const SECONDS_PER_EXCESS_CALL: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Open,
    Blocked { seconds_remaining: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateTick {
    /// The gate is open, nothing to count down.
    Idle,
    Waiting(u32),
    /// The countdown hit zero and the gate reopened. The caller reloads.
    Expired,
}

/// Decides whether a remote fetch may go out.
///
/// `Open` lets calls through until the persisted counter reaches the
/// threshold. `Blocked` rejects every call and counts down one second per
/// [`RateLimitGate::tick`]; at zero it resets the counter and reopens.
pub struct RateLimitGate {
    counter: PersistentCounter,
    threshold: u32,
    state: GateState,
}

impl RateLimitGate {
    pub fn new(counter: PersistentCounter, threshold: u32) -> Self {
        Self {
            counter,
            threshold: threshold.max(1),
            state: GateState::Open,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn counter(&self) -> &PersistentCounter {
        &self.counter
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.state, GateState::Blocked { .. })
    }

    pub fn seconds_remaining(&self) -> u32 {
        match self.state {
            GateState::Open => 0,
            GateState::Blocked { seconds_remaining } => seconds_remaining,
        }
    }

    pub fn authorize(&mut self) -> bool {
        if self.is_blocked() {
            return false;
        }
        let count = self.counter.get();
        if count >= self.threshold {
            self.enter_blocked(count);
            return false;
        }
        true
    }

    /// Wait for `count` calls: one minute per call at or above the threshold.
    pub fn wait_for(&self, count: u32) -> u32 {
        count
            .saturating_sub(self.threshold)
            .saturating_add(1)
            .saturating_mul(SECONDS_PER_EXCESS_CALL)
    }

    fn enter_blocked(&mut self, count: u32) {
        let computed = self.wait_for(count);
        let seconds_remaining = match self.counter.countdown() {
            Some(saved) => saved,
            None => computed,
        };
        self.counter.set_countdown(seconds_remaining);
        warn!(
            count,
            threshold = self.threshold,
            seconds_remaining,
            "api call limit reached"
        );
        self.state = GateState::Blocked { seconds_remaining };
    }

    pub fn tick(&mut self) -> GateTick {
        match self.state {
            GateState::Open => GateTick::Idle,
            GateState::Blocked { seconds_remaining } => {
                let next = seconds_remaining.saturating_sub(1);
                if next == 0 {
                    self.expire();
                    return GateTick::Expired;
                }
                self.counter.set_countdown(next);
                self.state = GateState::Blocked {
                    seconds_remaining: next,
                };
                GateTick::Waiting(next)
            }
        }
    }

    pub fn expire(&mut self) {
        if self.is_blocked() {
            info!("api call limit lifted");
        }
        self.counter.reset();
        self.state = GateState::Open;
    }

    pub fn record_success(&self) -> u32 {
        self.counter.increment()
    }

    pub fn message(&self) -> String {
        format!(
            "You have exceeded the API call limit. Please wait {} seconds before trying again.",
            self.seconds_remaining()
        )
    }
}
