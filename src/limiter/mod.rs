//! Client-side guard for the Hypixel API key.
//!
//! Every successful fetch bumps a persisted counter and one call is given
//! back per minute. Once the counter reaches the threshold the gate blocks
//! and counts down before the session is allowed to reload.

pub mod countdown;
pub mod counter;
pub mod gate;

pub use countdown::{lock_gate, shared, Countdown, CountdownEvent, CounterDecay, SharedGate};
pub use counter::PersistentCounter;
pub use gate::{GateState, GateTick, RateLimitGate, DEFAULT_THRESHOLD};
