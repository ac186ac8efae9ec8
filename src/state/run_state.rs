//! Process-wide run lifecycle state
//!
//! The run loop reads the state while the command surface (start, pause,
//! stop) writes it from other tasks, so the value lives in an atomic and every
//! transition that depends on the current value is a compare-and-swap.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Lifecycle state of the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunState {
    Stopped,
    Active,
    Paused,
}

impl RunState {
    fn to_u8(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Active => 1,
            Self::Paused => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Active,
            2 => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Active => "active",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Shared holder for a [`RunState`] with a wake-up signal
///
/// Every change wakes tasks blocked in [`StateCell::wait_while_paused`].
#[derive(Debug)]
pub struct StateCell {
    value: AtomicU8,
    changed: Notify,
}

impl StateCell {
    pub fn new(initial: RunState) -> Self {
        Self {
            value: AtomicU8::new(initial.to_u8()),
            changed: Notify::new(),
        }
    }

    pub fn get(&self) -> RunState {
        RunState::from_u8(self.value.load(Ordering::SeqCst))
    }

    /// Unconditionally stores `state`, returning the previous value
    pub fn set(&self, state: RunState) -> RunState {
        let previous = RunState::from_u8(self.value.swap(state.to_u8(), Ordering::SeqCst));
        self.changed.notify_waiters();
        previous
    }

    /// Stores `to` only if the current value is `from`
    ///
    /// Returns true if the transition happened.
    pub fn transition(&self, from: RunState, to: RunState) -> bool {
        let swapped = self
            .value
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if swapped {
            self.changed.notify_waiters();
        }
        swapped
    }

    /// Blocks while the state is `Paused`, returning the first other state seen
    ///
    /// `on_tick` is called every time `poll` elapses without a change.
    pub async fn wait_while_paused<F>(&self, poll: Duration, mut on_tick: F) -> RunState
    where
        F: FnMut(),
    {
        loop {
            // Registered before the check so a change between the two is not missed
            let notified = self.changed.notified();

            let state = self.get();
            if state != RunState::Paused {
                return state;
            }

            if tokio::time::timeout(poll, notified).await.is_err() {
                on_tick();
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(RunState::Stopped)
    }
}
