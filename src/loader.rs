//! Scrolls the virtualized message list backward until enough history is
//! materialized.
//!
//! Virtualized lists expose no reliable "top of history" signal, so the
//! loop combines an upper bound on the message count with empirical
//! convergence: when the count stops changing for several observations in a
//! row, further scrolling is not producing nodes and the run stops.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::dom::{Dom, DomResult};
use crate::selectors;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Stop once this many messages are materialized. "Enough history", not
    /// "all history".
    pub ceiling: usize,
    /// Consecutive unchanged observations that count as converged.
    pub stability_threshold: u32,
    /// How long the client gets to render newly revealed nodes per scroll.
    pub settle: Duration,
    /// Upper bound on waiting for the conversation panel to appear.
    pub panel_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ceiling: 50,
            stability_threshold: 3,
            settle: Duration::from_secs(3),
            panel_timeout: Duration::from_secs(60),
        }
    }
}

/// Counters local to one loader run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadState {
    pub materialized: usize,
    pub stability: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Ceiling,
    Converged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOutcome {
    pub materialized: usize,
    pub reason: StopReason,
}

/// The termination rule, separated from the scroll/query side effects so it
/// is testable against plain count sequences.
pub fn decide(count: usize, state: &LoadState, cfg: &LoaderConfig) -> (LoadState, Step) {
    if count >= cfg.ceiling {
        let next = LoadState {
            materialized: count,
            stability: state.stability,
        };
        return (next, Step::Stop(StopReason::Ceiling));
    }
    if count == state.materialized {
        let next = LoadState {
            materialized: count,
            stability: state.stability + 1,
        };
        if next.stability >= cfg.stability_threshold {
            return (next, Step::Stop(StopReason::Converged));
        }
        return (next, Step::Continue);
    }
    let next = LoadState {
        materialized: count,
        stability: 0,
    };
    (next, Step::Continue)
}

/// Materializes history by scrolling the oldest visible message into view
/// until [`decide`] stops the run. The DOM afterwards holds the node set
/// the extractor consumes; nothing is returned besides the outcome.
pub fn load_history<D: Dom>(dom: &D, cfg: &LoaderConfig) -> DomResult<LoadOutcome> {
    let panel = dom.wait_for(selectors::CHAT_PANEL, cfg.panel_timeout)?;
    let mut state = LoadState::default();

    loop {
        let messages = dom.find_all(Some(&panel), selectors::MESSAGE)?;
        let (next, step) = decide(messages.len(), &state, cfg);
        state = next;
        debug!(
            count = state.materialized,
            stability = state.stability,
            "observed message window"
        );

        if let Step::Stop(reason) = step {
            info!(materialized = state.materialized, ?reason, "history loaded");
            return Ok(LoadOutcome {
                materialized: state.materialized,
                reason,
            });
        }

        if let Some(oldest) = messages.first() {
            dom.scroll_into_view(oldest)?;
        }
        std::thread::sleep(cfg.settle);
    }
}
