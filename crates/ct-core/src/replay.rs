//! Event-by-event replay of a normalized trace.

use crate::event::Event;
use crate::state::CombatState;
use crate::trace::Trace;

/// A consumer of replayed events.
///
/// This trait allows several independent statistics to share one pass over
/// the trace and one [`CombatState`].
pub trait Analyzer {
    /// Called for every event, before the event is folded into `state`.
    ///
    /// A cast therefore sees the buffs that were up when it was issued.
    fn on_event(&mut self, event: &Event, state: &CombatState);

    /// Called once after the last event.
    fn on_finished(&mut self) {}
}

/// Replays `trace` through every analyzer, keeping `state` current.
///
/// Returns the state as of the end of the trace.
pub fn replay(
    trace: &Trace,
    mut state: CombatState,
    analyzers: &mut [&mut dyn Analyzer],
) -> CombatState {
    if !trace.is_normalized() {
        tracing::warn!("replaying a trace that has not been normalized");
    }

    for event in trace {
        for analyzer in analyzers.iter_mut() {
            analyzer.on_event(event, &state);
        }
        state.apply(event);
    }

    for analyzer in analyzers.iter_mut() {
        analyzer.on_finished();
    }

    tracing::debug!(
        player = state.player(),
        events = trace.len(),
        analyzers = analyzers.len(),
        "replay finished"
    );
    state
}
