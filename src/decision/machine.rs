//! Transition rules of the automatic control machine.

use super::DecisionState;
use crate::time_source::elapsed_ms;

/// Entry action requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Entering `ON`: command the light on at the configured brightness.
    SwitchOn,
    /// Entering `OFF`: command the light off.
    SwitchOff,
    /// Entering `COUNTDOWN`: the light stays on.
    StartCountdown,
}

/// One cycle of the machine.
///
/// `activate` is the current activation predicate. Returns the next state and
/// the entry action, if the state changed.
pub fn step(
    state: DecisionState,
    activate: bool,
    now: u32,
    shutoff_delay_ms: u32,
) -> (DecisionState, Option<Action>) {
    match state {
        DecisionState::Off if activate => (DecisionState::On, Some(Action::SwitchOn)),
        DecisionState::Off => (state, None),
        DecisionState::On if activate => (state, None),
        DecisionState::On => (
            DecisionState::Countdown { since: now },
            Some(Action::StartCountdown),
        ),
        DecisionState::Countdown { .. } if activate => {
            (DecisionState::On, Some(Action::SwitchOn))
        }
        DecisionState::Countdown { since } if elapsed_ms(now, since) > shutoff_delay_ms => {
            (DecisionState::Off, Some(Action::SwitchOff))
        }
        DecisionState::Countdown { .. } => (state, None),
    }
}
