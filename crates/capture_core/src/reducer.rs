//! Pure transition function for the capture session.
//!
//! `reduce` never performs I/O and never suspends. Events whose precondition
//! does not hold leave the state untouched and produce no effects; under
//! concurrent delivery those are expected races rather than bugs.

use shared::error::OperationKind;

use crate::{
    effect::{Effect, EffectHandle},
    event::SessionEvent,
    state::{ControllerState, SessionState},
};

pub fn reduce(state: &mut ControllerState, event: SessionEvent) -> Vec<Effect> {
    match event {
        SessionEvent::RequestCreate => request_create(state),
        SessionEvent::CreateSucceeded(session_id) => {
            if state.session_state != SessionState::NoSession || !state.creation_in_flight {
                return Vec::new();
            }
            state.creation_in_flight = false;
            state.session_state = SessionState::Idle(session_id);
            vec![Effect::Dispatch(SessionEvent::RequestStart)]
        }
        SessionEvent::RequestStart => {
            let SessionState::Idle(session_id) = state.session_state else {
                return Vec::new();
            };
            state.session_state = SessionState::Running(session_id);
            vec![
                Effect::StartSession { session_id },
                Effect::ObserveOrientation {
                    handle: EffectHandle::OrientationObservation,
                },
            ]
        }
        SessionEvent::DataFrameArrived(frame) => match state.session_state {
            SessionState::Running(session_id) if frame.session_id == session_id => {
                vec![Effect::ForwardFrame(frame)]
            }
            _ => Vec::new(),
        },
        SessionEvent::OrientationUpdated(orientation) => {
            state.orientation = orientation;
            Vec::new()
        }
        SessionEvent::RequestPositionChange => {
            let Some(session_id) = state.session_id() else {
                return Vec::new();
            };
            state.device_position.toggle();
            vec![Effect::Reconfigure {
                session_id,
                position: state.device_position,
            }]
        }
        SessionEvent::RequestStop => {
            let SessionState::Running(session_id) = state.session_state else {
                return Vec::new();
            };
            state.session_state = SessionState::Idle(session_id);
            vec![
                Effect::StopSession { session_id },
                Effect::Cancel(EffectHandle::OrientationObservation),
            ]
        }
        SessionEvent::StopSucceeded(stopped_id) => match state.session_state {
            SessionState::Running(session_id) if session_id == stopped_id => {
                state.session_state = SessionState::Idle(session_id);
                vec![Effect::Cancel(EffectHandle::OrientationObservation)]
            }
            _ => Vec::new(),
        },
        SessionEvent::OperationFailed(err) => {
            if err.operation == OperationKind::Create {
                state.creation_in_flight = false;
            }
            vec![Effect::Log(err.to_string())]
        }
        SessionEvent::RequestRemove => request_remove(state),
    }
}

fn request_create(state: &mut ControllerState) -> Vec<Effect> {
    if state.session_state != SessionState::NoSession || state.creation_in_flight {
        return Vec::new();
    }
    state.creation_in_flight = true;
    vec![Effect::CreateSession {
        position: state.device_position,
    }]
}

fn request_remove(state: &mut ControllerState) -> Vec<Effect> {
    let was_running = match state.session_state {
        SessionState::NoSession => return Vec::new(),
        SessionState::Idle(_) => false,
        SessionState::Running(_) => true,
    };
    state.session_state = SessionState::NoSession;

    let mut effects = vec![Effect::Teardown];
    if was_running {
        effects.push(Effect::Cancel(EffectHandle::OrientationObservation));
    }
    effects
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
