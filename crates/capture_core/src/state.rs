use std::fmt;

use serde::Serialize;
use shared::domain::{DevicePosition, Orientation, SessionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "session_id")]
pub enum SessionState {
    #[default]
    NoSession,
    Idle(SessionId),
    Running(SessionId),
}

impl SessionState {
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            SessionState::NoSession => None,
            SessionState::Idle(session_id) | SessionState::Running(session_id) => {
                Some(*session_id)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NoSession => "noSession",
            SessionState::Idle(_) => "idle",
            SessionState::Running(_) => "running",
        };
        f.write_str(label)
    }
}

/// Everything the reducer owns. Only the controller loop mutates this;
/// everyone else works from a cloned snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerState {
    pub session_state: SessionState,
    pub device_position: DevicePosition,
    pub orientation: Orientation,
    /// Set between `RequestCreate` and the creation result. Lets the reducer
    /// tell a fresh `CreateSucceeded` from a late or duplicated one.
    pub creation_in_flight: bool,
}

impl ControllerState {
    pub fn new(device_position: DevicePosition) -> Self {
        Self {
            device_position,
            ..Self::default()
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_state.session_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_present_only_for_idle_and_running() {
        let id = SessionId::new_v4();
        assert_eq!(SessionState::NoSession.session_id(), None);
        assert_eq!(SessionState::Idle(id).session_id(), Some(id));
        assert_eq!(SessionState::Running(id).session_id(), Some(id));
    }

    #[test]
    fn display_uses_short_labels() {
        let id = SessionId::new_v4();
        assert_eq!(SessionState::NoSession.to_string(), "noSession");
        assert_eq!(SessionState::Idle(id).to_string(), "idle");
        assert_eq!(SessionState::Running(id).to_string(), "running");
    }

    #[test]
    fn snapshot_serializes_tagged_session_state() {
        let id = SessionId::new_v4();
        let state = ControllerState {
            session_state: SessionState::Running(id),
            ..ControllerState::default()
        };
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(json["session_state"]["state"], "running");
        assert_eq!(json["session_state"]["session_id"], id.to_string());
        assert_eq!(json["device_position"], "front");
        assert_eq!(json["orientation"], "unknown");
    }
}
