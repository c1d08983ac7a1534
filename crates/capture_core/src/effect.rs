//! Effects are descriptions, not work. The reducer returns them and the
//! controller decides how to run them.

use shared::domain::{DevicePosition, Frame, SessionId};

use crate::event::SessionEvent;

/// Identity of a recurring operation that may be superseded or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectHandle {
    OrientationObservation,
}

impl EffectHandle {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectHandle::OrientationObservation => "orientation_observation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateSession {
        position: DevicePosition,
    },
    StartSession {
        session_id: SessionId,
    },
    ObserveOrientation {
        handle: EffectHandle,
    },
    Reconfigure {
        session_id: SessionId,
        position: DevicePosition,
    },
    StopSession {
        session_id: SessionId,
    },
    Teardown,
    Cancel(EffectHandle),
    Dispatch(SessionEvent),
    ForwardFrame(Frame),
    Log(String),
}
