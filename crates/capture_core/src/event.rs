//! Inbound events: caller intents plus results fed back by running operations.

use shared::{
    domain::{Frame, Orientation, SessionId},
    error::OperationError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RequestCreate,
    CreateSucceeded(SessionId),
    RequestStart,
    DataFrameArrived(Frame),
    OrientationUpdated(Orientation),
    RequestPositionChange,
    RequestStop,
    StopSucceeded(SessionId),
    OperationFailed(OperationError),
    RequestRemove,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::RequestCreate => "request_create",
            SessionEvent::CreateSucceeded(_) => "create_succeeded",
            SessionEvent::RequestStart => "request_start",
            SessionEvent::DataFrameArrived(_) => "data_frame_arrived",
            SessionEvent::OrientationUpdated(_) => "orientation_updated",
            SessionEvent::RequestPositionChange => "request_position_change",
            SessionEvent::RequestStop => "request_stop",
            SessionEvent::StopSucceeded(_) => "stop_succeeded",
            SessionEvent::OperationFailed(_) => "operation_failed",
            SessionEvent::RequestRemove => "request_remove",
        }
    }
}
