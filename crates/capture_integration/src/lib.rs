//! Seams to the platform capture stack. The controller schedules and cancels
//! these operations but never looks inside them.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use shared::{
    domain::{DevicePosition, Frame, Orientation, SessionId},
    error::OperationError,
};

pub type FrameStream = BoxStream<'static, Result<Frame, OperationError>>;
pub type OrientationStream = BoxStream<'static, Orientation>;

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn create_session(&self, position: DevicePosition) -> Result<SessionId, OperationError>;
    /// Begins data production. The stream ends when the device stops the
    /// session; an `Err` item reports a mid-flight failure.
    fn start_session(&self, session_id: SessionId) -> FrameStream;
    async fn configure_input(
        &self,
        session_id: SessionId,
        position: DevicePosition,
    ) -> Result<(), OperationError>;
    async fn stop_session(&self, session_id: SessionId) -> Result<(), OperationError>;
    async fn remove_session(&self) -> Result<(), OperationError>;
}

pub trait OrientationSource: Send + Sync {
    fn observe(&self, poll_interval: Duration) -> OrientationStream;
}

pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}
