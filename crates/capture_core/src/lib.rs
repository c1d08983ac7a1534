use std::time::Duration;

use async_trait::async_trait;
use capture_integration::{
    CaptureDevice, FrameStream, LogSink, OrientationSource, OrientationStream,
};
use futures::{stream, StreamExt};
use shared::{
    domain::{DevicePosition, SessionId},
    error::{OperationError, OperationKind},
};
use thiserror::Error;
use tracing::warn;

mod controller;
pub mod effect;
pub mod event;
pub mod reducer;
pub mod registry;
pub mod state;

pub use controller::SessionController;
pub use effect::{Effect, EffectHandle};
pub use event::SessionEvent;
pub use reducer::reduce;
pub use registry::EffectRegistry;
pub use state::{ControllerState, SessionState};

const DEFAULT_ORIENTATION_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_FRAME_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub orientation_poll_interval: Duration,
    pub initial_position: DevicePosition,
    /// Capacity of the frame broadcast; slow subscribers lag rather than
    /// stall the loop.
    pub frame_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            orientation_poll_interval: DEFAULT_ORIENTATION_POLL_INTERVAL,
            initial_position: DevicePosition::default(),
            frame_buffer: DEFAULT_FRAME_BUFFER,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("session controller loop has stopped")]
    Closed,
    #[error("session controller loop panicked: {0}")]
    LoopPanicked(String),
}

pub struct MissingCaptureDevice;

#[async_trait]
impl CaptureDevice for MissingCaptureDevice {
    async fn create_session(&self, _position: DevicePosition) -> Result<SessionId, OperationError> {
        Err(OperationError::unavailable(
            OperationKind::Create,
            "capture device unavailable",
        ))
    }

    fn start_session(&self, session_id: SessionId) -> FrameStream {
        stream::once(async move {
            Err(OperationError::unavailable(
                OperationKind::Start,
                format!("capture device unavailable for session {session_id}"),
            ))
        })
        .boxed()
    }

    async fn configure_input(
        &self,
        session_id: SessionId,
        _position: DevicePosition,
    ) -> Result<(), OperationError> {
        Err(OperationError::unavailable(
            OperationKind::Reconfigure,
            format!("capture device unavailable for session {session_id}"),
        ))
    }

    async fn stop_session(&self, session_id: SessionId) -> Result<(), OperationError> {
        Err(OperationError::unavailable(
            OperationKind::Stop,
            format!("capture device unavailable for session {session_id}"),
        ))
    }

    async fn remove_session(&self) -> Result<(), OperationError> {
        Err(OperationError::unavailable(
            OperationKind::Teardown,
            "capture device unavailable",
        ))
    }
}

pub struct MissingOrientationSource;

impl OrientationSource for MissingOrientationSource {
    fn observe(&self, _poll_interval: Duration) -> OrientationStream {
        stream::empty().boxed()
    }
}

pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, message: &str) {
        warn!("capture: {message}");
    }
}
