//! In-process stand-ins for a camera and an orientation sensor.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use capture_integration::{CaptureDevice, FrameStream, OrientationSource, OrientationStream};
use futures::StreamExt;
use shared::{
    domain::{DevicePosition, Frame, Orientation, SessionId},
    error::{OperationError, OperationKind},
};
use tokio::sync::oneshot;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info};

const ORIENTATION_CYCLE: [Orientation; 4] = [
    Orientation::Portrait,
    Orientation::LandscapeLeft,
    Orientation::PortraitUpsideDown,
    Orientation::LandscapeRight,
];

struct SimulatedSession {
    position: DevicePosition,
    stop_tx: Option<oneshot::Sender<()>>,
}

pub struct SimulatedCaptureDevice {
    frame_interval: Duration,
    fail_create: bool,
    sessions: Mutex<HashMap<SessionId, SimulatedSession>>,
}

impl SimulatedCaptureDevice {
    pub fn new(frame_interval: Duration, fail_create: bool) -> Self {
        Self {
            frame_interval,
            fail_create,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SimulatedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn position_of(&self, session_id: SessionId) -> Option<DevicePosition> {
        self.sessions().get(&session_id).map(|session| session.position)
    }
}

#[async_trait]
impl CaptureDevice for SimulatedCaptureDevice {
    async fn create_session(&self, position: DevicePosition) -> Result<SessionId, OperationError> {
        if self.fail_create {
            return Err(OperationError::unavailable(
                OperationKind::Create,
                "simulated camera refused to open",
            ));
        }
        let session_id = SessionId::new_v4();
        self.sessions().insert(
            session_id,
            SimulatedSession {
                position,
                stop_tx: None,
            },
        );
        info!(%session_id, position = position.as_str(), "simulated session created");
        Ok(session_id)
    }

    fn start_session(&self, session_id: SessionId) -> FrameStream {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(&session_id) else {
            return futures::stream::once(async move {
                Err(OperationError::unknown_session(
                    OperationKind::Start,
                    format!("no simulated session {session_id}"),
                ))
            })
            .boxed();
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        session.stop_tx = Some(stop_tx);

        let mut sequence = 0u64;
        IntervalStream::new(tokio::time::interval(self.frame_interval))
            .map(move |_| {
                sequence += 1;
                Ok(Frame::new(session_id, sequence))
            })
            .take_until(stop_rx)
            .boxed()
    }

    async fn configure_input(
        &self,
        session_id: SessionId,
        position: DevicePosition,
    ) -> Result<(), OperationError> {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(&session_id).ok_or_else(|| {
            OperationError::unknown_session(
                OperationKind::Reconfigure,
                format!("no simulated session {session_id}"),
            )
        })?;
        session.position = position;
        debug!(%session_id, position = position.as_str(), "simulated input reconfigured");
        Ok(())
    }

    async fn stop_session(&self, session_id: SessionId) -> Result<(), OperationError> {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(&session_id).ok_or_else(|| {
            OperationError::unknown_session(
                OperationKind::Stop,
                format!("no simulated session {session_id}"),
            )
        })?;
        if let Some(stop_tx) = session.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        Ok(())
    }

    async fn remove_session(&self) -> Result<(), OperationError> {
        // Dropping each stop sender ends its frame stream as well.
        let removed = self.sessions().drain().count();
        info!(removed, "simulated sessions removed");
        Ok(())
    }
}

#[derive(Default)]
pub struct SimulatedOrientation;

impl OrientationSource for SimulatedOrientation {
    fn observe(&self, poll_interval: Duration) -> OrientationStream {
        IntervalStream::new(tokio::time::interval(poll_interval))
            .enumerate()
            .map(|(tick, _)| ORIENTATION_CYCLE[tick % ORIENTATION_CYCLE.len()])
            .boxed()
    }
}
