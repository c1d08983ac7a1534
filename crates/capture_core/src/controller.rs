//! Event loop hosting the reducer and running the effects it emits.

use std::{future::Future, sync::Arc};

use capture_integration::{CaptureDevice, LogSink, OrientationSource};
use futures::StreamExt;
use shared::{
    domain::Frame,
    error::{FailureCode, OperationError, OperationKind},
};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::{
    effect::Effect,
    event::SessionEvent,
    reducer::reduce,
    registry::EffectRegistry,
    state::ControllerState,
    ControllerConfig, ControllerError, MissingCaptureDevice, MissingOrientationSource,
    TracingLogSink,
};

/// Handle to a running controller loop. Dropping it stops the loop and
/// cancels every registered effect.
pub struct SessionController {
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state_rx: watch::Receiver<ControllerState>,
    frames: broadcast::Sender<Frame>,
    shutdown_guard: DropGuard,
    loop_task: JoinHandle<()>,
}

impl SessionController {
    pub fn spawn(config: ControllerConfig) -> Self {
        Self::spawn_with_dependencies(
            config,
            Arc::new(MissingCaptureDevice),
            Arc::new(MissingOrientationSource),
            Arc::new(TracingLogSink),
        )
    }

    pub fn spawn_with_dependencies(
        config: ControllerConfig,
        device: Arc<dyn CaptureDevice>,
        orientation: Arc<dyn OrientationSource>,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        let state = ControllerState::new(config.initial_position);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (frames, _) = broadcast::channel(config.frame_buffer.max(1));
        let shutdown = CancellationToken::new();

        let executor = EffectExecutor {
            state,
            state_tx,
            events_tx: events_tx.clone(),
            frames: frames.clone(),
            registry: EffectRegistry::new(),
            device,
            orientation,
            log_sink,
            config,
            shutdown: shutdown.clone(),
        };
        let loop_task = tokio::spawn(executor.run(events_rx));

        Self {
            events_tx,
            state_rx,
            frames,
            shutdown_guard: shutdown.drop_guard(),
            loop_task,
        }
    }

    pub fn send(&self, event: SessionEvent) -> Result<(), ControllerError> {
        self.events_tx
            .send(event)
            .map_err(|_| ControllerError::Closed)
    }

    pub fn snapshot(&self) -> ControllerState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ControllerState> {
        self.state_rx.clone()
    }

    pub fn subscribe_frames(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    /// Stops the loop after the event it is currently processing and waits
    /// for it to exit. Operations already in flight are not awaited.
    pub async fn shutdown(self) -> Result<ControllerState, ControllerError> {
        let Self {
            state_rx,
            shutdown_guard,
            loop_task,
            ..
        } = self;
        drop(shutdown_guard);
        loop_task
            .await
            .map_err(|err| ControllerError::LoopPanicked(err.to_string()))?;
        let final_state = state_rx.borrow().clone();
        Ok(final_state)
    }
}

struct EffectExecutor {
    state: ControllerState,
    state_tx: watch::Sender<ControllerState>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    frames: broadcast::Sender<Frame>,
    registry: EffectRegistry,
    device: Arc<dyn CaptureDevice>,
    orientation: Arc<dyn OrientationSource>,
    log_sink: Arc<dyn LogSink>,
    config: ControllerConfig,
    shutdown: CancellationToken,
}

impl EffectExecutor {
    async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<SessionEvent>) {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                event = events_rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.process(event);
        }

        self.registry.cancel_all();
        debug!(state = %self.state.session_state, "session controller loop stopped");
    }

    fn process(&mut self, event: SessionEvent) {
        let event_name = event.name();
        let before = self.state.session_state;
        let effects = reduce(&mut self.state, event);

        if before != self.state.session_state {
            info!(
                event = event_name,
                from = %before,
                to = %self.state.session_state,
                "capture session transition"
            );
        } else {
            debug!(
                event = event_name,
                state = %before,
                effects = effects.len(),
                "capture event processed"
            );
        }

        for effect in effects {
            self.execute(effect);
        }

        // Published after scheduling, so a snapshot showing `Running` implies
        // the frame and orientation streams are already wired.
        let state = &self.state;
        self.state_tx.send_if_modified(|current| {
            if current == state {
                return false;
            }
            *current = state.clone();
            true
        });
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::CreateSession { position } => {
                let device = Arc::clone(&self.device);
                self.spawn_operation(async move {
                    // Run the device call in its own task so a panic still
                    // produces a result and releases the creation guard.
                    let attempt =
                        tokio::spawn(async move { device.create_session(position).await });
                    Some(match attempt.await {
                        Ok(Ok(session_id)) => SessionEvent::CreateSucceeded(session_id),
                        Ok(Err(err)) => SessionEvent::OperationFailed(OperationError {
                            operation: OperationKind::Create,
                            ..err
                        }),
                        Err(join_err) => SessionEvent::OperationFailed(OperationError::new(
                            OperationKind::Create,
                            FailureCode::Internal,
                            format!("create task failed: {join_err}"),
                        )),
                    })
                });
            }
            Effect::StartSession { session_id } => {
                let mut frames = self.device.start_session(session_id);
                let events_tx = self.events_tx.clone();
                // Not a registry handle: only loop shutdown ends it early.
                let stop = self.shutdown.child_token();
                tokio::spawn(async move {
                    loop {
                        let item = tokio::select! {
                            _ = stop.cancelled() => break,
                            item = frames.next() => match item {
                                Some(item) => item,
                                None => break,
                            },
                        };
                        let (event, last) = match item {
                            Ok(frame) => (SessionEvent::DataFrameArrived(frame), false),
                            Err(err) => (SessionEvent::OperationFailed(err), true),
                        };
                        if events_tx.send(event).is_err() || last {
                            break;
                        }
                    }
                    debug!(%session_id, "frame stream ended");
                });
            }
            Effect::ObserveOrientation { handle } => {
                let mut orientations = self
                    .orientation
                    .observe(self.config.orientation_poll_interval);
                let events_tx = self.events_tx.clone();
                self.registry.schedule(handle, async move {
                    while let Some(orientation) = orientations.next().await {
                        if events_tx
                            .send(SessionEvent::OrientationUpdated(orientation))
                            .is_err()
                        {
                            break;
                        }
                    }
                });
            }
            Effect::Reconfigure {
                session_id,
                position,
            } => {
                let device = Arc::clone(&self.device);
                self.spawn_operation(async move {
                    device
                        .configure_input(session_id, position)
                        .await
                        .err()
                        .map(SessionEvent::OperationFailed)
                });
            }
            Effect::StopSession { session_id } => {
                let device = Arc::clone(&self.device);
                self.spawn_operation(async move {
                    Some(match device.stop_session(session_id).await {
                        Ok(()) => SessionEvent::StopSucceeded(session_id),
                        Err(err) => SessionEvent::OperationFailed(err),
                    })
                });
            }
            Effect::Teardown => {
                let device = Arc::clone(&self.device);
                self.spawn_operation(async move {
                    device
                        .remove_session()
                        .await
                        .err()
                        .map(SessionEvent::OperationFailed)
                });
            }
            Effect::Cancel(handle) => {
                self.registry.cancel(handle);
            }
            Effect::Dispatch(event) => {
                if self.events_tx.send(event).is_err() {
                    warn!("dropping dispatched event: controller input closed");
                }
            }
            Effect::ForwardFrame(frame) => {
                // No subscribers is fine; frames are not buffered for later.
                let _ = self.frames.send(frame);
            }
            Effect::Log(message) => self.log_sink.log(&message),
        }
    }

    /// One-shot operations run detached and are never superseded.
    fn spawn_operation<F>(&self, operation: F)
    where
        F: Future<Output = Option<SessionEvent>> + Send + 'static,
    {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = operation.await {
                let _ = events_tx.send(event);
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
