use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use capture_core::{SessionController, SessionEvent, TracingLogSink};
use clap::{Parser, ValueEnum};
use shared::domain::Frame;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

mod config;
mod simulated;

use config::{load_settings, DEFAULT_CONFIG_PATH};
use simulated::{SimulatedCaptureDevice, SimulatedOrientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Step {
    Create,
    Start,
    Flip,
    Stop,
    Remove,
    Wait,
}

impl Step {
    fn event(self) -> Option<SessionEvent> {
        match self {
            Step::Create => Some(SessionEvent::RequestCreate),
            Step::Start => Some(SessionEvent::RequestStart),
            Step::Flip => Some(SessionEvent::RequestPositionChange),
            Step::Stop => Some(SessionEvent::RequestStop),
            Step::Remove => Some(SessionEvent::RequestRemove),
            Step::Wait => None,
        }
    }
}

/// Drives a simulated capture session through a scripted sequence of requests.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [
            Step::Create,
            Step::Wait,
            Step::Flip,
            Step::Flip,
            Step::Stop,
            Step::Start,
            Step::Wait,
            Step::Remove,
        ]
    )]
    script: Vec<Step>,
    /// Make the simulated camera refuse to open.
    #[arg(long)]
    fail_create: bool,
    /// Print the final snapshot as JSON.
    #[arg(long)]
    json: bool,
}

fn spawn_frame_counter(mut frames: broadcast::Receiver<Frame>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut count = 0u64;
        loop {
            match frames.recv().await {
                Ok(frame) => {
                    count += 1;
                    debug!(session_id = %frame.session_id, sequence = frame.sequence, "frame");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "frame subscriber lagged");
                    count += skipped;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        count
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args.config)
        .with_context(|| format!("failed to load settings from '{}'", args.config.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let device = Arc::new(SimulatedCaptureDevice::new(
        settings.frame_interval(),
        args.fail_create,
    ));
    let controller = SessionController::spawn_with_dependencies(
        settings.controller_config(),
        device,
        Arc::new(SimulatedOrientation),
        Arc::new(TracingLogSink),
    );
    let frame_counter = spawn_frame_counter(controller.subscribe_frames());

    for step in &args.script {
        if let Some(event) = step.event() {
            controller
                .send(event)
                .with_context(|| format!("failed to submit step {step:?}"))?;
            info!(?step, "step submitted");
        }
        tokio::time::sleep(settings.step_delay()).await;
    }

    let final_state = controller
        .shutdown()
        .await
        .context("session controller did not shut down cleanly")?;
    let frames = frame_counter.await.context("frame counter task failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&final_state)?);
    } else {
        println!(
            "session={} position={} orientation={:?} frames={frames}",
            final_state.session_state,
            final_state.device_position.as_str(),
            final_state.orientation,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_script() {
        let args = Args::parse_from(["capture_demo", "--script", "create,flip,stop"]);
        assert_eq!(args.script, vec![Step::Create, Step::Flip, Step::Stop]);
        assert!(!args.fail_create);
    }

    #[test]
    fn default_script_creates_and_removes() {
        let args = Args::parse_from(["capture_demo"]);
        assert_eq!(args.script.first(), Some(&Step::Create));
        assert_eq!(args.script.last(), Some(&Step::Remove));
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn wait_step_submits_nothing() {
        assert_eq!(Step::Wait.event(), None);
        assert_eq!(Step::Flip.event(), Some(SessionEvent::RequestPositionChange));
    }

    #[tokio::test]
    async fn scripted_run_against_simulated_device_ends_without_session() {
        let settings = config::Settings {
            orientation_poll_ms: 1,
            frame_interval_ms: 1,
            ..config::Settings::default()
        };
        let controller = SessionController::spawn_with_dependencies(
            settings.controller_config(),
            Arc::new(SimulatedCaptureDevice::new(settings.frame_interval(), false)),
            Arc::new(SimulatedOrientation),
            Arc::new(TracingLogSink),
        );
        let frame_counter = spawn_frame_counter(controller.subscribe_frames());
        let mut state_rx = controller.subscribe_state();

        controller.send(SessionEvent::RequestCreate).expect("create");
        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            state_rx.wait_for(|state| state.session_state.is_running()),
        )
        .await
        .expect("running in time")
        .expect("loop alive");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        controller.send(SessionEvent::RequestRemove).expect("remove");
        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            state_rx.wait_for(|state| state.session_id().is_none()),
        )
        .await
        .expect("removed in time")
        .expect("loop alive");

        let final_state = controller.shutdown().await.expect("shutdown");
        let frames = frame_counter.await.expect("counter");

        assert_eq!(final_state.session_state, capture_core::SessionState::NoSession);
        assert!(frames > 0);
        assert_ne!(final_state.orientation, shared::domain::Orientation::Unknown);
    }
}
