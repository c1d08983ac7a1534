use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("capture_demo_missing_{suffix}.toml"));

    let settings = load_settings(&path).expect("defaults");

    assert_eq!(settings.orientation_poll_ms, Settings::default().orientation_poll_ms);
    assert_eq!(settings.initial_position, DevicePosition::Front);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    let raw = r#"
orientation_poll_ms = 250
initial_position = "back"
log_filter = "capture_core=debug"
unrelated = true
"#;

    apply_file(&mut settings, Path::new("capture.toml"), raw).expect("apply file");

    assert_eq!(settings.orientation_poll_ms, 250);
    assert_eq!(settings.initial_position, DevicePosition::Back);
    assert_eq!(settings.log_filter, "capture_core=debug");
    assert_eq!(settings.frame_interval_ms, Settings::default().frame_interval_ms);
}

#[test]
fn app_prefixed_env_wins_over_capture_prefix() {
    let mut settings = Settings::default();
    let lookup = env_from(&[
        ("CAPTURE_FRAME_INTERVAL_MS", "50"),
        ("APP__FRAME_INTERVAL_MS", "20"),
        ("CAPTURE_INITIAL_POSITION", "back"),
    ]);

    apply_env(&mut settings, lookup).expect("apply env");

    assert_eq!(settings.frame_interval_ms, 20);
    assert_eq!(settings.initial_position, DevicePosition::Back);
}

#[test]
fn rejects_zero_and_malformed_intervals() {
    let mut settings = Settings::default();

    let err = apply_env(&mut settings, env_from(&[("APP__ORIENTATION_POLL_MS", "0")]))
        .expect_err("zero interval");
    assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "orientation_poll_ms"));

    let err = apply_env(&mut settings, env_from(&[("APP__STEP_DELAY_MS", "soon")]))
        .expect_err("malformed interval");
    assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "step_delay_ms"));
}

#[test]
fn unknown_initial_position_is_rejected() {
    let mut settings = Settings::default();

    let err = apply_env(&mut settings, env_from(&[("CAPTURE_INITIAL_POSITION", "sideways")]))
        .expect_err("unknown position");

    assert!(matches!(err, SettingsError::InvalidPosition(ParsePositionError(ref value)) if value == "sideways"));
    assert_eq!(
        err.to_string(),
        "invalid value for 'initial_position': unknown device position 'sideways'"
    );
    assert_eq!(settings.initial_position, DevicePosition::Front);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut settings = Settings::default();
    let err = apply_file(&mut settings, Path::new("capture.toml"), "orientation_poll_ms = ")
        .expect_err("parse error");
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn controller_config_carries_poll_interval_and_position() {
    let settings = Settings {
        orientation_poll_ms: 40,
        initial_position: DevicePosition::Back,
        ..Settings::default()
    };

    let config = settings.controller_config();

    assert_eq!(config.orientation_poll_interval, Duration::from_millis(40));
    assert_eq!(config.initial_position, DevicePosition::Back);
}
