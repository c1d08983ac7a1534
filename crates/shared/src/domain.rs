use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParsePositionError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

// Capability token for one capture session instance. Minted by the device on
// each successful creation and never handed out twice.
id_newtype!(SessionId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePosition {
    #[default]
    Front,
    Back,
}

impl DevicePosition {
    pub fn toggled(self) -> Self {
        match self {
            DevicePosition::Front => DevicePosition::Back,
            DevicePosition::Back => DevicePosition::Front,
        }
    }

    pub fn toggle(&mut self) {
        *self = self.toggled();
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DevicePosition::Front => "front",
            DevicePosition::Back => "back",
        }
    }
}

impl std::str::FromStr for DevicePosition {
    type Err = ParsePositionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(DevicePosition::Front),
            "back" => Ok(DevicePosition::Back),
            other => Err(ParsePositionError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

/// One unit of captured output. The payload itself stays with the device;
/// the controller only needs to know which session produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub session_id: SessionId,
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(session_id: SessionId, sequence: u64) -> Self {
        Self {
            session_id,
            sequence,
            captured_at: Utc::now(),
        }
    }
}
