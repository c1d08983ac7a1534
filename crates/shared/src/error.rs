use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Start,
    Reconfigure,
    Stop,
    Teardown,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Start => "start",
            OperationKind::Reconfigure => "reconfigure",
            OperationKind::Stop => "stop",
            OperationKind::Teardown => "teardown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    Unavailable,
    UnknownSession,
    Rejected,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown device position '{0}'")]
pub struct ParsePositionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} failed ({code:?}): {message}", .operation.as_str())]
pub struct OperationError {
    pub operation: OperationKind,
    pub code: FailureCode,
    pub message: String,
}

impl OperationError {
    pub fn new(operation: OperationKind, code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(operation: OperationKind, message: impl Into<String>) -> Self {
        Self::new(operation, FailureCode::Unavailable, message)
    }

    pub fn unknown_session(operation: OperationKind, message: impl Into<String>) -> Self {
        Self::new(operation, FailureCode::UnknownSession, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failed_operation() {
        let err = OperationError::unavailable(OperationKind::Create, "camera busy");
        assert_eq!(err.to_string(), "create failed (Unavailable): camera busy");
    }

    #[test]
    fn position_parsing_ignores_case_and_reports_unknown_input() {
        use crate::domain::DevicePosition;

        assert_eq!(" Back ".parse::<DevicePosition>(), Ok(DevicePosition::Back));
        let err = "side".parse::<DevicePosition>().expect_err("unknown position");
        assert_eq!(err, ParsePositionError("side".into()));
        assert_eq!(err.to_string(), "unknown device position 'side'");
    }

    #[test]
    fn serializes_codes_in_snake_case() {
        let err = OperationError::unknown_session(OperationKind::Stop, "gone");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["operation"], "stop");
        assert_eq!(json["code"], "unknown_session");
    }
}
