use std::fmt;
use std::io;
use std::str::Utf8Error;
use thiserror::Error;
use btleplug;
use reqwest;
use serde_json;

use crate::device::constants::{
    MESSAGE_BLUETOOTH_UNAVAILABLE, MESSAGE_CONNECTION_FAILED, MESSAGE_UNAUTHORIZED, UNAUTHORIZED_ERROR_CODES,
};
use crate::weighin::form::WeighinField;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,

    #[error("Bluetooth has not been initialized")]
    NotInitialized,

    #[error("The scale user has not been set up")]
    NoUser,

    #[error("The scale event channel already has a listener")]
    AlreadySubscribed,
}

/// Reasons a scan session could not be started. The `Display` output is the text shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("{message}")]
    ProfileIncomplete { message: String },

    #[error("{message}")]
    ConnectionFailed { message: String },

    #[error("{}", MESSAGE_UNAUTHORIZED)]
    Unauthorized { message: String },
}

impl ScanError {
    /// Classifies a failure raised while initializing the transport or starting the scan.
    pub fn from_connection_message(message: &str) -> ScanError {
        if UNAUTHORIZED_ERROR_CODES.iter().any(|code| message.contains(code)) {
            return ScanError::Unauthorized { message: message.to_string() };
        }

        let message = if message.trim().is_empty() {
            MESSAGE_CONNECTION_FAILED.to_string()
        } else {
            message.to_string()
        };

        ScanError::ConnectionFailed { message }
    }

    /// Same as `from_connection_message`, but for failures of the bluetooth initialization step,
    /// which have a more specific fallback message.
    pub fn from_init_failure(error: &DeviceError) -> ScanError {
        match error {
            DeviceError::NoAdapter => ScanError::ConnectionFailed {
                message: MESSAGE_BLUETOOTH_UNAVAILABLE.to_string(),
            },
            _ => ScanError::from_connection_message(&error.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Malformed scale event: {source}")]
    Malformed { #[from] source: serde_json::Error },

    #[error("Scale event has no type")]
    MissingType,

    #[error("Scale reported a non-finite value for {field}")]
    NonFinite { field: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: WeighinField,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn for_field(&self, field: WeighinField) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|error| error.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Invalid weigh-in: {source}")]
    Invalid { #[from] source: ValidationErrors },

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to reach the server: {source}")]
    Transport { #[from] source: reqwest::Error },

    #[error("Failed to encode the weigh-in: {source}")]
    Encode { #[from] source: serde_json::Error },

    #[error("Failed to write the weigh-in: {source}")]
    Io { #[from] source: io::Error },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (device): {source}")]
    DeviceError { #[from] source: DeviceError },

    #[error("Scan failed: {source}")]
    ScanError { #[from] source: ScanError },

    #[error("Weigh-in was not saved: {source}")]
    SubmissionError { #[from] source: SubmissionError },

    #[error("Failed to read scale events: {source}")]
    EventSource { #[from] source: io::Error },

    #[error("Scale event input stopped unexpectedly: {source}")]
    EventBridge { #[from] source: tokio::task::JoinError },

    #[error("Failed to start the async runtime: {source}")]
    Runtime { source: io::Error },
}
