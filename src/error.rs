//! Reportable control-flow failures.
//!
//! Every operator-triggered action fails synchronously with one of the kinds
//! below. None of them is fatal to the process and none triggers an automatic
//! retry; the presentation layer reports the message and waits for the next
//! action.
//!
//! `ControlError` is carried inside `anyhow::Error` so call sites keep the
//! usual `Result<T>` + `?` flow, while callers that care about the kind can
//! recover it with [`ControlError::kind_of`].

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlErrorKind {
    /// Camera device could not be opened or read.
    DeviceUnavailable,
    /// Transport open failed.
    ConnectionFailed,
    /// Dispatch attempted without a connected transport.
    NotReady,
    /// Send attempted without a qualifying detection from the last cycle.
    NoDetection,
    /// The primary detection's class has no command mapping.
    Unrecognized,
    /// The transport write failed after the link was connected.
    WriteFailed,
}

impl ControlErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ControlErrorKind::DeviceUnavailable => "DEVICE_UNAVAILABLE",
            ControlErrorKind::ConnectionFailed => "CONNECTION_FAILED",
            ControlErrorKind::NotReady => "NOT_READY",
            ControlErrorKind::NoDetection => "NO_DETECTION",
            ControlErrorKind::Unrecognized => "UNRECOGNIZED",
            ControlErrorKind::WriteFailed => "WRITE_FAILED",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControlError {
    pub kind: ControlErrorKind,
    pub message: String,
}

impl ControlError {
    pub fn new(kind: ControlErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Recover the typed kind from an `anyhow::Error`, walking the context
    /// chain. Returns `None` for errors that did not originate here.
    pub fn kind_of(err: &anyhow::Error) -> Option<ControlErrorKind> {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<ControlError>())
            .map(|e| e.kind)
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for ControlError {}
