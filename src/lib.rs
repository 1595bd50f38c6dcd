//! armpick - vision-guided pick/sort controller
//!
//! This crate implements the single-shot detection-to-command pipeline that
//! drives a pick/sort arm over a serial link:
//!
//! 1. acquire exactly one camera frame per explicit trigger
//! 2. run object detection (an external capability behind a trait)
//! 3. filter detections to an allowlist and select one primary by first match
//! 4. render scaled annotations for the display
//! 5. map the primary's class to a command code and dispatch it, with a
//!    timed, sequence-keyed idle-reset governing the link status
//!
//! # Module Structure
//!
//! - `frame`: owned pixel buffers handed between stages
//! - `capture`: frame sources (synthetic `stub://` scenes, V4L2 devices)
//! - `detect`: detector contract, backends, allowlist filter
//! - `catalog`: class styling and the command allowlist
//! - `annotate`: display-space box/label rendering
//! - `command`: command codes and the class-to-command table
//! - `link`: connection state machine, dispatch, transports
//! - `session` / `control`: explicit session state and per-action handlers
//! - `config`: file + environment configuration
//!
//! Presentation (windows, consoles) lives in the binaries; the library has no
//! dependency on it. Detection inference is consumed through
//! [`detect::DetectorBackend`]; no model runtime ships here.

pub mod annotate;
pub mod capture;
pub mod catalog;
pub mod command;
pub mod config;
pub mod control;
pub mod detect;
pub mod error;
pub mod frame;
pub mod link;
pub mod session;

pub use annotate::{Annotated, Annotator, AnnotatorConfig};
pub use capture::{CameraConfig, CameraSource, CaptureError};
pub use catalog::{AllowList, ClassCatalog, ClassStyle};
pub use command::{CommandCode, CommandMapper, COMMAND_TERMINATOR};
pub use config::ArmpickConfig;
pub use control::{handle_action, Action, ActionOutcome};
pub use detect::{
    BackendRegistry, BoundingBox, ColorBackend, Detection, DetectionFilter, DetectorBackend,
    FilterOutcome, StubBackend,
};
pub use error::{ControlError, ControlErrorKind};
pub use frame::{Frame, PixelFormat};
pub use link::{
    BaudRate, CommandTransport, LinkSnapshot, LinkStatus, MemoryTransport, RecordedWrites,
    RobotLink, RobotLinkConfig, SerialTransport,
};
pub use session::{DetectionCycle, Session};
