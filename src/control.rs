//! Action routing.
//!
//! Operator intents are an explicit enum with typed inputs, routed through
//! one handler per action. The handlers contain the orchestration described
//! by the pipeline design; they know nothing about how outcomes are rendered,
//! and the presentation layer knows nothing about the pipeline.

use anyhow::Result;

use crate::capture::CaptureError;
use crate::command::CommandCode;
use crate::error::{ControlError, ControlErrorKind};
use crate::link::{BaudRate, LinkSnapshot};
use crate::session::{DetectionCycle, Session};

/// One operator intent.
#[derive(Clone, Debug)]
pub enum Action {
    /// Run exactly one capture → detect → filter → annotate cycle.
    StartDetection,
    /// Map the last primary detection to a command and dispatch it.
    Send,
    /// Dispatch an operator-typed code verbatim, bypassing detection.
    ManualSend { code: String },
    /// Open the transport.
    Connect { port: String, baud: BaudRate },
}

/// What the presentation layer needs after an action.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    /// Operator-facing result line.
    pub message: String,
    /// Whether a send is currently possible (a primary detection exists).
    pub can_send: bool,
    /// Link state for the readiness/status displays.
    pub link: LinkSnapshot,
}

/// Route an action to its handler.
pub fn handle_action(session: &mut Session, action: Action) -> Result<ActionOutcome> {
    match action {
        Action::StartDetection => handle_start_detection(session),
        Action::Send => handle_send(session),
        Action::ManualSend { code } => handle_manual_send(session, &code),
        Action::Connect { port, baud } => handle_connect(session, &port, baud),
    }
}

/// Run one single-shot detection cycle and cache its result.
///
/// The previous cycle is discarded before anything else happens, so a failed
/// acquisition leaves no stale primary behind for "send" to act on.
pub fn handle_start_detection(session: &mut Session) -> Result<ActionOutcome> {
    session.last_cycle = None;

    let frame = session.camera.acquire().map_err(|err| {
        let kind = ControlErrorKind::DeviceUnavailable;
        let message = match &err {
            CaptureError::NoDevice(device) => format!("camera {} is not available", device),
            CaptureError::ReadFailed(detail) => format!("frame acquisition failed: {}", detail),
        };
        anyhow::Error::from(ControlError::new(kind, message))
    })?;

    let raw = session
        .detectors
        .detect(frame.pixels(), frame.width(), frame.height())?;
    log::debug!("detector returned {} boxes", raw.len());

    let outcome = session.filter.apply(raw);
    let annotated = session
        .annotator
        .render(&frame, &outcome.retained, &session.catalog)?;

    let summary = match &outcome.primary {
        Some(det) => format!(
            "Detected: {} (conf: {:.2})",
            session.catalog.display_name(det.class_id),
            det.confidence
        ),
        None => "No object detected".to_string(),
    };
    log::info!(
        "detection cycle: {} retained, primary={:?}",
        outcome.retained.len(),
        outcome.primary.as_ref().map(|d| d.class_id)
    );

    let can_send = outcome.found();
    session.last_cycle = Some(DetectionCycle {
        retained: outcome.retained,
        primary: outcome.primary,
        summary: summary.clone(),
        annotated,
    });

    Ok(ActionOutcome {
        message: summary,
        can_send,
        link: session.link.snapshot(),
    })
}

/// Map the cached primary detection to a command and dispatch it.
pub fn handle_send(session: &mut Session) -> Result<ActionOutcome> {
    if !session.link.connected() {
        return Err(ControlError::new(
            ControlErrorKind::NotReady,
            "robot link is not connected",
        )
        .into());
    }

    let primary = session
        .last_cycle
        .as_ref()
        .and_then(|cycle| cycle.primary.as_ref())
        .ok_or_else(|| {
            anyhow::Error::from(ControlError::new(
                ControlErrorKind::NoDetection,
                "no qualifying detection from the last cycle",
            ))
        })?;

    let code = session.mapper.map(primary.class_id)?;
    session.link.dispatch(&code)?;

    Ok(ActionOutcome {
        message: format!("command {} sent to robot", code),
        can_send: true,
        link: session.link.snapshot(),
    })
}

/// Dispatch an operator-typed code verbatim.
pub fn handle_manual_send(session: &mut Session, raw_code: &str) -> Result<ActionOutcome> {
    let code = CommandCode::new(raw_code)?;

    if !session.link.connected() {
        return Err(ControlError::new(
            ControlErrorKind::NotReady,
            "robot link is not connected",
        )
        .into());
    }

    session.link.dispatch(&code)?;

    Ok(ActionOutcome {
        message: format!("command {} sent to robot", code),
        can_send: session
            .last_cycle
            .as_ref()
            .is_some_and(|cycle| cycle.primary.is_some()),
        link: session.link.snapshot(),
    })
}

/// Open the serial transport.
pub fn handle_connect(session: &mut Session, port: &str, baud: BaudRate) -> Result<ActionOutcome> {
    crate::config::validate_port_name(port)?;
    session.link.connect_serial(port, baud)?;

    Ok(ActionOutcome {
        message: format!("connected to {} @ {}", port, baud),
        can_send: session
            .last_cycle
            .as_ref()
            .is_some_and(|cycle| cycle.primary.is_some()),
        link: session.link.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{Annotator, AnnotatorConfig};
    use crate::capture::{CameraConfig, CameraSource};
    use crate::catalog::{AllowList, ClassCatalog};
    use crate::command::CommandMapper;
    use crate::detect::{
        BackendRegistry, BoundingBox, Detection, DetectionFilter, StubBackend,
    };
    use crate::link::{MemoryTransport, RobotLink, RobotLinkConfig};
    use std::time::Duration;

    fn det(class_id: u32, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(10.0, 10.0, 50.0, 50.0),
            class_id,
            confidence,
        }
    }

    fn session_with_script(script: Vec<Vec<Detection>>) -> Session {
        let camera = CameraSource::open(CameraConfig {
            device: "stub://empty".to_string(),
            width: 64,
            height: 48,
        });
        let mut detectors = BackendRegistry::new();
        detectors.register(StubBackend::new(script));
        let annotator = Annotator::new(AnnotatorConfig {
            target_width: 128,
            target_height: 96,
            corner_radius: 8,
            font_path: None,
        });
        let link = RobotLink::new(RobotLinkConfig {
            idle_reset: Duration::from_millis(40),
        });
        Session::with_parts(
            camera,
            detectors,
            ClassCatalog::fruit(),
            DetectionFilter::new(AllowList::default()),
            annotator,
            CommandMapper::default(),
            link,
        )
    }

    #[test]
    fn detection_cycle_selects_first_allowlisted_and_enables_send() {
        let mut session = session_with_script(vec![vec![det(1, 0.99), det(2, 0.9)]]);

        let outcome = handle_action(&mut session, Action::StartDetection).unwrap();
        assert!(outcome.can_send);
        assert_eq!(outcome.message, "Detected: Buah_Kuning (conf: 0.90)");

        let cycle = session.last_cycle().unwrap();
        assert_eq!(cycle.primary.as_ref().unwrap().class_id, 2);
        assert_eq!(cycle.retained.len(), 1);
        assert!(cycle.annotated.found);
    }

    #[test]
    fn send_without_connection_is_not_ready() {
        let mut session = session_with_script(vec![vec![det(2, 0.9)]]);
        handle_action(&mut session, Action::StartDetection).unwrap();

        let err = handle_action(&mut session, Action::Send).unwrap_err();
        assert_eq!(ControlError::kind_of(&err), Some(ControlErrorKind::NotReady));
    }

    #[test]
    fn send_without_detection_is_no_detection() {
        let mut session = session_with_script(vec![vec![]]);
        session.link.attach(Box::new(MemoryTransport::new()));

        let outcome = handle_action(&mut session, Action::StartDetection).unwrap();
        assert!(!outcome.can_send);
        assert_eq!(outcome.message, "No object detected");

        let err = handle_action(&mut session, Action::Send).unwrap_err();
        assert_eq!(
            ControlError::kind_of(&err),
            Some(ControlErrorKind::NoDetection)
        );
    }

    #[test]
    fn send_with_unmapped_class_is_unrecognized_and_writes_nothing() {
        // Class 1 is not allowlisted, so force an unmapped-but-allowlisted
        // setup: allow class 1 explicitly.
        let camera = CameraSource::open(CameraConfig {
            device: "stub://empty".to_string(),
            width: 64,
            height: 48,
        });
        let mut detectors = BackendRegistry::new();
        detectors.register(StubBackend::new(vec![vec![det(1, 0.8)]]));
        let transport = MemoryTransport::new();
        let writes = transport.writes();
        let mut link = RobotLink::new(RobotLinkConfig {
            idle_reset: Duration::from_millis(40),
        });
        link.attach(Box::new(transport));
        let mut session = Session::with_parts(
            camera,
            detectors,
            ClassCatalog::fruit(),
            DetectionFilter::new(AllowList::new([0, 1, 2, 3])),
            Annotator::new(AnnotatorConfig::default()),
            CommandMapper::default(),
            link,
        );

        handle_action(&mut session, Action::StartDetection).unwrap();
        let err = handle_action(&mut session, Action::Send).unwrap_err();

        assert_eq!(
            ControlError::kind_of(&err),
            Some(ControlErrorKind::Unrecognized)
        );
        assert!(writes.is_empty());
    }

    #[test]
    fn manual_send_requires_nonempty_code_and_connection() {
        let mut session = session_with_script(vec![]);

        let empty = handle_action(
            &mut session,
            Action::ManualSend {
                code: "   ".to_string(),
            },
        );
        assert!(empty.is_err());

        let err = handle_action(
            &mut session,
            Action::ManualSend {
                code: "j0".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(ControlError::kind_of(&err), Some(ControlErrorKind::NotReady));
    }

    #[test]
    fn manual_send_writes_verbatim_code() {
        let mut session = session_with_script(vec![]);
        let transport = MemoryTransport::new();
        let writes = transport.writes();
        session.link.attach(Box::new(transport));

        let outcome = handle_action(
            &mut session,
            Action::ManualSend {
                code: "j0".to_string(),
            },
        )
        .unwrap();

        assert_eq!(writes.last().unwrap(), b"j0\n");
        assert_eq!(outcome.message, "command j0 sent to robot");
    }

    #[test]
    fn new_cycle_discards_previous_primary() {
        let mut session = session_with_script(vec![vec![det(2, 0.9)], vec![]]);
        session.link.attach(Box::new(MemoryTransport::new()));

        let first = handle_action(&mut session, Action::StartDetection).unwrap();
        assert!(first.can_send);

        let second = handle_action(&mut session, Action::StartDetection).unwrap();
        assert!(!second.can_send);

        let err = handle_action(&mut session, Action::Send).unwrap_err();
        assert_eq!(
            ControlError::kind_of(&err),
            Some(ControlErrorKind::NoDetection)
        );
    }
}
