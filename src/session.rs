//! Explicit session state.
//!
//! The session replaces the ambient globals of a typical GUI controller: the
//! camera, detector registry, catalog, filter, annotator, command mapper,
//! link, and the cached result of the most recent detection cycle all live
//! here, owned by whoever drives the actions. Components never reach for
//! shared state; they receive what they need from the session.

use anyhow::{Context, Result};

use crate::annotate::{Annotated, Annotator, AnnotatorConfig};
use crate::capture::{CameraConfig, CameraSource};
use crate::catalog::{AllowList, ClassCatalog};
use crate::command::CommandMapper;
use crate::config::ArmpickConfig;
use crate::detect::{BackendRegistry, ColorBackend, Detection, DetectionFilter};
use crate::link::{RobotLink, RobotLinkConfig};

/// Everything one detection trigger produced.
///
/// Recomputed on every trigger and discarded at the start of the next cycle;
/// the primary detection here is the only thing a later "send" may act on.
pub struct DetectionCycle {
    /// Allowlist survivors in emission order (drawn on the display image).
    pub retained: Vec<Detection>,
    /// The detection eligible to drive a command, if any.
    pub primary: Option<Detection>,
    /// Operator-facing summary line.
    pub summary: String,
    /// Display image for the presentation layer.
    pub annotated: Annotated,
}

pub struct Session {
    pub(crate) camera: CameraSource,
    pub(crate) detectors: BackendRegistry,
    pub(crate) catalog: ClassCatalog,
    pub(crate) filter: DetectionFilter,
    pub(crate) annotator: Annotator,
    pub(crate) mapper: CommandMapper,
    pub(crate) link: RobotLink,
    pub(crate) last_cycle: Option<DetectionCycle>,
}

impl Session {
    /// Build a session from configuration: open the camera (open-once),
    /// register detector backends, and prepare a disconnected link.
    pub fn open(config: &ArmpickConfig) -> Result<Self> {
        let camera = CameraSource::open(CameraConfig {
            device: config.camera.device.clone(),
            width: config.camera.width,
            height: config.camera.height,
        });

        let mut detectors = BackendRegistry::new();
        detectors.register(ColorBackend::new());
        detectors
            .set_default(&config.detector_backend)
            .with_context(|| {
                format!(
                    "detector backend '{}' is not available (have: {})",
                    config.detector_backend,
                    detectors.list().join(", ")
                )
            })?;

        let annotator = Annotator::new(AnnotatorConfig {
            target_width: config.display.width,
            target_height: config.display.height,
            corner_radius: config.display.corner_radius,
            font_path: config.display.font_path.clone(),
        });

        let link = RobotLink::new(RobotLinkConfig {
            idle_reset: config.link.idle_reset,
        });

        log::info!(
            "session opened: camera={} ({}x{}), detector={}",
            config.camera.device,
            config.camera.width,
            config.camera.height,
            config.detector_backend
        );

        Ok(Self {
            camera,
            detectors,
            catalog: ClassCatalog::fruit(),
            filter: DetectionFilter::new(AllowList::default()),
            annotator,
            mapper: CommandMapper::default(),
            link,
            last_cycle: None,
        })
    }

    /// Assemble a session from explicit parts. Used by tests to substitute
    /// scripted detectors and in-memory transports.
    #[allow(clippy::too_many_arguments)]
    pub fn with_parts(
        camera: CameraSource,
        detectors: BackendRegistry,
        catalog: ClassCatalog,
        filter: DetectionFilter,
        annotator: Annotator,
        mapper: CommandMapper,
        link: RobotLink,
    ) -> Self {
        Self {
            camera,
            detectors,
            catalog,
            filter,
            annotator,
            mapper,
            link,
            last_cycle: None,
        }
    }

    /// The most recent detection cycle, if one has run.
    pub fn last_cycle(&self) -> Option<&DetectionCycle> {
        self.last_cycle.as_ref()
    }

    pub fn link(&self) -> &RobotLink {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut RobotLink {
        &mut self.link
    }

    /// Release the transport. Called on shutdown; idempotent.
    pub fn close(&mut self) {
        self.link.close();
    }
}
