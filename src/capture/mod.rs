//! Frame acquisition.
//!
//! One [`CameraSource`] is opened per session, at startup, and produces a
//! single [`Frame`] per explicit trigger; there is no streaming loop in the
//! core. Backends:
//! - `stub://<scene>` synthetic scenes (tests, demos, benches)
//! - local V4L2 devices (feature: `capture-v4l2`)
//!
//! Open-once semantics: if the device cannot be opened at startup the failure
//! is latched, and every later [`CameraSource::acquire`] reports `NoDevice`
//! without attempting a reopen. A failed acquisition is reported to the
//! caller and never retried automatically; the previously displayed frame is
//! left for the presentation layer to keep showing.

mod synthetic;
#[cfg(feature = "capture-v4l2")]
mod v4l2;

use std::fmt;

use crate::frame::Frame;

pub use synthetic::SyntheticCamera;
#[cfg(feature = "capture-v4l2")]
pub use v4l2::V4l2Camera;

/// Why an acquisition failed.
#[derive(Clone, Debug)]
pub enum CaptureError {
    /// The device was never opened (or does not exist); latched at startup.
    NoDevice(String),
    /// The device is open but reading a frame failed.
    ReadFailed(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoDevice(device) => write!(f, "camera device {} unavailable", device),
            CaptureError::ReadFailed(message) => write!(f, "frame read failed: {}", message),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (`/dev/video0`) or synthetic scene (`stub://fruit`).
    pub device: String,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://fruit".to_string(),
            width: 640,
            height: 480,
        }
    }
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "capture-v4l2")]
    Device(V4l2Camera),
}

/// Single-shot frame source with open-once semantics.
pub struct CameraSource {
    device: String,
    backend: Option<CameraBackend>,
}

impl CameraSource {
    /// Open the configured device. A failure is logged and latched; the
    /// source is still returned so the rest of the session can start, and
    /// acquisitions will fail with `NoDevice`.
    pub fn open(config: CameraConfig) -> Self {
        let device = config.device.clone();
        let backend = Self::open_backend(config);
        if backend.is_none() {
            log::warn!("CameraSource: {} unavailable, acquisitions will fail", device);
        }
        Self { device, backend }
    }

    fn open_backend(config: CameraConfig) -> Option<CameraBackend> {
        if let Some(scene) = config.device.strip_prefix("stub://") {
            let scene = scene.to_string();
            return Some(CameraBackend::Synthetic(SyntheticCamera::new(
                scene,
                config.width,
                config.height,
            )));
        }

        #[cfg(feature = "capture-v4l2")]
        {
            match V4l2Camera::open(&config) {
                Ok(camera) => return Some(CameraBackend::Device(camera)),
                Err(err) => {
                    log::error!("CameraSource: open {} failed: {}", config.device, err);
                    return None;
                }
            }
        }

        #[cfg(not(feature = "capture-v4l2"))]
        {
            log::error!(
                "CameraSource: {} is not a stub:// scene and v4l2 support is not compiled in",
                config.device
            );
            None
        }
    }

    /// Whether the device opened successfully at startup.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Acquire exactly one frame.
    pub fn acquire(&mut self) -> Result<Frame, CaptureError> {
        match &mut self.backend {
            None => Err(CaptureError::NoDevice(self.device.clone())),
            Some(CameraBackend::Synthetic(camera)) => camera.acquire(),
            #[cfg(feature = "capture-v4l2")]
            Some(CameraBackend::Device(camera)) => camera.acquire(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_source_produces_frames_on_demand() {
        let mut source = CameraSource::open(CameraConfig::default());
        assert!(source.is_available());

        let frame = source.acquire().expect("frame");
        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
    }

    #[cfg(not(feature = "capture-v4l2"))]
    #[test]
    fn failed_open_is_latched_and_never_retried() {
        let mut source = CameraSource::open(CameraConfig {
            device: "/dev/video99".to_string(),
            ..CameraConfig::default()
        });
        assert!(!source.is_available());

        for _ in 0..3 {
            match source.acquire() {
                Err(CaptureError::NoDevice(device)) => assert_eq!(device, "/dev/video99"),
                other => panic!("expected NoDevice, got {:?}", other.map(|_| ())),
            }
        }
    }
}
