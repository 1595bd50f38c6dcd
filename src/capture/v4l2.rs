//! V4L2 camera backend (feature: `capture-v4l2`).
//!
//! Opens a local device node once, negotiates RGB3 at the preferred size, and
//! reads one mmap'd buffer per [`V4l2Camera::acquire`]. The mmap stream
//! borrows the device, so both live together in a self-referencing state
//! struct.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use crate::frame::{Frame, PixelFormat};

use super::{CameraConfig, CaptureError};

pub struct V4l2Camera {
    state: CameraState,
    active_width: u32,
    active_height: u32,
    frame_count: u64,
}

#[self_referencing]
struct CameraState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Camera {
    /// Open the device and start the capture stream. Called once at startup;
    /// a failure here is latched by the caller and never retried.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&config.device)
            .with_context(|| format!("open v4l2 device {}", config.device))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("V4l2Camera: set format on {} failed: {}", config.device, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        let state = CameraStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Camera: opened {} ({}x{})",
            config.device,
            format.width,
            format.height
        );

        Ok(Self {
            state,
            active_width: format.width,
            active_height: format.height,
            frame_count: 0,
        })
    }

    pub fn acquire(&mut self) -> Result<Frame, CaptureError> {
        use v4l::io::traits::CaptureStream;

        let (buf, _meta) = self
            .state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| CaptureError::ReadFailed(err.to_string()))?;

        self.frame_count += 1;

        Frame::from_raw(
            buf.to_vec(),
            self.active_width,
            self.active_height,
            PixelFormat::Rgb8,
        )
        .ok_or_else(|| {
            CaptureError::ReadFailed(format!(
                "device returned {} bytes for {}x{} rgb",
                buf.len(),
                self.active_width,
                self.active_height
            ))
        })
    }
}
