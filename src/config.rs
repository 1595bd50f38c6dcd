use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::link::BaudRate;

const DEFAULT_CAMERA_DEVICE: &str = "stub://fruit";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_DISPLAY_WIDTH: u32 = 1280;
const DEFAULT_DISPLAY_HEIGHT: u32 = 720;
const DEFAULT_SNAPSHOT_PATH: &str = "annotated.png";
const DEFAULT_DETECTOR_BACKEND: &str = "color";
const DEFAULT_PORT: &str = "/dev/ttyUSB0";
const DEFAULT_BAUD: u32 = 9600;
const DEFAULT_IDLE_RESET_MS: u64 = 2000;
const DEFAULT_CORNER_RADIUS: u32 = 20;

#[derive(Debug, Deserialize, Default)]
struct ArmpickConfigFile {
    camera: Option<CameraConfigFile>,
    display: Option<DisplayConfigFile>,
    detector: Option<DetectorConfigFile>,
    link: Option<LinkConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    snapshot_path: Option<PathBuf>,
    font_path: Option<PathBuf>,
    corner_radius: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LinkConfigFile {
    port: Option<String>,
    baud: Option<u32>,
    idle_reset_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ArmpickConfig {
    pub camera: CameraSettings,
    pub display: DisplaySettings,
    pub detector_backend: String,
    pub link: LinkSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
    pub snapshot_path: PathBuf,
    pub font_path: Option<PathBuf>,
    pub corner_radius: u32,
}

#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub port: String,
    pub baud: BaudRate,
    pub idle_reset: Duration,
}

impl ArmpickConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ARMPICK_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load with an explicit config file path (CLI override); `None` falls
    /// back to defaults plus environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ArmpickConfigFile) -> Result<Self> {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
        };
        let display = DisplaySettings {
            width: file
                .display
                .as_ref()
                .and_then(|display| display.width)
                .unwrap_or(DEFAULT_DISPLAY_WIDTH),
            height: file
                .display
                .as_ref()
                .and_then(|display| display.height)
                .unwrap_or(DEFAULT_DISPLAY_HEIGHT),
            snapshot_path: file
                .display
                .as_ref()
                .and_then(|display| display.snapshot_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            font_path: file
                .display
                .as_ref()
                .and_then(|display| display.font_path.clone()),
            corner_radius: file
                .display
                .and_then(|display| display.corner_radius)
                .unwrap_or(DEFAULT_CORNER_RADIUS),
        };
        let detector_backend = file
            .detector
            .and_then(|detector| detector.backend)
            .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string());
        let baud = file
            .link
            .as_ref()
            .and_then(|link| link.baud)
            .unwrap_or(DEFAULT_BAUD);
        let link = LinkSettings {
            port: file
                .link
                .as_ref()
                .and_then(|link| link.port.clone())
                .unwrap_or_else(|| DEFAULT_PORT.to_string()),
            baud: BaudRate::from_u32(baud)
                .ok_or_else(|| anyhow!("unsupported baud rate {} in config file", baud))?,
            idle_reset: Duration::from_millis(
                file.link
                    .and_then(|link| link.idle_reset_ms)
                    .unwrap_or(DEFAULT_IDLE_RESET_MS),
            ),
        };
        Ok(Self {
            camera,
            display,
            detector_backend,
            link,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("ARMPICK_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(backend) = std::env::var("ARMPICK_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector_backend = backend;
            }
        }
        if let Ok(port) = std::env::var("ARMPICK_PORT") {
            if !port.trim().is_empty() {
                self.link.port = port;
            }
        }
        if let Ok(baud) = std::env::var("ARMPICK_BAUD") {
            if !baud.trim().is_empty() {
                self.link.baud = baud.parse()?;
            }
        }
        if let Ok(ms) = std::env::var("ARMPICK_IDLE_RESET_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| anyhow!("ARMPICK_IDLE_RESET_MS must be an integer millisecond count"))?;
            self.link.idle_reset = Duration::from_millis(ms);
        }
        if let Ok(path) = std::env::var("ARMPICK_SNAPSHOT_PATH") {
            if !path.trim().is_empty() {
                self.display.snapshot_path = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("ARMPICK_FONT_PATH") {
            if !path.trim().is_empty() {
                self.display.font_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        validate_port_name(&self.link.port)?;

        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera dimensions must be greater than zero"));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(anyhow!("display dimensions must be greater than zero"));
        }
        if self.link.idle_reset.as_millis() == 0 {
            return Err(anyhow!("idle reset duration must be greater than zero"));
        }
        Ok(())
    }
}

/// A port name is either a device node path or a Windows COM name.
///
/// Allowed: "/dev/ttyUSB0", "/dev/serial/by-id/usb-arduino", "COM3"
/// Disallowed: whitespace, shell metacharacters, empty strings.
pub fn validate_port_name(port: &str) -> Result<()> {
    static PORT_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = PORT_RE.get_or_init(|| {
        regex::Regex::new(r"^(/dev/[A-Za-z0-9._/\-]{1,128}|COM[0-9]{1,3})$").unwrap()
    });

    if !re.is_match(port) {
        return Err(anyhow!(
            "port name '{}' must be a /dev/ path or COM<n>",
            port
        ));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<ArmpickConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_name_pattern() {
        assert!(validate_port_name("/dev/ttyUSB0").is_ok());
        assert!(validate_port_name("/dev/serial/by-id/usb-arduino_uno").is_ok());
        assert!(validate_port_name("COM3").is_ok());

        assert!(validate_port_name("").is_err());
        assert!(validate_port_name("ttyUSB0").is_err());
        assert!(validate_port_name("/dev/tty USB0").is_err());
        assert!(validate_port_name("COM").is_err());
    }
}
