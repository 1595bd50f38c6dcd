use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use armpick::config::ArmpickConfig;
use armpick::BaudRate;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ARMPICK_CONFIG",
        "ARMPICK_CAMERA_DEVICE",
        "ARMPICK_DETECTOR",
        "ARMPICK_PORT",
        "ARMPICK_BAUD",
        "ARMPICK_IDLE_RESET_MS",
        "ARMPICK_SNAPSHOT_PATH",
        "ARMPICK_FONT_PATH",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "device": "stub://empty",
            "width": 800,
            "height": 600
        },
        "display": {
            "width": 1600,
            "height": 900,
            "snapshot_path": "out/annotated.png",
            "corner_radius": 12
        },
        "detector": {
            "backend": "color"
        },
        "link": {
            "port": "/dev/ttyACM0",
            "baud": 57600,
            "idle_reset_ms": 1500
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("ARMPICK_CONFIG", file.path());
    std::env::set_var("ARMPICK_PORT", "COM4");
    std::env::set_var("ARMPICK_BAUD", "115200");

    let cfg = ArmpickConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://empty");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.display.width, 1600);
    assert_eq!(cfg.display.height, 900);
    assert_eq!(cfg.display.snapshot_path.to_str(), Some("out/annotated.png"));
    assert_eq!(cfg.display.corner_radius, 12);
    assert_eq!(cfg.detector_backend, "color");

    // Env wins over the file for port and baud.
    assert_eq!(cfg.link.port, "COM4");
    assert_eq!(cfg.link.baud, BaudRate::B115200);
    assert_eq!(cfg.link.idle_reset, Duration::from_millis(1500));

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ArmpickConfig::load().expect("load defaults");

    assert_eq!(cfg.camera.device, "stub://fruit");
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);
    assert_eq!(cfg.display.width, 1280);
    assert_eq!(cfg.display.height, 720);
    assert_eq!(cfg.detector_backend, "color");
    assert_eq!(cfg.link.port, "/dev/ttyUSB0");
    assert_eq!(cfg.link.baud, BaudRate::B9600);
    assert_eq!(cfg.link.idle_reset, Duration::from_millis(2000));
    assert_eq!(cfg.display.corner_radius, 20);
}

#[test]
fn rejects_baud_outside_the_fixed_set() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "link": { "baud": 14400 } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("ARMPICK_CONFIG", file.path());

    assert!(ArmpickConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_malformed_port_names() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ARMPICK_PORT", "ttyUSB0; rm -rf /");
    assert!(ArmpickConfig::load().is_err());

    clear_env();
}
