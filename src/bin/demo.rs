//! demo - end-to-end pipeline demonstration with synthetic parts
//!
//! Runs N single-shot cycles against the synthetic fruit scene, the color
//! detector, and an in-memory transport, then prints what would have gone
//! over the wire. No camera, model, or serial hardware required.

use anyhow::Result;
use clap::Parser;

use armpick::{
    handle_action, Action, Annotator, AnnotatorConfig, BackendRegistry, CameraConfig,
    CameraSource, ClassCatalog, ColorBackend, CommandMapper, ControlError, DetectionFilter,
    MemoryTransport, RobotLink, RobotLinkConfig, Session,
};

#[derive(Parser, Debug)]
#[command(name = "demo", about = "Synthetic end-to-end pick/sort cycles")]
struct Args {
    /// Number of detection cycles to run.
    #[arg(long, default_value_t = 4)]
    cycles: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let camera = CameraSource::open(CameraConfig::default());
    let mut detectors = BackendRegistry::new();
    detectors.register(ColorBackend::new());

    let transport = MemoryTransport::new();
    let writes = transport.writes();
    let mut link = RobotLink::new(RobotLinkConfig::default());
    link.attach(Box::new(transport));

    let mut session = Session::with_parts(
        camera,
        detectors,
        ClassCatalog::fruit(),
        DetectionFilter::new(Default::default()),
        Annotator::new(AnnotatorConfig::default()),
        CommandMapper::default(),
        link,
    );

    for cycle in 1..=args.cycles {
        let outcome = handle_action(&mut session, Action::StartDetection)?;
        println!("cycle {}: {}", cycle, outcome.message);

        if !outcome.can_send {
            continue;
        }
        match handle_action(&mut session, Action::Send) {
            Ok(sent) => println!("cycle {}: {}", cycle, sent.message),
            // A reportable send failure ends the cycle, not the demo.
            Err(err) if ControlError::kind_of(&err).is_some() => {
                println!("cycle {}: {:#}", cycle, err)
            }
            Err(err) => return Err(err),
        }
    }

    println!("wire writes:");
    for bytes in writes.all() {
        print!("  {}", String::from_utf8_lossy(&bytes));
    }

    session.close();
    Ok(())
}
