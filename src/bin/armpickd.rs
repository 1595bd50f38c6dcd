//! armpickd - operator console for the pick/sort controller
//!
//! This binary is presentation only:
//! 1. Loads configuration and opens the session (camera, detectors, link)
//! 2. Reads typed operator commands from stdin
//! 3. Maps each line onto a pipeline action and prints the outcome
//! 4. Saves the annotated snapshot of the latest detection cycle
//!
//! All decision logic lives in the library; a malformed line never reaches
//! the pipeline.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use armpick::{handle_action, Action, ArmpickConfig, BaudRate, Session};

#[derive(Parser, Debug)]
#[command(name = "armpickd", about = "Vision-guided pick/sort operator console")]
struct Args {
    /// Config file path.
    #[arg(long, env = "ARMPICK_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = ArmpickConfig::load_from(args.config.as_deref())?;
    let mut session = Session::open(&cfg)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            eprintln!();
        })?;
    }

    log::info!(
        "armpickd running. camera={} detector={} port={} baud={}",
        cfg.camera.device,
        cfg.detector_backend,
        cfg.link.port,
        cfg.link.baud
    );
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while running.load(Ordering::SeqCst) {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            continue;
        };

        let action = match verb {
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            "status" => {
                let snapshot = session.link().snapshot();
                println!(
                    "ready: {}  status: {}",
                    if snapshot.connected { "yes" } else { "no" },
                    snapshot.status
                );
                continue;
            }
            "connect" => {
                let port = parts.next().unwrap_or(&cfg.link.port).to_string();
                let baud = match parts.next() {
                    Some(raw) => match raw.parse::<BaudRate>() {
                        Ok(baud) => baud,
                        Err(err) => {
                            println!("error: {}", err);
                            continue;
                        }
                    },
                    None => cfg.link.baud,
                };
                Action::Connect { port, baud }
            }
            "detect" => Action::StartDetection,
            "send" => Action::Send,
            "manual" => Action::ManualSend {
                code: parts.collect::<Vec<_>>().join(" "),
            },
            other => {
                println!("unknown command '{}'; try 'help'", other);
                continue;
            }
        };

        let was_detection = matches!(action, Action::StartDetection);
        match handle_action(&mut session, action) {
            Ok(outcome) => {
                println!("{}", outcome.message);
                println!(
                    "ready: {}  status: {}  send {}",
                    if outcome.link.connected { "yes" } else { "no" },
                    outcome.link.status,
                    if outcome.can_send { "enabled" } else { "disabled" }
                );
                if was_detection {
                    save_snapshot(&session, &cfg.display.snapshot_path);
                }
            }
            Err(err) => println!("error: {:#}", err),
        }
    }

    session.close();
    log::info!("armpickd stopped");
    Ok(())
}

fn save_snapshot(session: &Session, path: &std::path::Path) {
    let Some(cycle) = session.last_cycle() else {
        return;
    };
    match cycle.annotated.image.save(path) {
        Ok(()) => log::info!("snapshot written to {}", path.display()),
        Err(err) => log::warn!("snapshot save failed: {}", err),
    }
}

fn print_help() {
    println!("commands:");
    println!("  connect [port] [baud]   open the robot link");
    println!("  detect                  run one detection cycle");
    println!("  send                    send the command for the last detection");
    println!("  manual <code>           send a code verbatim");
    println!("  status                  show link state");
    println!("  quit                    close the link and exit");
}
