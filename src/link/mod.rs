//! Robot link: connection lifecycle, status, and command dispatch.
//!
//! The link owns the transport and a small state machine:
//!
//! `Disconnected` → `Connected/Idle` → `Connected/Running` → `Connected/Idle`
//! → …, with `close()` returning to `Disconnected`.
//!
//! `dispatch` writes `code + "\n"` and arms a one-shot idle-reset timer.
//! When the timer fires, status returns to `Idle` unconditionally. This is a
//! fixed optimistic timeout, not an acknowledgment protocol; nothing
//! re-checks whether the physical action finished. Each dispatch carries a
//! sequence number and the reset only applies while its sequence is still
//! the newest, so an overlapping dispatch invalidates the older pending
//! reset instead of racing it.
//!
//! State is guarded by a single mutex shared with the timer threads, so the
//! caller and a firing timer never interleave inside a transition.

mod transport;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::command::CommandCode;
use crate::error::{ControlError, ControlErrorKind};

pub use transport::{CommandTransport, MemoryTransport, RecordedWrites, SerialTransport};

/// Default idle-reset delay after a dispatch.
pub const DEFAULT_IDLE_RESET: Duration = Duration::from_millis(2000);

/// Baud rates the controller accepts. Closed set; nothing else negotiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    pub const ALL: [BaudRate; 5] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|baud| baud.as_u32() == value)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl FromStr for BaudRate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("baud rate must be a number, got '{}'", s))?;
        Self::from_u32(value).ok_or_else(|| {
            anyhow::anyhow!("unsupported baud rate {}; expected one of 9600, 19200, 38400, 57600, 115200", value)
        })
    }
}

/// Work status of the connected controller, as assumed by this side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkStatus {
    #[default]
    Idle,
    Running,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Idle => f.write_str("Idle"),
            LinkStatus::Running => f.write_str("Running"),
        }
    }
}

/// Point-in-time view of the link for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub connected: bool,
    pub status: LinkStatus,
}

#[derive(Clone, Debug)]
pub struct RobotLinkConfig {
    pub idle_reset: Duration,
}

impl Default for RobotLinkConfig {
    fn default() -> Self {
        Self {
            idle_reset: DEFAULT_IDLE_RESET,
        }
    }
}

struct LinkShared {
    transport: Option<Box<dyn CommandTransport>>,
    status: LinkStatus,
    /// Monotonic per-dispatch sequence; the idle-reset of dispatch N is a
    /// no-op once dispatch N+1 exists.
    dispatch_seq: u64,
}

pub struct RobotLink {
    shared: Arc<Mutex<LinkShared>>,
    idle_reset: Duration,
}

impl RobotLink {
    pub fn new(config: RobotLinkConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(LinkShared {
                transport: None,
                status: LinkStatus::Idle,
                dispatch_seq: 0,
            })),
            idle_reset: config.idle_reset,
        }
    }

    fn state(&self) -> MutexGuard<'_, LinkShared> {
        // State is a handful of plain fields; recover it rather than
        // propagate poisoning from a panicked timer thread.
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Open a serial transport and enter `Connected/Idle`.
    pub fn connect_serial(&mut self, port: &str, baud: BaudRate) -> Result<()> {
        let transport = SerialTransport::open(port, baud.as_u32()).map_err(|err| {
            anyhow::Error::from(ControlError::new(
                ControlErrorKind::ConnectionFailed,
                format!("{:#}", err),
            ))
        })?;
        log::info!("RobotLink: connected to {}", transport.describe());
        self.attach(Box::new(transport));
        Ok(())
    }

    /// Attach an already-open transport (tests, demos).
    pub fn attach(&mut self, transport: Box<dyn CommandTransport>) {
        let mut state = self.state();
        state.transport = Some(transport);
        state.status = LinkStatus::Idle;
    }

    pub fn connected(&self) -> bool {
        self.state().transport.is_some()
    }

    pub fn status(&self) -> LinkStatus {
        self.state().status
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        let state = self.state();
        LinkSnapshot {
            connected: state.transport.is_some(),
            status: state.status,
        }
    }

    /// Encode and write one command, then arm the idle-reset.
    ///
    /// Fails with `NotReady` (no write attempted) when disconnected. A write
    /// failure is reported as `WriteFailed` but the idle-reset is still
    /// armed, so displayed status recovers the same way it does on success.
    pub fn dispatch(&self, code: &CommandCode) -> Result<()> {
        let wire = code.to_wire();

        let (write_result, seq) = {
            let mut state = self.state();
            let Some(transport) = state.transport.as_mut() else {
                return Err(ControlError::new(
                    ControlErrorKind::NotReady,
                    "dispatch attempted before connect",
                )
                .into());
            };
            let write_result = transport.write_command(&wire);
            state.status = LinkStatus::Running;
            state.dispatch_seq += 1;
            (write_result, state.dispatch_seq)
        };

        self.arm_idle_reset(seq);

        match write_result {
            Ok(()) => {
                log::info!("RobotLink: dispatched {}", code);
                Ok(())
            }
            Err(err) => Err(ControlError::new(
                ControlErrorKind::WriteFailed,
                format!("dispatch {}: {:#}", code, err),
            )
            .into()),
        }
    }

    fn arm_idle_reset(&self, seq: u64) {
        let shared = Arc::clone(&self.shared);
        let delay = self.idle_reset;
        thread::spawn(move || {
            thread::sleep(delay);
            let mut state = match shared.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if state.dispatch_seq == seq {
                state.status = LinkStatus::Idle;
            }
        });
    }

    /// Release the transport and return to `Disconnected`. Idempotent.
    pub fn close(&mut self) {
        let mut state = self.state();
        if let Some(transport) = state.transport.take() {
            log::info!("RobotLink: closed {}", transport.describe());
        }
        state.status = LinkStatus::Idle;
    }
}

impl Drop for RobotLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_with_reset(ms: u64) -> RobotLink {
        RobotLink::new(RobotLinkConfig {
            idle_reset: Duration::from_millis(ms),
        })
    }

    fn code(s: &str) -> CommandCode {
        CommandCode::new(s).unwrap()
    }

    #[test]
    fn dispatch_before_connect_fails_not_ready_without_writing() {
        let transport = MemoryTransport::new();
        let writes = transport.writes();

        // Transport exists but was never attached.
        let link = link_with_reset(50);
        let err = link.dispatch(&code("P1")).unwrap_err();

        assert_eq!(ControlError::kind_of(&err), Some(ControlErrorKind::NotReady));
        assert!(writes.is_empty());
        assert_eq!(link.status(), LinkStatus::Idle);
    }

    #[test]
    fn dispatch_writes_wire_bytes_and_resets_to_idle() {
        let transport = MemoryTransport::new();
        let writes = transport.writes();

        let mut link = link_with_reset(60);
        link.attach(Box::new(transport));
        assert!(link.connected());

        link.dispatch(&code("P2")).unwrap();
        assert_eq!(link.status(), LinkStatus::Running);
        assert_eq!(writes.last().unwrap(), b"P2\n");

        thread::sleep(Duration::from_millis(200));
        assert_eq!(link.status(), LinkStatus::Idle);
        assert!(link.connected());
    }

    #[test]
    fn newer_dispatch_invalidates_older_idle_reset() {
        let transport = MemoryTransport::new();
        let mut link = link_with_reset(200);
        link.attach(Box::new(transport));

        link.dispatch(&code("P1")).unwrap();
        thread::sleep(Duration::from_millis(120));
        link.dispatch(&code("P3")).unwrap();

        // t≈280: the first reset (due at 200) must not have applied; the
        // second (due at 320) has not fired yet.
        thread::sleep(Duration::from_millis(160));
        assert_eq!(link.status(), LinkStatus::Running);

        thread::sleep(Duration::from_millis(160));
        assert_eq!(link.status(), LinkStatus::Idle);
    }

    #[test]
    fn write_failure_is_reported_and_still_resets() {
        let mut link = link_with_reset(60);
        link.attach(Box::new(MemoryTransport::failing()));

        let err = link.dispatch(&code("P1")).unwrap_err();
        assert_eq!(
            ControlError::kind_of(&err),
            Some(ControlErrorKind::WriteFailed)
        );
        assert_eq!(link.status(), LinkStatus::Running);

        thread::sleep(Duration::from_millis(200));
        assert_eq!(link.status(), LinkStatus::Idle);
    }

    #[test]
    fn close_is_idempotent() {
        let mut link = link_with_reset(50);
        link.attach(Box::new(MemoryTransport::new()));
        assert!(link.connected());

        link.close();
        assert!(!link.connected());
        assert_eq!(link.status(), LinkStatus::Idle);

        link.close();
        assert!(!link.connected());
        assert_eq!(link.status(), LinkStatus::Idle);
    }

    #[test]
    fn baud_rates_are_a_closed_set() {
        assert_eq!("115200".parse::<BaudRate>().unwrap(), BaudRate::B115200);
        assert_eq!(BaudRate::from_u32(19200), Some(BaudRate::B19200));
        assert!(BaudRate::from_u32(14400).is_none());
        assert!("fast".parse::<BaudRate>().is_err());
    }
}
