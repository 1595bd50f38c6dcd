//! Byte-oriented command transports.
//!
//! The link owns exactly one transport at a time. The trait is the seam
//! between the state machine and the wire: real deployments use
//! [`SerialTransport`]; tests and demos use [`MemoryTransport`], which
//! records every write for inspection.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};

/// One-way byte sink toward the physical controller.
///
/// No read or acknowledgment protocol is defined; a successful write means
/// the bytes left this process, nothing more.
pub trait CommandTransport: Send {
    /// Write one encoded command (terminator included) to the wire.
    fn write_command(&mut self, bytes: &[u8]) -> Result<()>;

    /// Human-readable endpoint description for logs.
    fn describe(&self) -> String;
}

// ----------------------------------------------------------------------------
// Serial port transport
// ----------------------------------------------------------------------------

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
    description: String,
}

impl SerialTransport {
    /// Open a serial port. Called once per connect; a failure surfaces as a
    /// connection error and is never retried automatically.
    pub fn open(port_name: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_secs(1))
            .open()
            .with_context(|| format!("open serial port {} @ {}", port_name, baud))?;
        Ok(Self {
            port,
            description: format!("serial:{}@{}", port_name, baud),
        })
    }
}

impl CommandTransport for SerialTransport {
    fn write_command(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .with_context(|| format!("write to {}", self.description))?;
        self.port
            .flush()
            .with_context(|| format!("flush {}", self.description))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

// ----------------------------------------------------------------------------
// In-memory transport (tests, demos)
// ----------------------------------------------------------------------------

/// Handle onto the writes recorded by a [`MemoryTransport`].
#[derive(Clone, Default)]
pub struct RecordedWrites(Arc<Mutex<Vec<Vec<u8>>>>);

impl RecordedWrites {
    pub fn all(&self) -> Vec<Vec<u8>> {
        self.0.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Vec<u8>> {
        self.0.lock().ok().and_then(|w| w.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.0.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transport that records writes in memory instead of touching hardware.
pub struct MemoryTransport {
    writes: RecordedWrites,
    fail_writes: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            writes: RecordedWrites::default(),
            fail_writes: false,
        }
    }

    /// A transport whose every write fails, for write-error paths.
    pub fn failing() -> Self {
        Self {
            writes: RecordedWrites::default(),
            fail_writes: true,
        }
    }

    /// Clone a handle to the recorded writes before handing the transport to
    /// the link.
    pub fn writes(&self) -> RecordedWrites {
        self.writes.clone()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTransport for MemoryTransport {
    fn write_command(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow::anyhow!("memory transport configured to fail"));
        }
        if let Ok(mut writes) = self.writes.0.lock() {
            writes.push(bytes.to_vec());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_transport_records_writes() {
        let mut transport = MemoryTransport::new();
        let writes = transport.writes();

        transport.write_command(b"P1\n").unwrap();
        transport.write_command(b"j0\n").unwrap();

        assert_eq!(writes.len(), 2);
        assert_eq!(writes.last().unwrap(), b"j0\n");
    }

    #[test]
    fn failing_transport_records_nothing() {
        let mut transport = MemoryTransport::failing();
        let writes = transport.writes();

        assert!(transport.write_command(b"P1\n").is_err());
        assert!(writes.is_empty());
    }
}
