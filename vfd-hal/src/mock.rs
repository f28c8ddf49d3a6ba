//! Recording bus double
//!
//! Stands in for the physical bus in tests and simulated-display runs.
//! Clones share one write log, so a test can hand the bus to an adapter and
//! keep a handle for inspecting what went over the wire.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::i2c::Bus;

/// One recorded write transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusWrite {
    pub address: u8,
    pub register: u8,
    pub payload: Vec<u8>,
}

/// In-memory bus with a configurable set of responding devices
#[derive(Clone)]
pub struct MockBus {
    log: Arc<Mutex<Vec<BusWrite>>>,
    devices: Arc<Vec<u8>>,
    failing: Arc<AtomicBool>,
}

impl MockBus {
    /// Bus with a single device at the conventional display address 0x3C
    pub fn new() -> Self {
        Self::with_devices(&[0x3C])
    }

    /// Bus with devices acknowledging at the given addresses
    pub fn with_devices(addresses: &[u8]) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            devices: Arc::new(addresses.to_vec()),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent operation fail with an I/O error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of every write so far, oldest first
    pub fn writes(&self) -> Vec<BusWrite> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Concatenated payloads written to `address` with the given register
    /// prefix (0x00 = commands, 0x40 = data), in wire order
    pub fn stream(&self, address: u8, register: u8) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter(|w| w.address == address && w.register == register)
            .flat_map(|w| w.payload)
            .collect()
    }

    /// Forget everything recorded so far
    pub fn clear_log(&self) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn check(&self, address: u8) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::other("mock bus failure"));
        }
        if self.devices.contains(&address) {
            Ok(())
        } else {
            // Linux reports an unacknowledged address as ENXIO
            Err(io::Error::from_raw_os_error(libc::ENXIO))
        }
    }

    fn record(&self, address: u8, register: u8, payload: Vec<u8>) {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(BusWrite {
                address,
                register,
                payload,
            });
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for MockBus {
    fn read_byte(&mut self, address: u8) -> io::Result<u8> {
        self.check(address)?;
        Ok(0x00)
    }

    fn write_byte_data(&mut self, address: u8, register: u8, value: u8) -> io::Result<()> {
        self.check(address)?;
        self.record(address, register, vec![value]);
        Ok(())
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> io::Result<()> {
        self.check(address)?;
        self.record(address, register, data.to_vec());
        Ok(())
    }
}
