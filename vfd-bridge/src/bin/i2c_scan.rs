//! I2C bus scanner
//!
//! Probes addresses 3-127 sequentially and prints responders in hex. A
//! short settle delay between probes keeps slow peripherals happy. Errors
//! are logged, never fatal: the tool always exits 0.

use std::thread::sleep;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use vfd_hal::{Bus, LinuxI2c};

/// First probed address; 0-2 are reserved
const FIRST_ADDRESS: u8 = 3;

/// Last probed 7-bit address
const LAST_ADDRESS: u8 = 127;

/// Settle delay between probes
const PROBE_DELAY: Duration = Duration::from_millis(1);

/// Scan an I2C bus for devices
#[derive(Debug, Parser)]
#[command(name = "i2c-scan", version)]
struct Args {
    /// Bus number (/dev/i2c-<N>)
    #[arg(default_value_t = 1)]
    bus: u32,
}

/// Probe every scannable address; any acknowledged read counts as present
fn scan(bus: &mut impl Bus) -> Vec<u8> {
    (FIRST_ADDRESS..=LAST_ADDRESS)
        .filter(|&address| {
            let present = bus.read_byte(address).is_ok();
            sleep(PROBE_DELAY);
            present
        })
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let path = format!("/dev/i2c-{}", args.bus);
    println!("scanning {path}...");

    let mut bus = match LinuxI2c::open(&path) {
        Ok(bus) => bus,
        Err(e) => {
            error!("cannot open {path}: {e}");
            return;
        }
    };

    let found = scan(&mut bus);
    for address in &found {
        println!("found device at 0x{address:02X}");
    }
    if found.is_empty() {
        println!("no i2c devices found");
    } else {
        println!("{} device(s) found", found.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfd_hal::MockBus;

    #[test]
    fn test_scan_reports_only_responders() {
        let mut bus = MockBus::with_devices(&[0x3C, 0x68]);
        assert_eq!(scan(&mut bus), vec![0x3C, 0x68]);
    }

    #[test]
    fn test_scan_skips_reserved_addresses() {
        // 0-2 respond but must never be probed
        let mut bus = MockBus::with_devices(&[0, 1, 2, 3, 127]);
        assert_eq!(scan(&mut bus), vec![3, 127]);
    }
}
