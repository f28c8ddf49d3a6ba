//! I2C bus access
//!
//! `Bus` is the master-side interface consumed elsewhere in the workspace;
//! `LinuxI2c` implements it on top of a `/dev/i2c-*` character device.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::Path;

/// ioctl request selecting the peripheral address for subsequent transfers
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// I2C bus master
///
/// Register-oriented writes match how the display controllers are driven:
/// every transfer leads with a control byte (0x00 command / 0x40 data),
/// which maps onto the `register` argument here.
pub trait Bus {
    /// Read a single byte from the device at `address`
    ///
    /// Used for presence probing; any acknowledged read counts as "present".
    fn read_byte(&mut self, address: u8) -> io::Result<u8>;

    /// Write one `value` byte prefixed by `register`
    fn write_byte_data(&mut self, address: u8, register: u8, value: u8) -> io::Result<()>;

    /// Write a block of bytes prefixed by `register` in one transfer
    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> io::Result<()>;
}

/// Bus master over a Linux `/dev/i2c-*` character device
pub struct LinuxI2c {
    dev: File,
    /// Address currently selected via `I2C_SLAVE`, to skip redundant ioctls
    selected: Option<u8>,
}

impl LinuxI2c {
    /// Open the given I2C character device
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let dev = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "opened i2c device");
        Ok(Self {
            dev,
            selected: None,
        })
    }

    fn select(&mut self, address: u8) -> io::Result<()> {
        if self.selected == Some(address) {
            return Ok(());
        }
        let rc = unsafe { libc::ioctl(self.dev.as_raw_fd(), I2C_SLAVE, address as libc::c_ulong) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        self.selected = Some(address);
        Ok(())
    }

    fn write_all_once(&mut self, buf: &[u8]) -> io::Result<()> {
        // One write syscall per I2C transaction; a split write would show up
        // on the wire as two transactions.
        let n = self.dev.write(buf)?;
        if n != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short i2c write: {n} of {} bytes", buf.len()),
            ));
        }
        Ok(())
    }
}

impl Bus for LinuxI2c {
    fn read_byte(&mut self, address: u8) -> io::Result<u8> {
        self.select(address)?;
        let mut buf = [0u8; 1];
        self.dev.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_byte_data(&mut self, address: u8, register: u8, value: u8) -> io::Result<()> {
        self.select(address)?;
        self.write_all_once(&[register, value])
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> io::Result<()> {
        self.select(address)?;
        let mut buf = Vec::with_capacity(data.len() + 1);
        buf.push(register);
        buf.extend_from_slice(data);
        self.write_all_once(&buf)
    }
}
