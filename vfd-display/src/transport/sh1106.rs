//! SH1106 transport adapter
//!
//! 128x64 panels on the SH1106 controller. The controller RAM is 132
//! columns wide; 128-column panels sit at a 2-column offset, and there is
//! no windowed addressing mode - every present walks the pages explicitly.

use tracing::debug;
use vfd_hal::Bus;

use crate::framebuffer::{DisplayGeometry, Framebuffer};
use crate::transport::{
    contrast_from_level, Transport, TransportError, BLOCK_LEN, CONTROL_COMMAND, CONTROL_DATA,
};

/// Column offset of a 128-column panel within the 132-column RAM
const COLUMN_OFFSET: u8 = 2;

/// SH1106 command set
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
}

/// SH1106 adapter over any [`Bus`]
pub struct Sh1106<B> {
    bus: B,
    address: u8,
    ready: bool,
}

impl<B: Bus> Sh1106<B> {
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            ready: false,
        }
    }

    fn command(&mut self, command: u8) -> Result<(), TransportError> {
        self.bus
            .write_byte_data(self.address, CONTROL_COMMAND, command)?;
        Ok(())
    }

    fn data(&mut self, data: &[u8]) -> Result<(), TransportError> {
        for chunk in data.chunks(BLOCK_LEN) {
            self.bus.write_block(self.address, CONTROL_DATA, chunk)?;
        }
        Ok(())
    }
}

impl<B: Bus + Send> Transport for Sh1106<B> {
    fn open(&mut self) -> Result<(), TransportError> {
        // Presence probe before any command traffic
        self.bus
            .read_byte(self.address)
            .map_err(|_| TransportError::NoAck {
                address: self.address,
            })?;

        // Documented init order; fixed constants, never computed
        let init: &[u8] = &[
            cmd::DISPLAY_OFF,
            cmd::SET_CLOCK_DIV,
            0x80,
            cmd::SET_MUX_RATIO,
            0x3F,
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE,
            cmd::SET_CHARGE_PUMP,
            0x14,
            cmd::SET_SEG_REMAP,
            cmd::SET_COM_SCAN_DEC,
            cmd::SET_COM_PINS,
            0x12,
            cmd::SET_CONTRAST,
            0xCF,
            cmd::SET_PRECHARGE,
            0xF1,
            cmd::SET_VCOM_DETECT,
            0x40,
            cmd::SET_NORMAL,
            cmd::DISPLAY_ON,
        ];
        for &c in init {
            self.command(c)?;
        }

        self.ready = true;
        debug!(address = self.address, "sh1106 initialized");
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.ready {
            self.command(cmd::DISPLAY_OFF)?;
            self.ready = false;
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn geometry(&self) -> DisplayGeometry {
        DisplayGeometry::Panel128x64
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::NotReady);
        }
        self.command(cmd::SET_CONTRAST)?;
        self.command(contrast_from_level(level))
    }

    fn set_power(&mut self, on: bool) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::NotReady);
        }
        self.command(if on { cmd::DISPLAY_ON } else { cmd::DISPLAY_OFF })
    }

    fn present(&mut self, framebuffer: &Framebuffer) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::NotReady);
        }
        for page in 0..framebuffer.pages() {
            self.command(cmd::SET_PAGE_ADDR | page as u8)?;
            self.command(cmd::SET_LOW_COLUMN | (COLUMN_OFFSET & 0x0F))?;
            self.command(cmd::SET_HIGH_COLUMN | (COLUMN_OFFSET >> 4))?;
            self.data(framebuffer.page(page))?;
        }
        Ok(())
    }
}
