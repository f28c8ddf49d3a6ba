//! SSD1306 transport adapter
//!
//! Unlike the SH1106 this controller has horizontal addressing: one window
//! preamble per present, then the whole buffer streams out in page order.
//! Supports both the 128x64 and 128x32 panels; the geometry fixes the
//! multiplex ratio and COM pin configuration.

use tracing::debug;
use vfd_hal::Bus;

use crate::framebuffer::{DisplayGeometry, Framebuffer};
use crate::transport::{
    contrast_from_level, Transport, TransportError, BLOCK_LEN, CONTROL_COMMAND, CONTROL_DATA,
};

/// SSD1306 command set
mod cmd {
    pub const MEMORY_MODE: u8 = 0x20;
    pub const COLUMN_ADDR: u8 = 0x21;
    pub const PAGE_ADDR: u8 = 0x22;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const CHARGE_PUMP: u8 = 0x8D;
    pub const SEG_REMAP: u8 = 0xA0;
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const SET_MULTIPLEX: u8 = 0xA8;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
}

/// SSD1306 adapter over any [`Bus`]
pub struct Ssd1306<B> {
    bus: B,
    address: u8,
    geometry: DisplayGeometry,
    ready: bool,
}

impl<B: Bus> Ssd1306<B> {
    pub fn new(bus: B, address: u8, geometry: DisplayGeometry) -> Self {
        Self {
            bus,
            address,
            geometry,
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

    /// Alternative COM wiring on tall panels, sequential on short ones
    fn com_pins(&self) -> u8 {
        match self.geometry {
            DisplayGeometry::Panel128x64 => 0x12,
            DisplayGeometry::Panel128x32 => 0x02,
        }
    }
}

impl<B: Bus + Send> Transport for Ssd1306<B> {
    fn open(&mut self) -> Result<(), TransportError> {
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
            cmd::SET_MULTIPLEX,
            (self.geometry.height() - 1) as u8,
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE,
            cmd::CHARGE_PUMP,
            0x14,
            cmd::MEMORY_MODE,
            0x00,
            cmd::SEG_REMAP | 0x01,
            cmd::COM_SCAN_DEC,
            cmd::SET_COM_PINS,
            self.com_pins(),
            cmd::SET_CONTRAST,
            0xCF,
            cmd::SET_PRECHARGE,
            0xF1,
            cmd::SET_VCOM_DETECT,
            0x40,
            cmd::DISPLAY_ALL_ON_RESUME,
            cmd::NORMAL_DISPLAY,
            cmd::DISPLAY_ON,
        ];
        for &c in init {
            self.command(c)?;
        }

        self.ready = true;
        debug!(address = self.address, "ssd1306 initialized");
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
        self.geometry
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
        // Full-width, full-height addressing window
        self.command(cmd::COLUMN_ADDR)?;
        self.command(0)?;
        self.command((framebuffer.width() - 1) as u8)?;
        self.command(cmd::PAGE_ADDR)?;
        self.command(0)?;
        self.command((framebuffer.pages() - 1) as u8)?;

        self.data(framebuffer.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfd_hal::MockBus;

    fn open_adapter(geometry: DisplayGeometry) -> (MockBus, Ssd1306<MockBus>) {
        let bus = MockBus::new();
        let mut adapter = Ssd1306::new(bus.clone(), 0x3C, geometry);
        adapter.open().unwrap();
        (bus, adapter)
    }

    #[test]
    fn test_init_order_and_geometry_constants() {
        let (bus, _adapter) = open_adapter(DisplayGeometry::Panel128x64);
        let commands = bus.stream(0x3C, CONTROL_COMMAND);
        assert_eq!(
            &commands[..8],
            &[
                cmd::DISPLAY_OFF,
                cmd::SET_CLOCK_DIV,
                0x80,
                cmd::SET_MULTIPLEX,
                63,
                cmd::SET_DISPLAY_OFFSET,
                0x00,
                cmd::SET_START_LINE,
            ]
        );
        let com_pins_at = commands.iter().position(|&c| c == cmd::SET_COM_PINS).unwrap();
        assert_eq!(commands[com_pins_at + 1], 0x12);
        assert_eq!(*commands.last().unwrap(), cmd::DISPLAY_ON);
    }

    #[test]
    fn test_short_panel_uses_sequential_com_pins() {
        let (bus, _adapter) = open_adapter(DisplayGeometry::Panel128x32);
        let commands = bus.stream(0x3C, CONTROL_COMMAND);
        let mux_at = commands.iter().position(|&c| c == cmd::SET_MULTIPLEX).unwrap();
        assert_eq!(commands[mux_at + 1], 31);
        let com_pins_at = commands.iter().position(|&c| c == cmd::SET_COM_PINS).unwrap();
        assert_eq!(commands[com_pins_at + 1], 0x02);
    }

    #[test]
    fn test_present_sets_window_then_streams_buffer() {
        let (bus, mut adapter) = open_adapter(DisplayGeometry::Panel128x64);
        bus.clear_log();

        let mut fb = Framebuffer::new(DisplayGeometry::Panel128x64);
        fb.set_pixel(127, 63, true);
        adapter.present(&fb).unwrap();

        assert_eq!(
            bus.stream(0x3C, CONTROL_COMMAND),
            vec![cmd::COLUMN_ADDR, 0, 127, cmd::PAGE_ADDR, 0, 7]
        );
        let data = bus.stream(0x3C, CONTROL_DATA);
        assert_eq!(data.len(), 128 * 8);
        // Pixel (127,63) is bit 7 of the last byte
        assert_eq!(*data.last().unwrap(), 0x80);
    }

    #[test]
    fn test_data_is_chunked_to_block_limit() {
        let (bus, mut adapter) = open_adapter(DisplayGeometry::Panel128x64);
        bus.clear_log();
        let fb = Framebuffer::new(DisplayGeometry::Panel128x64);
        adapter.present(&fb).unwrap();

        let blocks: Vec<usize> = bus
            .writes()
            .into_iter()
            .filter(|w| w.register == CONTROL_DATA)
            .map(|w| w.payload.len())
            .collect();
        assert_eq!(blocks.len(), 128 * 8 / BLOCK_LEN);
        assert!(blocks.iter().all(|&len| len <= BLOCK_LEN));
    }

    #[test]
    fn test_close_powers_down_and_resets_state() {
        let (bus, mut adapter) = open_adapter(DisplayGeometry::Panel128x64);
        bus.clear_log();
        adapter.close().unwrap();
        assert!(!adapter.is_ready());
        assert_eq!(bus.stream(0x3C, CONTROL_COMMAND), vec![cmd::DISPLAY_OFF]);
    }
}
