//! Display session
//!
//! The single live binding to a physical (or simulated) panel. Owns the
//! framebuffer, cursor state, glyph source and transport; created once at
//! bridge startup and never duplicated. Every mutation funnels through
//! [`DisplaySession::apply`], which the bridge serializes onto one thread.
//!
//! Error policy per operation: a failed present logs and leaves the draw
//! attempt incomplete; it never propagates out of `apply`.

use tracing::{debug, warn};

use vfd_protocol::{Command, FontProfile, Rect};

use crate::framebuffer::{DisplayGeometry, Framebuffer};
use crate::glyph::{GlyphMask, GlyphSource};
use crate::layout::{self, CursorState};
use crate::transport::{Transport, TransportError};
use crate::font;

/// The one live display binding
pub struct DisplaySession {
    transport: Box<dyn Transport>,
    glyphs: Box<dyn GlyphSource>,
    framebuffer: Framebuffer,
    cursor: CursorState,
    power_on: bool,
    brightness: u8,
}

impl DisplaySession {
    /// Open the transport and bind the session to it
    ///
    /// The one failure worth surfacing loudly: without a working transport
    /// the bridge has no purpose, so the error propagates to the caller.
    pub fn open(
        mut transport: Box<dyn Transport>,
        glyphs: Box<dyn GlyphSource>,
    ) -> Result<Self, TransportError> {
        transport.open()?;
        let geometry = transport.geometry();
        let mut session = Self {
            transport,
            glyphs,
            framebuffer: Framebuffer::new(geometry),
            cursor: CursorState::default(),
            power_on: true,
            brightness: 7,
        };
        // Start from a known state: full brightness, blank panel
        session.transport.set_brightness(7)?;
        session.transport.present(&session.framebuffer)?;
        Ok(session)
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.framebuffer.geometry()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Apply one decoded command
    ///
    /// Never panics and never returns an error: per-command failures are
    /// logged and the session stays live for the next command.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Write { text, line } => {
                self.cursor.x = 0;
                self.cursor.y = i32::from(line) * layout::line_height(self.cursor.font);
                self.write(&text);
            }
            Command::Clear => self.clear(),
            Command::PrintLines {
                lines,
                first_line,
                max_lines,
            } => {
                self.framebuffer.clear();
                let step = layout::line_height(self.cursor.font);
                self.print_lines(0, step, &lines, first_line, max_lines, self.cursor.font);
            }
            Command::PrintRows {
                rows,
                first_line,
                max_lines,
                x_offset,
            } => {
                let step = layout::line_height(self.cursor.font);
                self.print_rows(
                    0,
                    step,
                    &rows,
                    first_line,
                    max_lines,
                    i32::from(x_offset),
                    self.cursor.font,
                );
            }
            Command::DrawScrollBar {
                top,
                height,
                offset,
            } => self.draw_scroll_bar(i32::from(top), height, offset),
            Command::SetFont(font) => self.set_font(font),
            Command::SetCursor { x, y } => self.set_cursor(i32::from(x), i32::from(y)),
            Command::SetBrightness { level } => self.set_brightness(level),
            Command::SetPower { on } => self.set_power(on),
            Command::ClearArea(rect) => self.clear_area(rect),
            Command::FillArea(rect) => self.fill_area(rect),
            Command::Outline(rect) => self.outline(rect),
            Command::RawPacket { opcode, text } => {
                debug!(opcode, "raw packet rendered as text");
                self.write(&text);
            }
        }
    }

    /// Rasterize `text` at the cursor and present
    ///
    /// The cursor does not advance.
    pub fn write(&mut self, text: &str) {
        let mask = self.rasterize(text);
        self.framebuffer.blit(&mask, self.cursor.x, self.cursor.y);
        self.present();
    }

    /// Blank the framebuffer and present
    pub fn clear(&mut self) {
        self.framebuffer.clear();
        self.present();
    }

    /// Draw a window of `lines` at `y`, advancing `step` pixels per line
    pub fn print_lines(
        &mut self,
        y: i32,
        step: i32,
        lines: &[String],
        first_line: usize,
        max_lines: usize,
        font: FontProfile,
    ) {
        self.cursor.font = font;
        let range = layout::visible_range(lines.len(), first_line, max_lines);
        if range.is_empty() {
            return;
        }
        for (slot, index) in range.enumerate() {
            let mask = self.rasterize(&lines[index]);
            self.framebuffer.blit(&mask, 0, y + slot as i32 * step);
        }
        self.present();
    }

    /// Draw a window of multi-column `rows`
    ///
    /// Column widths come from one pass over the whole list, so scrolling
    /// never shifts the alignment.
    #[allow(clippy::too_many_arguments)]
    pub fn print_rows(
        &mut self,
        y: i32,
        step: i32,
        rows: &[Vec<String>],
        first_line: usize,
        max_lines: usize,
        x_offset: i32,
        font: FontProfile,
    ) {
        self.cursor.font = font;
        let range = layout::visible_range(rows.len(), first_line, max_lines);
        if range.is_empty() {
            return;
        }
        let widths = layout::column_widths(rows, font);
        for (slot, index) in range.enumerate() {
            let row_y = y + slot as i32 * step;
            let mut x = x_offset;
            for (column, cell) in rows[index].iter().enumerate() {
                let mask = self.rasterize(cell);
                self.framebuffer.blit(&mask, x, row_y);
                x += widths[column];
            }
        }
        self.present();
    }

    /// Scroll indicator in the reserved strip at the right edge
    pub fn draw_scroll_bar(&mut self, top: i32, height_fraction: f32, offset_fraction: f32) {
        let geometry = self.geometry();
        let bar = layout::scroll_bar(geometry, top, height_fraction, offset_fraction);

        self.framebuffer.fill_rect(
            bar.strip_x,
            bar.strip_top,
            geometry.width() - 1,
            geometry.height() - 1,
            false,
        );
        self.framebuffer.fill_rect(
            bar.strip_x,
            bar.bar_top,
            geometry.width() - 1,
            bar.bar_top + bar.bar_height - 1,
            true,
        );
        self.present();
    }

    pub fn set_font(&mut self, font: FontProfile) {
        self.cursor.font = font;
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor.x = x;
        self.cursor.y = y;
    }

    pub fn set_brightness(&mut self, level: u8) {
        let level = level.min(7);
        match self.transport.set_brightness(level) {
            Ok(()) => self.brightness = level,
            Err(e) => warn!("set_brightness failed: {e}"),
        }
    }

    pub fn set_power(&mut self, on: bool) {
        match self.transport.set_power(on) {
            Ok(()) => self.power_on = on,
            Err(e) => warn!("set_power failed: {e}"),
        }
    }

    pub fn clear_area(&mut self, rect: Rect) {
        self.framebuffer.fill_rect(
            i32::from(rect.x1),
            i32::from(rect.y1),
            i32::from(rect.x2),
            i32::from(rect.y2),
            false,
        );
        self.present();
    }

    pub fn fill_area(&mut self, rect: Rect) {
        self.framebuffer.fill_rect(
            i32::from(rect.x1),
            i32::from(rect.y1),
            i32::from(rect.x2),
            i32::from(rect.y2),
            true,
        );
        self.present();
    }

    pub fn outline(&mut self, rect: Rect) {
        self.framebuffer.outline_rect(
            i32::from(rect.x1),
            i32::from(rect.y1),
            i32::from(rect.x2),
            i32::from(rect.y2),
        );
        self.present();
    }

    /// Blank the panel, power it off and close the transport
    pub fn shutdown(&mut self) {
        self.framebuffer.clear();
        self.present();
        if let Err(e) = self.transport.set_power(false) {
            warn!("power-off on shutdown failed: {e}");
        }
        if let Err(e) = self.transport.close() {
            warn!("transport close failed: {e}");
        }
    }

    fn rasterize(&mut self, text: &str) -> GlyphMask {
        match self.glyphs.rasterize(text, self.cursor.font) {
            Ok(mask) => mask,
            Err(e) => {
                warn!("glyph source failed ({e}), using builtin font");
                font::rasterize_builtin(text)
            }
        }
    }

    fn present(&mut self) {
        if let Err(e) = self.transport.present(&self.framebuffer) {
            warn!("present failed: {e}");
        }
    }
}
