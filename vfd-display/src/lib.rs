//! Display core for the VFD bridge
//!
//! Everything between a decoded [`vfd_protocol::Command`] and bytes on the
//! bus:
//!
//! - [`framebuffer`] - the in-memory 1-bit pixel grid and its clipped
//!   mutation primitives
//! - [`glyph`] / [`font`] - text-to-pixel-mask rasterization, with a
//!   built-in bitmap fallback
//! - [`layout`] - cursor state and the multi-line / multi-column layout math
//! - [`transport`] - SH1106 and SSD1306 adapters turning the framebuffer
//!   into the controllers' page/column-addressed transfer format
//! - [`session`] - the single live display binding that applies commands

pub mod font;
pub mod framebuffer;
pub mod glyph;
pub mod layout;
pub mod session;
pub mod transport;

pub use framebuffer::{DisplayGeometry, Framebuffer};
pub use glyph::{GlyphError, GlyphMask, GlyphSource, MonoGlyphs};
pub use session::DisplaySession;
pub use transport::{Sh1106, Ssd1306, Transport, TransportError};
