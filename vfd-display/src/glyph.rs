//! Glyph rasterization
//!
//! A [`GlyphSource`] turns text plus a font profile into a rectangular
//! pixel mask; the session blits the mask into the framebuffer. The default
//! source renders embedded-graphics mono fonts. A source that fails is not
//! fatal: callers fall back to the built-in 5x7 table in [`crate::font`].

use embedded_graphics::mono_font::{ascii, MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use thiserror::Error;

use vfd_protocol::FontProfile;

/// Glyph rasterization failure
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("no glyphs available for {0:?}")]
    MissingFont(FontProfile),
}

/// A rectangular 1-bit pixel mask
///
/// Rows are bit-packed; reads outside the mask return unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    width: u32,
    height: u32,
    stride: usize,
    bits: Vec<u8>,
}

impl GlyphMask {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.stride + (x / 8) as usize;
        let bit = 1u8 << (x & 7);
        if on {
            self.bits[index] |= bit;
        } else {
            self.bits[index] &= !bit;
        }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.stride + (x / 8) as usize;
        self.bits[index] & (1 << (x & 7)) != 0
    }
}

impl OriginDimensions for GlyphMask {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for GlyphMask {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

/// Source of glyph masks for the three font profiles
pub trait GlyphSource: Send {
    fn rasterize(&self, text: &str, font: FontProfile) -> Result<GlyphMask, GlyphError>;
}

/// Mono-font glyph source
///
/// Profile mapping keeps the legacy size semantics: mini, 5x7, and a
/// double-height large font standing in for the VFD's 10x14.
pub struct MonoGlyphs;

impl MonoGlyphs {
    fn font(profile: FontProfile) -> &'static MonoFont<'static> {
        match profile {
            FontProfile::Mini => &ascii::FONT_4X6,
            FontProfile::Size5x7 => &ascii::FONT_5X7,
            FontProfile::Size10x14 => &ascii::FONT_10X20,
        }
    }
}

impl GlyphSource for MonoGlyphs {
    fn rasterize(&self, text: &str, profile: FontProfile) -> Result<GlyphMask, GlyphError> {
        let font = Self::font(profile);
        let advance = font.character_size.width + font.character_spacing;
        let width = advance * text.chars().count() as u32;
        let mut mask = GlyphMask::new(width, font.character_size.height);

        let style = MonoTextStyle::new(font, BinaryColor::On);
        // Drawing into a GlyphMask is infallible
        let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut mask);
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_set_get_roundtrip() {
        let mut mask = GlyphMask::new(10, 3);
        mask.set(9, 2, true);
        assert!(mask.get(9, 2));
        mask.set(9, 2, false);
        assert!(!mask.get(9, 2));
    }

    #[test]
    fn test_mask_out_of_range_reads_unset() {
        let mask = GlyphMask::new(4, 4);
        assert!(!mask.get(4, 0));
        assert!(!mask.get(0, 4));
    }

    #[test]
    fn test_mono_rasterize_dimensions_track_profile() {
        let glyphs = MonoGlyphs;
        let mini = glyphs.rasterize("ab", FontProfile::Mini).unwrap();
        let large = glyphs.rasterize("ab", FontProfile::Size10x14).unwrap();
        assert!(large.width() > mini.width());
        assert!(large.height() > mini.height());
        assert_eq!(mini.height(), 6);
        assert_eq!(large.height(), 20);
    }

    #[test]
    fn test_mono_rasterize_draws_something() {
        let glyphs = MonoGlyphs;
        let mask = glyphs.rasterize("X", FontProfile::Size5x7).unwrap();
        let lit = (0..mask.height())
            .flat_map(|y| (0..mask.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| mask.get(x, y))
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn test_empty_text_rasterizes_to_empty_mask() {
        let glyphs = MonoGlyphs;
        let mask = glyphs.rasterize("", FontProfile::Mini).unwrap();
        assert_eq!(mask.width(), 0);
    }
}
