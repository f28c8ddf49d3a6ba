//! Layout math for the text engine
//!
//! Pure helpers over list indices and pixel rectangles; the session applies
//! the results to the framebuffer. Column widths are estimates from the
//! font profile's nominal size, not kerning - the legacy displays were laid
//! out the same way.

use std::ops::Range;

use vfd_protocol::FontProfile;

use crate::framebuffer::DisplayGeometry;

/// Width of the scroll-bar strip reserved at the right edge
pub const SCROLL_BAR_WIDTH: i32 = 3;

/// Padding added to every estimated column width
pub const COLUMN_PADDING: i32 = 5;

/// Minimum scroll-bar height so tiny fractions stay visible
pub const MIN_BAR_HEIGHT: i32 = 4;

/// Cursor position and active font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub x: i32,
    pub y: i32,
    pub font: FontProfile,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            font: FontProfile::Mini,
        }
    }
}

/// Per-character width estimate for column layout (half the nominal size)
pub fn half_width(font: FontProfile) -> i32 {
    match font {
        FontProfile::Mini => 4,
        FontProfile::Size5x7 => 6,
        FontProfile::Size10x14 => 8,
    }
}

/// Row advance for line-indexed writes
pub fn line_height(font: FontProfile) -> i32 {
    match font {
        FontProfile::Mini => 8,
        FontProfile::Size5x7 => 12,
        FontProfile::Size10x14 => 16,
    }
}

/// Clip the window `[first, first + max)` to the list `[0, len)`
pub fn visible_range(len: usize, first: usize, max: usize) -> Range<usize> {
    let start = first.min(len);
    let end = first.saturating_add(max).min(len);
    start..end
}

/// Estimated column widths from a single pass over *all* rows
///
/// Widths never depend on the visible slice, so scrolling cannot shift
/// column alignment.
pub fn column_widths(rows: &[Vec<String>], font: FontProfile) -> Vec<i32> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let estimate = cell.chars().count() as i32 * half_width(font);
            widths[i] = widths[i].max(estimate);
        }
    }
    for width in &mut widths {
        *width += COLUMN_PADDING;
    }
    widths
}

/// Resolved scroll-bar placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollBar {
    /// Left edge of the reserved strip
    pub strip_x: i32,
    /// Top of the reserved strip
    pub strip_top: i32,
    /// Top of the filled bar
    pub bar_top: i32,
    /// Height of the filled bar in pixels
    pub bar_height: i32,
}

/// Place the scroll bar for the given fractions of display height
///
/// The bar gets a 4-pixel floor and is clamped to stay inside the strip.
pub fn scroll_bar(
    geometry: DisplayGeometry,
    top: i32,
    height_fraction: f32,
    offset_fraction: f32,
) -> ScrollBar {
    let display_height = geometry.height();
    let strip_top = top.clamp(0, display_height - 1);

    let mut bar_height = (height_fraction * display_height as f32).round() as i32;
    bar_height = bar_height.max(MIN_BAR_HEIGHT);

    let mut bar_top = (offset_fraction * display_height as f32).round() as i32;
    bar_top = bar_top.clamp(strip_top, display_height - 1);
    bar_height = bar_height.min(display_height - bar_top);

    ScrollBar {
        strip_x: geometry.width() - SCROLL_BAR_WIDTH,
        strip_top,
        bar_top,
        bar_height,
    }
}
