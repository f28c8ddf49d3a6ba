//! Decoded display instructions

/// Glyph size profile selected by `setFont`
///
/// Wire values match the legacy bridge: 0 = mini, 1 = 5x7, 2 = 10x14.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontProfile {
    #[default]
    Mini,
    Size5x7,
    Size10x14,
}

impl FontProfile {
    /// Parse a wire size value; anything out of range selects the mini font,
    /// matching the legacy bridge's lookup default
    pub fn from_wire(size: u8) -> Self {
        match size {
            1 => FontProfile::Size5x7,
            2 => FontProfile::Size10x14,
            _ => FontProfile::Mini,
        }
    }

    /// Wire size value for this profile
    pub fn to_wire(self) -> u8 {
        match self {
            FontProfile::Mini => 0,
            FontProfile::Size5x7 => 1,
            FontProfile::Size10x14 => 2,
        }
    }
}

/// Inclusive pixel rectangle carried by area opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
}

/// One decoded, self-contained display instruction
///
/// Produced by the decoder from a single client message, applied exactly
/// once to the display session, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Write text at column 0 of the given text row
    Write { text: String, line: u8 },
    /// Blank the whole framebuffer
    Clear,
    /// Draw a window of `lines` starting at list index `first_line`
    PrintLines {
        lines: Vec<String>,
        first_line: usize,
        max_lines: usize,
    },
    /// Draw a window of multi-column `rows`, columns aligned across the
    /// whole list
    PrintRows {
        rows: Vec<Vec<String>>,
        first_line: usize,
        max_lines: usize,
        x_offset: u8,
    },
    /// Scroll indicator on the right edge; fractions are of display height
    DrawScrollBar { top: u8, height: f32, offset: f32 },
    /// Select the active glyph profile
    SetFont(FontProfile),
    /// Place the cursor at a pixel position
    SetCursor { x: u8, y: u8 },
    /// Display brightness, 0-7
    SetBrightness { level: u8 },
    /// Panel power without touching the framebuffer
    SetPower { on: bool },
    /// Blank an area (VFD_CLEAR_AREA)
    ClearArea(Rect),
    /// Fill an area (VFD_SET_AREA)
    FillArea(Rect),
    /// Rectangle outline (VFD_OUTLINE)
    Outline(Rect),
    /// Packet with no special opcode: its bytes, rendered as text at the
    /// current cursor
    RawPacket { opcode: u8, text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_profile_roundtrip() {
        for profile in [FontProfile::Mini, FontProfile::Size5x7, FontProfile::Size10x14] {
            assert_eq!(FontProfile::from_wire(profile.to_wire()), profile);
        }
    }

    #[test]
    fn test_font_profile_out_of_range_is_mini() {
        assert_eq!(FontProfile::from_wire(3), FontProfile::Mini);
        assert_eq!(FontProfile::from_wire(0xFF), FontProfile::Mini);
    }
}
