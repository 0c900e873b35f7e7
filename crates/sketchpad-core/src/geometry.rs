//! Geometry and color value types.

use serde::{Deserialize, Serialize};

/// Canvas-space point. Re-exported from kurbo.
pub use kurbo::Point;

/// RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    /// Preset brush colors offered by the control panel.
    pub const PALETTE: [Color; 12] = [
        Color::BLACK,
        Color::rgb(255, 0, 0),     // Red
        Color::rgb(0, 0, 255),     // Blue
        Color::rgb(0, 255, 0),     // Green
        Color::rgb(255, 255, 0),   // Yellow
        Color::rgb(255, 0, 255),   // Magenta
        Color::rgb(0, 255, 255),   // Cyan
        Color::rgb(136, 136, 136), // Gray
        Color::rgb(139, 69, 19),   // Brown
        Color::rgb(255, 165, 0),   // Orange
        Color::rgb(128, 0, 128),   // Purple
        Color::rgb(255, 105, 180), // Hot pink
    ];

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build from normalized `0.0..=1.0` components. Out-of-range values are clamped.
    pub fn from_normalized(r: f32, g: f32, b: f32, a: f32) -> Self {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b), to_u8(a))
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::rgb(r, g, b))
            }
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
