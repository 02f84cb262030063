//! Packed RGB colors parsed from the host's color pool

use crate::error::EngineError;

/// An opaque 8-bit-per-channel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional)
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidColor {
            value: input.to_string(),
        };
        let hex = input.trim().trim_start_matches('#');
        // from_str_radix alone would also take a sign ("+f")
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc expands to #aabbcc
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }

    /// 0xRRGGBB
    pub fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Lighten (amount > 0, toward white) or darken (amount < 0, toward black)
    pub fn shade(self, amount: f32) -> Self {
        let amount = amount.clamp(-1.0, 1.0);
        let mix = |c: u8| -> u8 {
            let c = c as f32;
            let target = if amount >= 0.0 { 255.0 } else { 0.0 };
            (c + (target - c) * amount.abs()).round() as u8
        };
        Self::new(mix(self.r), mix(self.g), mix(self.b))
    }

    /// CSS `rgba(...)` string for Canvas fill styles
    pub fn to_css(self, alpha: f32) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}
