use image::Rgba;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex digits in an encoded color.
pub const HEX_CODE_LEN: usize = 6;

/// A 24-bit RGB color. Equality is exact, component by component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color code is empty")]
    Empty,
    #[error("color code must be 6 hex digits, got {len}")]
    WrongLength { len: usize },
    #[error("color code '{code}' contains a non-hex character")]
    InvalidDigit { code: String },
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Strips surrounding whitespace and a single leading `#`.
    pub fn normalize_code(raw: &str) -> &str {
        let trimmed = raw.trim();
        trimmed.strip_prefix('#').unwrap_or(trimmed)
    }

    /// Decodes a `RRGGBB` code, with or without a leading `#`.
    pub fn from_hex(raw: &str) -> Result<Self, ColorParseError> {
        let code = Self::normalize_code(raw);
        if code.is_empty() {
            return Err(ColorParseError::Empty);
        }
        // from_str_radix tolerates a sign prefix, so check digits up front
        if !code.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidDigit {
                code: code.to_string(),
            });
        }
        if code.len() != HEX_CODE_LEN {
            return Err(ColorParseError::WrongLength { len: code.len() });
        }

        let channel = |at: usize| {
            u8::from_str_radix(&code[at..at + 2], 16).map_err(|_| ColorParseError::InvalidDigit {
                code: code.to_string(),
            })
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Canonical lowercase `rrggbb` form.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<Rgba<u8>> for Color {
    // alpha is not part of a color's identity
    fn from(px: Rgba<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_with_and_without_hash() {
        assert_eq!(Color::from_hex("#FF0000").unwrap(), Color::new(255, 0, 0));
        assert_eq!(Color::from_hex("00ff7f").unwrap(), Color::new(0, 255, 127));
        assert_eq!(Color::from_hex("  #0a0B0c \t").unwrap(), Color::new(10, 11, 12));
    }

    #[test]
    fn hex_round_trip_is_lowercase_canonical() {
        for code in ["#ABCDEF", "abcdef", "#00FF10", "7f7F7f", " #123456 "] {
            let color: Color = code.parse().unwrap();
            let canonical = Color::normalize_code(code).to_ascii_lowercase();
            assert_eq!(color.to_hex(), canonical);
        }
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!(Color::from_hex(""), Err(ColorParseError::Empty));
        assert_eq!(Color::from_hex("   # "), Err(ColorParseError::Empty));
        assert_eq!(
            Color::from_hex("#FFF"),
            Err(ColorParseError::WrongLength { len: 3 })
        );
        assert_eq!(
            Color::from_hex("FF00FF00"),
            Err(ColorParseError::WrongLength { len: 8 })
        );
        assert!(matches!(
            Color::from_hex("ZZZZZZ"),
            Err(ColorParseError::InvalidDigit { .. })
        ));
        assert!(matches!(
            Color::from_hex("+F00FF"),
            Err(ColorParseError::InvalidDigit { .. })
        ));
        // only one leading '#' is stripped
        assert!(matches!(
            Color::from_hex("##FF0000"),
            Err(ColorParseError::InvalidDigit { .. })
        ));
    }

    #[test]
    fn alpha_is_discarded() {
        let opaque = Color::from(Rgba([1, 2, 3, 255]));
        let clear = Color::from(Rgba([1, 2, 3, 0]));
        assert_eq!(opaque, clear);
    }
}
