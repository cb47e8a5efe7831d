// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors, the shape color table, and the node palette.

use std::collections::HashMap;

use crate::error::ColorError;

/// 8-bit RGBA color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, 255 is opaque.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Off-white used as the default fill.
    pub const RAY_WHITE: Self = Self::rgb(245, 245, 245);
    /// Light gray used for placeholder outlines.
    pub const LIGHT_GRAY: Self = Self::rgb(200, 200, 200);
    /// Gray used for edges.
    pub const GRAY: Self = Self::rgb(130, 130, 130);
    /// Blue.
    pub const BLUE: Self = Self::rgb(0, 121, 241);
    /// Sky blue.
    pub const SKY_BLUE: Self = Self::rgb(102, 191, 255);
    /// Dark green.
    pub const DARK_GREEN: Self = Self::rgb(0, 117, 44);
    /// Green.
    pub const GREEN: Self = Self::rgb(0, 228, 48);
    /// Maroon.
    pub const MAROON: Self = Self::rgb(190, 33, 55);
    /// Red.
    pub const RED: Self = Self::rgb(230, 41, 55);
    /// Dark purple.
    pub const DARK_PURPLE: Self = Self::rgb(112, 31, 126);
    /// Purple.
    pub const PURPLE: Self = Self::rgb(200, 122, 255);

    /// Color from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Opaque color from a packed `0xRRGGBB` value.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "each channel is masked to 8 bits first"
    )]
    pub const fn from_rgb_u32(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        )
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn parse_hex(text: &str) -> Result<Self, ColorError> {
        let err = || ColorError(text.to_owned());
        let digits = text.strip_prefix('#').unwrap_or(text);
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

/// Border and fill of one shape part.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorPair {
    /// Outline color.
    pub border: Rgba8,
    /// Interior color.
    pub fill: Rgba8,
}

impl ColorPair {
    /// A pair using the same color for border and fill.
    pub const fn solid(color: Rgba8) -> Self {
        Self {
            border: color,
            fill: color,
        }
    }
}

/// Normal and highlighted color pairs for a named color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShapeColors {
    /// Used for regular placements.
    pub normal: ColorPair,
    /// Used for highlighted placements.
    pub highlighted: ColorPair,
}

impl ShapeColors {
    /// The pair to use for a placement.
    pub fn pick(&self, highlight: bool) -> ColorPair {
        if highlight {
            self.highlighted
        } else {
            self.normal
        }
    }
}

/// Maps color names used by shape parts to color pairs.
///
/// Names not in the table are parsed as hex literals, with the same color for every role.
/// Anything else is an error.
#[derive(Clone, Debug)]
pub struct ColorTable {
    named: HashMap<String, ShapeColors>,
}

impl Default for ColorTable {
    /// The built-in names `"blue"`, `"red"` and `""` (the default, black on off-white).
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(
            "blue",
            ShapeColors {
                normal: ColorPair {
                    border: Rgba8::BLUE,
                    fill: Rgba8::SKY_BLUE,
                },
                highlighted: ColorPair {
                    border: Rgba8::DARK_GREEN,
                    fill: Rgba8::GREEN,
                },
            },
        );
        table.insert(
            "red",
            ShapeColors {
                normal: ColorPair {
                    border: Rgba8::MAROON,
                    fill: Rgba8::RED,
                },
                highlighted: ColorPair {
                    border: Rgba8::DARK_PURPLE,
                    fill: Rgba8::PURPLE,
                },
            },
        );
        let plain = ColorPair {
            border: Rgba8::BLACK,
            fill: Rgba8::RAY_WHITE,
        };
        table.insert(
            "",
            ShapeColors {
                normal: plain,
                highlighted: plain,
            },
        );
        table
    }
}

impl ColorTable {
    /// A table with no names at all; only hex literals resolve.
    pub fn empty() -> Self {
        Self {
            named: HashMap::new(),
        }
    }

    /// Add or replace a named entry.
    pub fn insert(&mut self, name: impl Into<String>, colors: ShapeColors) {
        self.named.insert(name.into(), colors);
    }

    /// Resolve a color name.
    pub fn resolve(&self, name: &str) -> Result<ShapeColors, ColorError> {
        if let Some(colors) = self.named.get(name) {
            return Ok(*colors);
        }
        let c = Rgba8::parse_hex(name)?;
        Ok(ShapeColors {
            normal: ColorPair::solid(c),
            highlighted: ColorPair::solid(c),
        })
    }
}

/// Node background colors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Regular node background.
    pub background: Rgba8,
    /// Background of the hovered node.
    pub hovered: Rgba8,
    /// Background of the selected node.
    pub selected: Rgba8,
    /// Placeholder outline drawn while a node has nothing baked.
    pub outline: Rgba8,
    /// Edge color.
    pub edge: Rgba8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba8::from_rgb_u32(0xDFD2D2),
            hovered: Rgba8::from_rgb_u32(0xA9B5DF),
            selected: Rgba8::from_rgb_u32(0x7886C7),
            outline: Rgba8::LIGHT_GRAY,
            edge: Rgba8::GRAY,
        }
    }
}

impl Palette {
    /// Background for a node; selection wins over hover.
    pub fn background_for(&self, selected: bool, hovered: bool) -> Rgba8 {
        if selected {
            self.selected
        } else if hovered {
            self.hovered
        } else {
            self.background
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms() {
        assert_eq!(Rgba8::parse_hex("#ff8000"), Ok(Rgba8::rgb(255, 128, 0)));
        assert_eq!(Rgba8::parse_hex("FF800080"), Ok(Rgba8::new(255, 128, 0, 128)));
        assert!(Rgba8::parse_hex("#ff80").is_err());
        assert!(Rgba8::parse_hex("#gg0000").is_err());
        assert!(Rgba8::parse_hex("#ééé").is_err());
        assert_eq!(Rgba8::from_rgb_u32(0x7886C7), Rgba8::rgb(0x78, 0x86, 0xC7));
    }

    #[test]
    fn table_resolves_names_then_hex() {
        let table = ColorTable::default();
        let blue = table.resolve("blue").unwrap();
        assert_eq!(blue.normal.fill, Rgba8::SKY_BLUE);
        assert_eq!(blue.pick(true).border, Rgba8::DARK_GREEN);
        assert_eq!(table.resolve("").unwrap().normal.fill, Rgba8::RAY_WHITE);

        let hex = table.resolve("#102030").unwrap();
        assert_eq!(hex.normal, ColorPair::solid(Rgba8::rgb(0x10, 0x20, 0x30)));
        assert_eq!(hex.normal, hex.highlighted);

        let err = table.resolve("chartreuse").unwrap_err();
        assert_eq!(err, ColorError("chartreuse".into()));
        assert!(ColorTable::empty().resolve("blue").is_err());
    }

    #[test]
    fn palette_prefers_selection() {
        let p = Palette::default();
        assert_eq!(p.background_for(true, true), p.selected);
        assert_eq!(p.background_for(false, true), p.hovered);
        assert_eq!(p.background_for(false, false), p.background);
    }
}
