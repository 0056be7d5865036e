//! Colors and perceptual interpolation.
//!
//! Colors are parsed from CSS hex notation (`#rgb`, `#rrggbb`) or the
//! functional `rgb(r, g, b)` form. Interpolation happens in CIE L*a*b*
//! space with a D65 reference white, which keeps midpoints perceptually
//! even between the endpoints of a choropleth ramp.

use std::fmt;
use std::str::FromStr;

use map_common::MapError;
use serde::{Serialize, Serializer};

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` representation.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_lab(&self) -> Lab {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);
        let x = xyz_to_lab((0.4124564 * r + 0.3575761 * g + 0.1804375 * b) / WHITE_X);
        let y = xyz_to_lab((0.2126729 * r + 0.7151522 * g + 0.0721750 * b) / WHITE_Y);
        let z = xyz_to_lab((0.0193339 * r + 0.1191920 * g + 0.9503041 * b) / WHITE_Z);
        Lab {
            l: 116.0 * y - 16.0,
            a: 500.0 * (x - y),
            b: 200.0 * (y - z),
        }
    }

    /// Interpolates between `self` (t = 0) and `other` (t = 1) in Lab space.
    ///
    /// `t` is not clamped; out-of-range values extrapolate and the resulting
    /// channels saturate at 0 and 255.
    pub fn interpolate_lab(&self, other: &Color, t: f64) -> Color {
        self.to_lab().interpolate(&other.to_lab(), t).to_rgb()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if let Some(hex) = trimmed.strip_prefix('#') {
            parse_hex(hex)
        } else if let Some(body) = trimmed
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            parse_rgb_function(body)
        } else {
            None
        };

        parsed.ok_or_else(|| MapError::InvalidColor(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some(Color::new(digit(0)?, digit(1)?, digit(2)?))
        }
        6 => {
            let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Color::new(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

fn parse_rgb_function(body: &str) -> Option<Color> {
    let channels = body
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match channels.as_slice() {
        [r, g, b] => Some(Color::new(clamp_channel(*r), clamp_channel(*g), clamp_channel(*b))),
        _ => None,
    }
}

/// A color in CIE L*a*b* space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn interpolate(&self, other: &Lab, t: f64) -> Lab {
        Lab {
            l: self.l + (other.l - self.l) * t,
            a: self.a + (other.a - self.a) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    pub fn to_rgb(&self) -> Color {
        let y = (self.l + 16.0) / 116.0;
        let x = y + self.a / 500.0;
        let z = y - self.b / 200.0;

        let x = lab_to_xyz(x) * WHITE_X;
        let y = lab_to_xyz(y) * WHITE_Y;
        let z = lab_to_xyz(z) * WHITE_Z;

        Color::new(
            linear_to_srgb(3.2404542 * x - 1.5371385 * y - 0.4985314 * z),
            linear_to_srgb(-0.9692660 * x + 1.8760108 * y + 0.0415560 * z),
            linear_to_srgb(0.0556434 * x - 0.2040259 * y + 1.0572252 * z),
        )
    }
}

// D65 reference white.
const WHITE_X: f64 = 0.950470;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.088830;

const LAB_T0: f64 = 4.0 / 29.0;
const LAB_T1: f64 = 0.206893034;
const LAB_T2: f64 = 0.008856;
const LAB_K: f64 = 7.787037;

fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> u8 {
    let encoded = if c <= 0.00304 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    clamp_channel(255.0 * encoded)
}

fn xyz_to_lab(x: f64) -> f64 {
    if x > LAB_T2 {
        x.cbrt()
    } else {
        LAB_K * x + LAB_T0
    }
}

fn lab_to_xyz(x: f64) -> f64 {
    if x > LAB_T1 {
        x * x * x
    } else {
        (x - LAB_T0) / LAB_K
    }
}

/// Rounds half up and saturates to the 0..=255 channel range.
fn clamp_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v + 0.5).floor().clamp(0.0, 255.0) as u8
}
