//! Color parsing and manipulation utilities.
//!
//! Colors are straight (non-premultiplied) RGBA with every channel in `0..=1`.
//! Parsing accepts the color syntaxes that show up in SVG presentation
//! attributes and inline style blocks.

use palette::{FromColor, Hsl, Srgb};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0, 1.0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// Returns this color with alpha multiplied by `factor` (clamped to `0..=1`).
    pub fn with_alpha_factor(self, factor: f64) -> Self {
        Self {
            a: (self.a * factor.clamp(0.0, 1.0)).clamp(0.0, 1.0),
            ..self
        }
    }

    /// `#rrggbbaa` form, used by the command-line inspector.
    pub fn to_hex(&self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// Parse a color string.
///
/// Supports the following formats:
/// - Hex colors: #RGB, #RGBA, #RRGGBB, #RRGGBBAA
/// - RGB/RGBA: rgb(r, g, b), rgba(r, g, b, a), with numbers or percentages
/// - HSL/HSLA: hsl(h, s%, l%), hsla(h, s%, l%, a)
/// - Named colors from the CSS color list, plus `transparent`
///
/// `none` is not a color and returns `None`; callers decide what it means.
///
/// # Examples
///
/// ```
/// use folio_core::color::{parse_color, Color};
///
/// assert_eq!(parse_color("#ff0000"), Some(Color::rgba(1.0, 0.0, 0.0, 1.0)));
/// assert_eq!(parse_color("black"), Some(Color::BLACK));
/// assert!(parse_color("none").is_none());
/// ```
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();

    if lower == "transparent" {
        return Some(Color::TRANSPARENT);
    }

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
        return parse_rgb_args(args);
    }

    if let Some(args) = function_args(&lower, "hsla").or_else(|| function_args(&lower, "hsl")) {
        return parse_hsl_args(args);
    }

    palette::named::from_str(&lower).map(|c| Color::from_rgb8(c.red, c.green, c.blue))
}

/// Returns the text between `name(` and the closing `)`.
fn function_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn split_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let nibble = |i: usize| -> Option<f64> {
        let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
        Some(v as f64 / 15.0)
    };
    let byte = |i: usize| -> Option<f64> {
        let v = u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?;
        Some(v as f64 / 255.0)
    };

    match hex.len() {
        3 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, 1.0)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, 1.0)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts = split_args(args);
    if parts.len() < 3 {
        return None;
    }

    let r = parse_rgb_component(parts[0])?;
    let g = parse_rgb_component(parts[1])?;
    let b = parse_rgb_component(parts[2])?;
    let a = match parts.get(3) {
        Some(alpha) => parse_alpha(alpha)?,
        None => 1.0,
    };

    Some(Color::rgba(r, g, b, a))
}

/// Parse a single RGB component which can be a number (0-255) or percentage
fn parse_rgb_component(value: &str) -> Option<f64> {
    if let Some(pct) = value.strip_suffix('%') {
        pct.parse::<f64>().ok().map(|v| (v / 100.0).clamp(0.0, 1.0))
    } else {
        value.parse::<f64>().ok().map(|v| (v / 255.0).clamp(0.0, 1.0))
    }
}

fn parse_alpha(value: &str) -> Option<f64> {
    if let Some(pct) = value.strip_suffix('%') {
        pct.parse::<f64>().ok().map(|v| (v / 100.0).clamp(0.0, 1.0))
    } else {
        value.parse::<f64>().ok().map(|v| v.clamp(0.0, 1.0))
    }
}

fn parse_hsl_args(args: &str) -> Option<Color> {
    let parts = split_args(args);
    if parts.len() < 3 {
        return None;
    }

    let h = parts[0].trim_end_matches("deg").parse::<f32>().ok()?;
    let s = parts[1].trim_end_matches('%').parse::<f32>().ok()? / 100.0;
    let l = parts[2].trim_end_matches('%').parse::<f32>().ok()? / 100.0;
    let a = match parts.get(3) {
        Some(alpha) => parse_alpha(alpha)?,
        None => 1.0,
    };

    let hsl: Hsl = Hsl::new(h, s.clamp(0.0, 1.0), l.clamp(0.0, 1.0));
    let rgb: Srgb = Srgb::from_color(hsl);
    Some(Color::rgba(
        rgb.red as f64,
        rgb.green as f64,
        rgb.blue as f64,
        a,
    ))
}
