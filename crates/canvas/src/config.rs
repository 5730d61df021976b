use folio_core::{Bounds, Color};
use glam::DVec2;
use interchange::UnknownVariantPolicy;
use markup::ImportOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for an editor session.
///
/// Loaded from JSON; any field left out takes its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Page size in document units. Imports and new nodes are placed
    /// relative to this box.
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Share of the page imported markup may cover on its tighter axis.
    pub fit_margin: f64,
    #[serde(with = "hex_color")]
    pub default_fill: Color,
    #[serde(with = "hex_color")]
    pub default_stroke: Color,
    pub default_stroke_width: f64,
    #[serde(with = "hex_color")]
    pub default_text_color: Color,
    pub default_font_family: String,
    pub default_font_size: f64,
    pub unknown_variant_policy: UnknownVariantPolicy,
    /// Append log output to this file in addition to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 1000.0,
            fit_margin: 0.8,
            default_fill: Color::from_rgb8(0xd9, 0xd9, 0xd9),
            default_stroke: Color::TRANSPARENT,
            default_stroke_width: 0.0,
            default_text_color: Color::BLACK,
            default_font_family: markup::DEFAULT_FONT_FAMILY.to_string(),
            default_font_size: 32.0,
            unknown_variant_policy: UnknownVariantPolicy::default(),
            log_file: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn canvas_bounds(&self) -> Bounds {
        Bounds::from_origin_size(
            DVec2::ZERO,
            DVec2::new(self.canvas_width, self.canvas_height),
        )
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            fit_margin: self.fit_margin,
        }
    }
}

/// Colors in config files are CSS color strings (`#rrggbb`, `rgb(...)`,
/// names); they are written back as `#rrggbbaa`.
mod hex_color {
    use folio_core::{color::parse_color, Color};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value.trim() == "none" {
            return Ok(Color::TRANSPARENT);
        }
        parse_color(&value).ok_or_else(|| de::Error::custom(format!("invalid color `{value}`")))
    }
}
