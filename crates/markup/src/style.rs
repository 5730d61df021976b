use folio_core::{color::parse_color, Color};
use node::{Style, TextAlign};
use roxmltree::Node as Element;

pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Resolves presentation properties for markup elements.
///
/// For every property the first source that declares it wins:
///
/// 1. the element's `style` declaration block
/// 2. the element's presentation attribute
/// 3. the nearest ancestor that declares it, style block before attribute
/// 4. the default
///
/// A value of `inherit` defers to the next source. Resolution never fails:
/// malformed numbers read as `0` and unparsable colors as transparent.
pub struct StyleResolver;

impl StyleResolver {
    /// `ancestors` is ordered nearest first.
    pub fn resolve(element: Element<'_, '_>, ancestors: &[Element<'_, '_>]) -> Style {
        let lookup = |name: &str| cascade(element, ancestors, name);

        let paint = |name: &str| match lookup(name) {
            Some(value) => resolve_paint(&value, || lookup("color")),
            None => Color::TRANSPARENT,
        };

        Style {
            fill: paint("fill"),
            stroke: paint("stroke"),
            stroke_width: lookup("stroke-width")
                .map(|v| parse_length(&v))
                .unwrap_or(0.0)
                .max(0.0),
            opacity: lookup("opacity").map(|v| parse_opacity(&v)).unwrap_or(1.0),
            fill_opacity: lookup("fill-opacity")
                .map(|v| parse_opacity(&v))
                .unwrap_or(1.0),
        }
    }

    /// True for `display: none` on the element itself, or an effective
    /// `visibility` of `hidden`/`collapse` (which is inherited).
    ///
    /// Ancestors with `display: none` are never reached by the importer, so
    /// only the element's own `display` is consulted.
    pub fn is_hidden(element: Element<'_, '_>, ancestors: &[Element<'_, '_>]) -> bool {
        if own_property(element, "display").as_deref() == Some("none") {
            return true;
        }
        matches!(
            cascade(element, ancestors, "visibility").as_deref(),
            Some("hidden" | "collapse")
        )
    }

    pub fn font_size(element: Element<'_, '_>, ancestors: &[Element<'_, '_>]) -> f64 {
        cascade(element, ancestors, "font-size")
            .map(|v| parse_length(&v))
            .filter(|size| *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn font_family(element: Element<'_, '_>, ancestors: &[Element<'_, '_>]) -> String {
        cascade(element, ancestors, "font-family")
            .map(|v| v.trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|family| !family.is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string())
    }

    /// Maps `text-anchor` (`start`/`middle`/`end`) onto [`TextAlign`].
    pub fn text_align(element: Element<'_, '_>, ancestors: &[Element<'_, '_>]) -> TextAlign {
        match cascade(element, ancestors, "text-anchor").as_deref() {
            Some("middle") => TextAlign::Center,
            Some("end") => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

fn cascade(element: Element<'_, '_>, ancestors: &[Element<'_, '_>], name: &str) -> Option<String> {
    std::iter::once(element)
        .chain(ancestors.iter().copied())
        .find_map(|el| own_property(el, name))
}

/// Value declared directly on `element`, skipping `inherit`.
fn own_property(element: Element<'_, '_>, name: &str) -> Option<String> {
    let from_block = element.attribute("style").and_then(|block| {
        simplecss::DeclarationTokenizer::from(block)
            .filter(|decl| decl.name == name)
            .last()
            .map(|decl| decl.value.trim().to_string())
    });

    from_block
        .filter(|v| v != "inherit")
        .or_else(|| {
            element
                .attribute(name)
                .map(|v| v.trim().to_string())
                .filter(|v| v != "inherit")
        })
}

fn resolve_paint(value: &str, current_color: impl FnOnce() -> Option<String>) -> Color {
    if value.eq_ignore_ascii_case("currentcolor") {
        return current_color()
            .and_then(|c| parse_color(&c))
            .unwrap_or(Color::BLACK);
    }
    parse_color(value).unwrap_or(Color::TRANSPARENT)
}

/// Parses a length, tolerating a `px` suffix. Anything else reads as `0`.
pub fn parse_length(value: &str) -> f64 {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_opacity(value: &str) -> f64 {
    let value = value.trim();
    let opacity = match value.strip_suffix('%') {
        Some(percent) => parse_length(percent) / 100.0,
        None => parse_length(value),
    };
    opacity.clamp(0.0, 1.0)
}
