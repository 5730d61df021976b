use crate::path_data::parse_path_data;
use crate::style::{parse_length, StyleResolver};
use folio_core::transform::{parse_number_list, parse_transform_list, NumberScanner};
use folio_core::{AffineTransform, Bounds};
use glam::DVec2;
use node::{Node, NodeKind, PathCommand};
use roxmltree::Node as Element;
use thiserror::Error;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Control point distance for approximating a quarter ellipse with a cubic.
const KAPPA: f64 = 0.552_284_749_8;

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("malformed markup: {0}")]
    MalformedMarkup(String),
    #[error("markup contains no drawable content")]
    NoDrawableContent,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImportOptions {
    /// Fraction of the target the imported content may occupy on its
    /// tighter axis.
    pub fit_margin: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { fit_margin: 0.8 }
    }
}

/// Result of a successful import.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedContent {
    /// A single leaf, or a synthetic group when the markup produced several.
    pub node: Node,
    /// Uniform fit-to-target scale that was applied.
    pub scale: f64,
}

/// Converts SVG markup into a node tree placed inside a target box.
#[derive(Clone, Debug, Default)]
pub struct VectorMarkupImporter {
    options: ImportOptions,
}

impl VectorMarkupImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn import(&self, markup: &str, target: Bounds) -> Result<ImportedContent, ImportError> {
        let document = roxmltree::Document::parse(markup)
            .map_err(|err| ImportError::MalformedMarkup(err.to_string()))?;
        let root = document.root_element();
        if root.tag_name().name() != "svg" {
            return Err(ImportError::MalformedMarkup(format!(
                "expected <svg> root element, found <{}>",
                root.tag_name().name()
            )));
        }

        let scale = self.fit_scale(root, target);

        let mut nodes = Vec::new();
        collect(root, AffineTransform::IDENTITY, &mut nodes);
        log::debug!(
            "imported {} node(s) from markup at scale {:.3}",
            nodes.len(),
            scale
        );

        let content = nodes
            .iter()
            .filter_map(Node::bounds_in_parent)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(Bounds::zero);
        let placement = AffineTransform::translate(
            target.center().x - scale * content.center().x,
            target.center().y - scale * content.center().y,
        )
        .compose(&AffineTransform::scale(scale, scale));

        let node = match nodes.len() {
            0 => return Err(ImportError::NoDrawableContent),
            1 => {
                let mut node = nodes.remove(0);
                node.transform = placement.compose(&node.transform);
                node
            }
            _ => {
                for child in &mut nodes {
                    child.flags.selectable = false;
                }
                Node::group(nodes).with_transform(placement)
            }
        };

        Ok(ImportedContent { node, scale })
    }

    /// `min(target_w / w, target_h / h) * fit_margin`, where `w`/`h` come from
    /// the `viewBox`, else the `width`/`height` attributes. Without either the
    /// scale is `1`.
    fn fit_scale(&self, root: Element<'_, '_>, target: Bounds) -> f64 {
        let view_box = root
            .attribute("viewBox")
            .and_then(parse_number_list)
            .filter(|v| v.len() == 4 && v[2] > 0.0 && v[3] > 0.0)
            .map(|v| DVec2::new(v[2], v[3]));

        let declared = || {
            let width = parse_length(root.attribute("width")?);
            let height = parse_length(root.attribute("height")?);
            (width > 0.0 && height > 0.0).then(|| DVec2::new(width, height))
        };

        match view_box.or_else(declared) {
            Some(size) => {
                (target.width() / size.x).min(target.height() / size.y) * self.options.fit_margin
            }
            None => 1.0,
        }
    }
}

/// Imports with default options.
pub fn import(markup: &str, target: Bounds) -> Result<ImportedContent, ImportError> {
    VectorMarkupImporter::default().import(markup, target)
}

fn collect(element: Element<'_, '_>, ctm: AffineTransform, out: &mut Vec<Node>) {
    let ancestors: Vec<_> = element
        .ancestors()
        .skip(1)
        .filter(|n| n.is_element())
        .collect();
    if StyleResolver::is_hidden(element, &ancestors) {
        log::debug!("skipping hidden <{}>", element.tag_name().name());
        return;
    }

    let own = element
        .attribute("transform")
        .map(parse_transform_list)
        .unwrap_or_default();
    let transform = ctm.compose(&own);

    let tag = element.tag_name().name();
    let kind = match tag {
        "svg" | "g" | "defs" => {
            for child in element.children().filter(|n| n.is_element()) {
                collect(child, transform, out);
            }
            return;
        }
        "path" => {
            let commands = parse_path_data(element.attribute("d").unwrap_or_default());
            if commands.is_empty() {
                log::warn!("skipping <path> without usable path data");
                return;
            }
            NodeKind::Path { commands }
        }
        "rect" => rect_kind(element),
        "circle" => NodeKind::Circle {
            cx: number(element, "cx"),
            cy: number(element, "cy"),
            r: number(element, "r").max(0.0),
        },
        "ellipse" => ellipse_kind(element),
        "line" => NodeKind::Path {
            commands: vec![
                PathCommand::MoveTo {
                    x: number(element, "x1"),
                    y: number(element, "y1"),
                },
                PathCommand::LineTo {
                    x: number(element, "x2"),
                    y: number(element, "y2"),
                },
            ],
        },
        "polyline" | "polygon" => {
            let Some(commands) = poly_commands(element, tag == "polygon") else {
                log::warn!("skipping <{tag}> with fewer than two points");
                return;
            };
            NodeKind::Path { commands }
        }
        "text" => NodeKind::Text {
            x: first_number(element, "x"),
            y: first_number(element, "y"),
            content: text_content(element),
            font_size: StyleResolver::font_size(element, &ancestors),
            font_family: StyleResolver::font_family(element, &ancestors),
            align: StyleResolver::text_align(element, &ancestors),
        },
        "image" => {
            let Some(source_ref) = element
                .attribute("href")
                .or_else(|| element.attribute((XLINK_NS, "href")))
                .filter(|href| !href.is_empty())
            else {
                log::warn!("skipping <image> without href");
                return;
            };
            let offset = AffineTransform::translate(number(element, "x"), number(element, "y"));
            let node = Node::image(
                source_ref,
                number(element, "width").max(0.0),
                number(element, "height").max(0.0),
            )
            .with_style(StyleResolver::resolve(element, &ancestors))
            .with_transform(transform.compose(&offset));
            out.push(node);
            return;
        }
        other => {
            log::debug!("ignoring unsupported element <{other}>");
            return;
        }
    };

    out.push(
        Node::new(kind)
            .with_style(StyleResolver::resolve(element, &ancestors))
            .with_transform(transform),
    );
}

fn number(element: Element<'_, '_>, name: &str) -> f64 {
    element.attribute(name).map(parse_length).unwrap_or(0.0)
}

/// `x`/`y` on text may be lists; only the first position is used.
fn first_number(element: Element<'_, '_>, name: &str) -> f64 {
    element
        .attribute(name)
        .and_then(|v| NumberScanner::new(v).next_number())
        .unwrap_or(0.0)
}

fn rect_kind(element: Element<'_, '_>) -> NodeKind {
    let rx = element.attribute("rx").map(parse_length);
    let ry = element.attribute("ry").map(parse_length);
    // A single corner radius applies to both axes.
    let (rx, ry) = match (rx, ry) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    NodeKind::Rect {
        x: number(element, "x"),
        y: number(element, "y"),
        width: number(element, "width").max(0.0),
        height: number(element, "height").max(0.0),
        rx: rx.max(0.0),
        ry: ry.max(0.0),
    }
}

fn ellipse_kind(element: Element<'_, '_>) -> NodeKind {
    let cx = number(element, "cx");
    let cy = number(element, "cy");
    let rx = number(element, "rx").max(0.0);
    let ry = number(element, "ry").max(0.0);
    if rx == ry {
        return NodeKind::Circle { cx, cy, r: rx };
    }

    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let cubic = |x1, y1, x2, y2, x, y| PathCommand::CubicTo {
        x1,
        y1,
        x2,
        y2,
        x,
        y,
    };
    NodeKind::Path {
        commands: vec![
            PathCommand::MoveTo { x: cx + rx, y: cy },
            cubic(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry),
            cubic(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy),
            cubic(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry),
            cubic(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy),
            PathCommand::Close,
        ],
    }
}

fn poly_commands(element: Element<'_, '_>, close: bool) -> Option<Vec<PathCommand>> {
    let mut scanner = NumberScanner::new(element.attribute("points")?);
    let mut points = Vec::new();
    while let (Some(x), Some(y)) = (scanner.next_number(), scanner.next_number()) {
        points.push(DVec2::new(x, y));
    }
    if points.len() < 2 {
        return None;
    }

    let mut commands: Vec<_> = points
        .iter()
        .enumerate()
        .map(|(i, p)| match i {
            0 => PathCommand::MoveTo { x: p.x, y: p.y },
            _ => PathCommand::LineTo { x: p.x, y: p.y },
        })
        .collect();
    if close {
        commands.push(PathCommand::Close);
    }
    Some(commands)
}

/// Concatenated text of the element and its `tspan` descendants with
/// whitespace collapsed.
fn text_content(element: Element<'_, '_>) -> String {
    let raw: String = element
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
