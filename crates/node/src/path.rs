use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A path segment in absolute coordinates.
///
/// Relative and shorthand SVG commands are resolved to these when the path
/// data is parsed, so consumers never track a current point themselves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    CubicTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    QuadTo {
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    ArcTo {
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    Close,
}

impl PathCommand {
    /// Single-letter tag used by the document format (`M L C Q A Z`).
    pub fn letter(&self) -> &'static str {
        match self {
            Self::MoveTo { .. } => "M",
            Self::LineTo { .. } => "L",
            Self::CubicTo { .. } => "C",
            Self::QuadTo { .. } => "Q",
            Self::ArcTo { .. } => "A",
            Self::Close => "Z",
        }
    }

    /// Numeric arguments in SVG order. Arc flags are encoded as 0/1.
    pub fn args(&self) -> Vec<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match *self {
            Self::MoveTo { x, y } | Self::LineTo { x, y } => vec![x, y],
            Self::CubicTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => vec![x1, y1, x2, y2, x, y],
            Self::QuadTo { x1, y1, x, y } => vec![x1, y1, x, y],
            Self::ArcTo {
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => vec![rx, ry, x_axis_rotation, flag(large_arc), flag(sweep), x, y],
            Self::Close => Vec::new(),
        }
    }

    /// Inverse of [`letter`](Self::letter) + [`args`](Self::args).
    pub fn from_letter_args(letter: &str, a: &[f64]) -> Option<Self> {
        let cmd = match (letter, a.len()) {
            ("M", 2) => Self::MoveTo { x: a[0], y: a[1] },
            ("L", 2) => Self::LineTo { x: a[0], y: a[1] },
            ("C", 6) => Self::CubicTo {
                x1: a[0],
                y1: a[1],
                x2: a[2],
                y2: a[3],
                x: a[4],
                y: a[5],
            },
            ("Q", 4) => Self::QuadTo {
                x1: a[0],
                y1: a[1],
                x: a[2],
                y: a[3],
            },
            ("A", 7) => Self::ArcTo {
                rx: a[0],
                ry: a[1],
                x_axis_rotation: a[2],
                large_arc: a[3] != 0.0,
                sweep: a[4] != 0.0,
                x: a[5],
                y: a[6],
            },
            ("Z", 0) => Self::Close,
            _ => return None,
        };
        Some(cmd)
    }

    /// End point and control points; used for a conservative bounding box.
    pub fn points(&self) -> Vec<DVec2> {
        match *self {
            Self::MoveTo { x, y } | Self::LineTo { x, y } => vec![DVec2::new(x, y)],
            Self::CubicTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => vec![DVec2::new(x1, y1), DVec2::new(x2, y2), DVec2::new(x, y)],
            Self::QuadTo { x1, y1, x, y } => vec![DVec2::new(x1, y1), DVec2::new(x, y)],
            Self::ArcTo { x, y, .. } => vec![DVec2::new(x, y)],
            Self::Close => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_args_roundtrip() {
        let commands = [
            PathCommand::MoveTo { x: 1.0, y: 2.0 },
            PathCommand::CubicTo {
                x1: 0.0,
                y1: 1.0,
                x2: 2.0,
                y2: 3.0,
                x: 4.0,
                y: 5.0,
            },
            PathCommand::ArcTo {
                rx: 5.0,
                ry: 5.0,
                x_axis_rotation: 0.0,
                large_arc: true,
                sweep: false,
                x: 10.0,
                y: 0.0,
            },
            PathCommand::Close,
        ];
        for cmd in commands {
            assert_eq!(
                PathCommand::from_letter_args(cmd.letter(), &cmd.args()),
                Some(cmd)
            );
        }
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        assert_eq!(PathCommand::from_letter_args("L", &[1.0]), None);
        assert_eq!(PathCommand::from_letter_args("X", &[]), None);
    }
}
