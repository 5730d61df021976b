//! 2D affine transformation for placing nodes on the canvas
//!
//! A node's transform maps its local geometry into its parent's space. The
//! six coefficients follow the SVG/canvas convention:
//!
//! ```text
//! x' = a·x + c·y + e
//! y' = b·x + d·y + f
//! ```
//!
//! Composition is ordinary matrix multiplication, so `parent.compose(&child)`
//! first applies `child`, then `parent`.

use crate::bounds::Bounds;
use glam::DVec2;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

/// Translate/rotate/scale parts of a transform, as produced by
/// [`AffineTransform::decompose`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decomposed {
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle_degrees: f64,
    pub tx: f64,
    pub ty: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation about the origin, angle in degrees (positive is clockwise in
    /// y-down canvas space).
    pub fn rotate(angle_degrees: f64) -> Self {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Rotation about `(cx, cy)`: `T(cx, cy) · R(angle) · T(-cx, -cy)`.
    pub fn rotate_about(angle_degrees: f64, cx: f64, cy: f64) -> Self {
        Self::translate(cx, cy)
            .compose(&Self::rotate(angle_degrees))
            .compose(&Self::translate(-cx, -cy))
    }

    pub fn skew_x(angle_degrees: f64) -> Self {
        Self::new(1.0, 0.0, angle_degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(angle_degrees: f64) -> Self {
        Self::new(1.0, angle_degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Builds `T(tx, ty) · R(angle) · S(sx, sy)`, the inverse of
    /// [`decompose`](Self::decompose) for skew-free matrices.
    pub fn from_decomposed(parts: Decomposed) -> Self {
        Self::translate(parts.tx, parts.ty)
            .compose(&Self::rotate(parts.angle_degrees))
            .compose(&Self::scale(parts.scale_x, parts.scale_y))
    }

    /// Returns `self ∘ child`: the result applies `child` first, then `self`.
    pub fn compose(&self, child: &AffineTransform) -> AffineTransform {
        AffineTransform {
            a: self.a * child.a + self.c * child.b,
            b: self.b * child.a + self.d * child.b,
            c: self.a * child.c + self.c * child.d,
            d: self.b * child.c + self.d * child.d,
            e: self.a * child.e + self.c * child.f + self.e,
            f: self.b * child.e + self.d * child.f + self.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Splits the matrix into scale, rotation and translation.
    ///
    /// Assumes no skew. With skew present the result is the closest
    /// rotation/scale pair and recomposing it will not reproduce the input.
    /// A reflection (negative determinant) is carried on the y scale so that
    /// [`from_decomposed`](Self::from_decomposed) round-trips.
    pub fn decompose(&self) -> Decomposed {
        let sign = if self.determinant() < 0.0 { -1.0 } else { 1.0 };
        Decomposed {
            scale_x: self.a.hypot(self.b),
            scale_y: sign * self.c.hypot(self.d),
            angle_degrees: self.b.atan2(self.a).to_degrees(),
            tx: self.e,
            ty: self.f,
        }
    }

    pub fn apply(&self, point: DVec2) -> DVec2 {
        DVec2::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    /// Applies the linear part only; vectors are not affected by translation.
    pub fn apply_vector(&self, vector: DVec2) -> DVec2 {
        DVec2::new(
            self.a * vector.x + self.c * vector.y,
            self.b * vector.x + self.d * vector.y,
        )
    }

    /// Axis-aligned hull of the four transformed corners.
    pub fn apply_bounds(&self, bounds: &Bounds) -> Bounds {
        let corners = bounds.corners().map(|p| self.apply(p));
        Bounds::from_points(corners).unwrap_or(*bounds)
    }

    /// Returns `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<AffineTransform> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(AffineTransform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Adds `delta` to the translation terms.
    pub fn pre_translate(&mut self, delta: DVec2) {
        self.e += delta.x;
        self.f += delta.y;
    }

    pub fn translation(&self) -> DVec2 {
        DVec2::new(self.e, self.f)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    pub fn from_array(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Parses an SVG transform list such as `translate(10 20) rotate(45, 5, 5)`.
///
/// Tokens are multiplied left to right in encounter order. Unknown functions,
/// functions with an unusable argument count, and stray words or numbers are
/// skipped. An unclosed argument list ends parsing, keeping what was read.
///
/// `rotate(a, cx)` has an incomplete center and rotates about the origin.
pub fn parse_transform_list(input: &str) -> AffineTransform {
    let mut result = AffineTransform::IDENTITY;
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if name_len == 0 {
            rest = skip_token(rest);
            continue;
        }
        let name = &rest[..name_len];
        let after_name = rest[name_len..].trim_start();

        let Some(args_start) = after_name.strip_prefix('(') else {
            rest = &rest[name_len..];
            continue;
        };
        let Some(close) = args_start.find(')') else {
            break;
        };
        let args = &args_start[..close];
        rest = &args_start[close + 1..];

        let Some(values) = parse_number_list(args) else {
            continue;
        };
        if let Some(token) = transform_function(name, &values) {
            result = result.compose(&token);
        }
    }

    result
}

/// Drops the leading non-name token, up to the next separator or letter.
fn skip_token(input: &str) -> &str {
    let end = input
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_whitespace() || c == ',' || c.is_ascii_alphabetic())
        .map_or(input.len(), |(i, _)| i);
    &input[end..]
}

fn transform_function(name: &str, v: &[f64]) -> Option<AffineTransform> {
    match (name, v.len()) {
        ("translate", 1) => Some(AffineTransform::translate(v[0], 0.0)),
        ("translate", 2) => Some(AffineTransform::translate(v[0], v[1])),
        ("scale", 1) => Some(AffineTransform::scale(v[0], v[0])),
        ("scale", 2) => Some(AffineTransform::scale(v[0], v[1])),
        ("rotate", 1 | 2) => Some(AffineTransform::rotate(v[0])),
        ("rotate", 3) => Some(AffineTransform::rotate_about(v[0], v[1], v[2])),
        ("skewX", 1) => Some(AffineTransform::skew_x(v[0])),
        ("skewY", 1) => Some(AffineTransform::skew_y(v[0])),
        ("matrix", 6) => Some(AffineTransform::new(v[0], v[1], v[2], v[3], v[4], v[5])),
        _ => None,
    }
}

/// Parses a comma/whitespace separated list of numbers, including the compact
/// SVG form where a sign starts a new number (`10-5` is `[10, -5]`).
///
/// Returns `None` if any part of the input is not a number.
pub fn parse_number_list(input: &str) -> Option<Vec<f64>> {
    let mut scanner = NumberScanner::new(input);
    let mut values = Vec::new();
    loop {
        scanner.skip_separators();
        if scanner.is_at_end() {
            return Some(values);
        }
        values.push(scanner.next_number()?);
    }
}

/// Cursor over SVG number syntax, shared by transform and path-data parsing.
pub struct NumberScanner<'a> {
    bytes: &'a [u8],
    src: &'a str,
    pos: usize,
}

impl<'a> NumberScanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            src,
            pos: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    pub fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// True if the next byte can begin a number.
    pub fn at_number(&self) -> bool {
        matches!(self.peek(), Some(b'0'..=b'9' | b'-' | b'+' | b'.'))
    }

    /// Reads a single `0`/`1` flag as used by arc commands, which may be
    /// packed without separators.
    pub fn next_flag(&mut self) -> Option<bool> {
        self.skip_separators();
        let flag = match self.peek()? {
            b'0' => false,
            b'1' => true,
            _ => return None,
        };
        self.pos += 1;
        Some(flag)
    }

    pub fn next_number(&mut self) -> Option<f64> {
        self.skip_separators();
        let start = self.pos;

        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        let mut digits = self.eat_digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            digits += self.eat_digits();
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exp_start = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'-' | b'+')) {
                self.pos += 1;
            }
            if self.eat_digits() == 0 {
                self.pos = exp_start;
            }
        }

        self.src[start..self.pos].parse::<f64>().ok()
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    fn assert_transform_close(a: AffineTransform, b: AffineTransform) {
        for (x, y) in a.to_array().into_iter().zip(b.to_array()) {
            assert_close(x, y);
        }
    }

    #[test]
    fn test_identity_transform() {
        let transform = AffineTransform::identity();
        let point = DVec2::new(10.0, 20.0);
        assert_eq!(transform.apply(point), point);
    }

    #[test]
    fn test_composition_order() {
        let t = AffineTransform::translate(10.0, 0.0);
        let s = AffineTransform::scale(2.0, 2.0);
        let p = DVec2::new(1.0, 1.0);

        // scale first, then translate
        assert_eq!(t.compose(&s).apply(p), DVec2::new(12.0, 2.0));
        // translate first, then scale
        assert_eq!(s.compose(&t).apply(p), DVec2::new(22.0, 2.0));
    }

    #[test]
    fn test_composition_is_associative() {
        let a = AffineTransform::rotate(30.0);
        let b = AffineTransform::translate(4.0, -2.0);
        let c = AffineTransform::scale(1.5, 0.5);
        assert_transform_close(a.compose(&b).compose(&c), a.compose(&b.compose(&c)));
    }

    #[test]
    fn test_decompose_translate_scale() {
        for (tx, ty, sx, sy) in [
            (10.0, 20.0, 2.0, 3.0),
            (-5.5, 0.0, 0.25, 4.0),
            (0.0, -100.0, 1.0, 1.0),
        ] {
            let m = AffineTransform::translate(tx, ty).compose(&AffineTransform::scale(sx, sy));
            let parts = m.decompose();
            assert_close(parts.scale_x, sx);
            assert_close(parts.scale_y, sy);
            assert_close(parts.angle_degrees, 0.0);
            assert_close(parts.tx, tx);
            assert_close(parts.ty, ty);
        }
    }

    #[test]
    fn test_decompose_rotation_roundtrip() {
        let parts = Decomposed {
            scale_x: 2.0,
            scale_y: 0.5,
            angle_degrees: 35.0,
            tx: 7.0,
            ty: -3.0,
        };
        let m = AffineTransform::from_decomposed(parts);
        let back = m.decompose();
        assert_close(back.scale_x, 2.0);
        assert_close(back.scale_y, 0.5);
        assert_close(back.angle_degrees, 35.0);
        assert_transform_close(AffineTransform::from_decomposed(back), m);
    }

    #[test]
    fn test_decompose_reflection() {
        let m = AffineTransform::scale(1.0, -2.0);
        let parts = m.decompose();
        assert_close(parts.scale_x, 1.0);
        assert_close(parts.scale_y, -2.0);
        assert_transform_close(AffineTransform::from_decomposed(parts), m);
    }

    #[test]
    fn test_decompose_with_skew_does_not_fail() {
        let parts = AffineTransform::skew_x(30.0).decompose();
        assert!(parts.scale_x.is_finite());
        assert!(parts.scale_y.is_finite());
    }

    #[test]
    fn test_inverse() {
        let m = AffineTransform::translate(5.0, 6.0)
            .compose(&AffineTransform::rotate(40.0))
            .compose(&AffineTransform::scale(2.0, 3.0));
        let inv = m.inverse().unwrap();
        assert_transform_close(m.compose(&inv), AffineTransform::IDENTITY);
        assert!(AffineTransform::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_apply_bounds_rotated() {
        let bounds = Bounds::from_origin_size(DVec2::ZERO, DVec2::new(10.0, 10.0));
        let rotated = AffineTransform::rotate(90.0).apply_bounds(&bounds);
        assert_close(rotated.min.x, -10.0);
        assert_close(rotated.max.x, 0.0);
        assert_close(rotated.min.y, 0.0);
        assert_close(rotated.max.y, 10.0);
    }

    #[test]
    fn test_parse_transform_list_order() {
        let m = parse_transform_list("translate(10, 20) scale(2)");
        assert_transform_close(
            m,
            AffineTransform::translate(10.0, 20.0).compose(&AffineTransform::scale(2.0, 2.0)),
        );
        assert_eq!(m.apply(DVec2::new(1.0, 1.0)), DVec2::new(12.0, 22.0));
    }

    #[test]
    fn test_parse_rotate_about_center() {
        let m = parse_transform_list("rotate(90 10 10)");
        let p = m.apply(DVec2::new(20.0, 10.0));
        assert_close(p.x, 10.0);
        assert_close(p.y, 20.0);
    }

    #[test]
    fn test_parse_rotate_with_incomplete_center() {
        let m = parse_transform_list("rotate(90, 10)");
        assert_transform_close(m, AffineTransform::rotate(90.0));
    }

    #[test]
    fn test_parse_ignores_unknown_tokens() {
        let m = parse_transform_list("perspective(3) translate(5) wobble(1,2)");
        assert_transform_close(m, AffineTransform::translate(5.0, 0.0));
        assert!(parse_transform_list("").is_identity());
        assert!(parse_transform_list("translate(1, 2").is_identity());
    }

    #[test]
    fn test_parse_skips_stray_words_and_numbers() {
        let expected =
            AffineTransform::translate(10.0, 0.0).compose(&AffineTransform::scale(2.0, 2.0));
        assert_eq!(expected.to_array(), [2.0, 0.0, 0.0, 2.0, 10.0, 0.0]);

        for input in [
            "translate(10, 0) bogus scale(2)",
            "translate(10, 0) 7 scale(2)",
            "translate(10, 0),-7.5e3,scale(2)",
            "bogus translate(10, 0) ) scale(2) tail",
        ] {
            assert_transform_close(parse_transform_list(input), expected);
        }
    }

    #[test]
    fn test_parse_matrix_and_compact_numbers() {
        let m = parse_transform_list("matrix(1 0 0 1 10-5)");
        assert_transform_close(m, AffineTransform::translate(10.0, -5.0));
        assert_eq!(parse_number_list("1.5e2,-.5 3"), Some(vec![150.0, -0.5, 3.0]));
        assert_eq!(parse_number_list("1 two"), None);
    }
}
