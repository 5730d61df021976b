use folio_core::transform::NumberScanner;
use glam::DVec2;
use node::PathCommand;

/// Parses SVG path data into absolute [`PathCommand`]s.
///
/// Relative commands are resolved against the current point, `H`/`V` become
/// line segments and `S`/`T` get their reflected control point. Extra
/// coordinate pairs after a move are implicit line-tos. On the first syntax
/// error parsing stops and the commands read so far are returned.
pub fn parse_path_data(data: &str) -> Vec<PathCommand> {
    let mut parser = PathParser::new(data);
    parser.run();
    parser.commands
}

struct PathParser<'a> {
    scanner: NumberScanner<'a>,
    commands: Vec<PathCommand>,
    current: DVec2,
    subpath_start: DVec2,
    /// Second control point of the previous cubic, for `S`.
    last_cubic_ctrl: Option<DVec2>,
    /// Control point of the previous quadratic, for `T`.
    last_quad_ctrl: Option<DVec2>,
}

impl<'a> PathParser<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            scanner: NumberScanner::new(data),
            commands: Vec::new(),
            current: DVec2::ZERO,
            subpath_start: DVec2::ZERO,
            last_cubic_ctrl: None,
            last_quad_ctrl: None,
        }
    }

    fn run(&mut self) {
        let mut previous: Option<u8> = None;
        loop {
            self.scanner.skip_separators();
            let Some(byte) = self.scanner.peek() else {
                return;
            };

            let letter = if byte.is_ascii_alphabetic() {
                self.scanner.advance();
                byte
            } else {
                // A bare number repeats the previous command; after a move the
                // repeat is a line-to.
                match previous {
                    Some(b'M') => b'L',
                    Some(b'm') => b'l',
                    Some(b'Z' | b'z') | None => return,
                    Some(other) => other,
                }
            };

            // The first command must be a move.
            if self.commands.is_empty() && !matches!(letter, b'M' | b'm') {
                return;
            }

            if self.command(letter).is_none() {
                return;
            }
            previous = Some(letter);
        }
    }

    fn command(&mut self, letter: u8) -> Option<()> {
        let relative = letter.is_ascii_lowercase();
        let origin = if relative { self.current } else { DVec2::ZERO };

        match letter.to_ascii_uppercase() {
            b'M' => {
                let p = origin + self.point()?;
                self.push(PathCommand::MoveTo { x: p.x, y: p.y });
                self.subpath_start = p;
                self.current = p;
            }
            b'L' => {
                let p = origin + self.point()?;
                self.line_to(p);
            }
            b'H' => {
                let x = self.scanner.next_number()? + origin.x;
                self.line_to(DVec2::new(x, self.current.y));
            }
            b'V' => {
                let y = self.scanner.next_number()? + origin.y;
                self.line_to(DVec2::new(self.current.x, y));
            }
            b'C' => {
                let c1 = origin + self.point()?;
                let c2 = origin + self.point()?;
                let p = origin + self.point()?;
                self.cubic_to(c1, c2, p);
            }
            b'S' => {
                let c1 = self.reflect(self.last_cubic_ctrl);
                let c2 = origin + self.point()?;
                let p = origin + self.point()?;
                self.cubic_to(c1, c2, p);
            }
            b'Q' => {
                let c = origin + self.point()?;
                let p = origin + self.point()?;
                self.quad_to(c, p);
            }
            b'T' => {
                let c = self.reflect(self.last_quad_ctrl);
                let p = origin + self.point()?;
                self.quad_to(c, p);
            }
            b'A' => {
                let rx = self.scanner.next_number()?;
                let ry = self.scanner.next_number()?;
                let x_axis_rotation = self.scanner.next_number()?;
                let large_arc = self.scanner.next_flag()?;
                let sweep = self.scanner.next_flag()?;
                let p = origin + self.point()?;
                self.push(PathCommand::ArcTo {
                    rx: rx.abs(),
                    ry: ry.abs(),
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x: p.x,
                    y: p.y,
                });
                self.current = p;
            }
            b'Z' => {
                self.push(PathCommand::Close);
                self.current = self.subpath_start;
            }
            _ => return None,
        }
        Some(())
    }

    fn point(&mut self) -> Option<DVec2> {
        let x = self.scanner.next_number()?;
        let y = self.scanner.next_number()?;
        Some(DVec2::new(x, y))
    }

    fn reflect(&self, control: Option<DVec2>) -> DVec2 {
        match control {
            Some(c) => self.current * 2.0 - c,
            None => self.current,
        }
    }

    fn push(&mut self, command: PathCommand) {
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
        self.commands.push(command);
    }

    fn line_to(&mut self, p: DVec2) {
        self.push(PathCommand::LineTo { x: p.x, y: p.y });
        self.current = p;
    }

    fn cubic_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) {
        self.push(PathCommand::CubicTo {
            x1: c1.x,
            y1: c1.y,
            x2: c2.x,
            y2: c2.y,
            x: p.x,
            y: p.y,
        });
        self.last_cubic_ctrl = Some(c2);
        self.current = p;
    }

    fn quad_to(&mut self, c: DVec2, p: DVec2) {
        self.push(PathCommand::QuadTo {
            x1: c.x,
            y1: c.y,
            x: p.x,
            y: p.y,
        });
        self.last_quad_ctrl = Some(c);
        self.current = p;
    }
}
