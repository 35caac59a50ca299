//! Append-only path builder.
//!
//! A `Path` mirrors the subset of 2D-canvas path semantics the display needs:
//! a pen that only moves forward through lines, quadratic/cubic Béziers and
//! circular arcs. Segments are never re-queried while building, so a long
//! stroke can be threaded through several helpers without restarting it.

use crate::geom::{Point, Rect};
use std::f64::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Seg {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
    CubicTo { c1: Point, c2: Point, to: Point },
    /// Clockwise (screen space) arc. A line joins the pen to the arc start.
    Arc { center: Point, radius: f64, start: f64, end: f64 },
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Path {
    segs: Vec<Seg>,
    pen: Option<Point>,
    subpath_start: Option<Point>,
}

/// Angle swept by a clockwise arc from `start` to `end`, in `[0, TAU]`.
pub(crate) fn arc_sweep(start: f64, end: f64) -> f64 {
    let d = end - start;
    if d >= TAU {
        TAU
    } else {
        d.rem_euclid(TAU)
    }
}

impl Path {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn move_to(&mut self, p: Point) -> &mut Self {
        self.segs.push(Seg::MoveTo(p));
        self.pen = Some(p);
        self.subpath_start = Some(p);
        self
    }

    pub(crate) fn line_to(&mut self, p: Point) -> &mut Self {
        if self.pen.is_none() {
            return self.move_to(p);
        }
        self.segs.push(Seg::LineTo(p));
        self.pen = Some(p);
        self
    }

    pub(crate) fn quad_to(&mut self, ctrl: Point, to: Point) -> &mut Self {
        if self.pen.is_none() {
            self.move_to(ctrl);
        }
        self.segs.push(Seg::QuadTo { ctrl, to });
        self.pen = Some(to);
        self
    }

    pub(crate) fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        if self.pen.is_none() {
            self.move_to(c1);
        }
        self.segs.push(Seg::CubicTo { c1, c2, to });
        self.pen = Some(to);
        self
    }

    pub(crate) fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) -> &mut Self {
        let from = center.polar(radius, start);
        if self.pen.is_none() {
            self.move_to(from);
        }
        self.segs.push(Seg::Arc {
            center,
            radius,
            start,
            end,
        });
        self.pen = Some(center.polar(radius, start + arc_sweep(start, end)));
        self
    }

    /// Full circle as its own subpath.
    pub(crate) fn circle(&mut self, center: Point, radius: f64) -> &mut Self {
        self.move_to(center.polar(radius, 0.0));
        self.arc(center, radius, 0.0, TAU)
    }

    pub(crate) fn rect(&mut self, r: Rect) -> &mut Self {
        self.move_to(Point::new(r.x, r.y));
        self.line_to(Point::new(r.right(), r.y));
        self.line_to(Point::new(r.right(), r.bottom()));
        self.line_to(Point::new(r.x, r.bottom()));
        self.close()
    }

    pub(crate) fn close(&mut self) -> &mut Self {
        if let Some(s) = self.subpath_start {
            self.line_to(s);
        }
        self
    }

    pub(crate) fn segs(&self) -> &[Seg] {
        &self.segs
    }

    /// First point of the first subpath.
    pub(crate) fn start(&self) -> Option<Point> {
        self.segs.iter().find_map(|s| match s {
            Seg::MoveTo(p) => Some(*p),
            _ => None,
        })
    }

    /// Current pen position.
    pub(crate) fn end(&self) -> Option<Point> {
        self.pen
    }

    pub(crate) fn subpaths(&self) -> usize {
        self.segs
            .iter()
            .filter(|s| matches!(s, Seg::MoveTo(_)))
            .count()
    }

    /// Every number fed to the path, control points included, is finite.
    pub(crate) fn all_finite(&self) -> bool {
        self.segs.iter().all(|s| match *s {
            Seg::MoveTo(p) | Seg::LineTo(p) => p.is_finite(),
            Seg::QuadTo { ctrl, to } => ctrl.is_finite() && to.is_finite(),
            Seg::CubicTo { c1, c2, to } => c1.is_finite() && c2.is_finite() && to.is_finite(),
            Seg::Arc {
                center,
                radius,
                start,
                end,
            } => center.is_finite() && radius.is_finite() && start.is_finite() && end.is_finite(),
        })
    }

    /// Flattens the path into one polyline per subpath.
    pub(crate) fn flatten(&self) -> Vec<Vec<Point>> {
        let mut out: Vec<Vec<Point>> = Vec::new();
        let mut cur: Vec<Point> = Vec::new();
        let mut pen = Point::default();

        for seg in &self.segs {
            match *seg {
                Seg::MoveTo(p) => {
                    if cur.len() > 1 {
                        out.push(std::mem::take(&mut cur));
                    }
                    cur.clear();
                    cur.push(p);
                    pen = p;
                }
                Seg::LineTo(p) => {
                    cur.push(p);
                    pen = p;
                }
                Seg::QuadTo { ctrl, to } => {
                    let n = steps_for(pen.dist(ctrl) + ctrl.dist(to));
                    for i in 1..=n {
                        cur.push(quad_at(pen, ctrl, to, i as f64 / n as f64));
                    }
                    pen = to;
                }
                Seg::CubicTo { c1, c2, to } => {
                    let n = steps_for(pen.dist(c1) + c1.dist(c2) + c2.dist(to));
                    for i in 1..=n {
                        cur.push(cubic_at(pen, c1, c2, to, i as f64 / n as f64));
                    }
                    pen = to;
                }
                Seg::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => {
                    let sweep = arc_sweep(start, end);
                    cur.push(center.polar(radius, start));
                    let n = steps_for(sweep * radius.abs());
                    for i in 1..=n {
                        cur.push(center.polar(radius, start + sweep * i as f64 / n as f64));
                    }
                    pen = center.polar(radius, start + sweep);
                }
            }
        }
        if cur.len() > 1 {
            out.push(cur);
        }
        out
    }

    /// Every coordinate that ends up on the stroked outline.
    pub(crate) fn plotted_points(&self) -> Vec<Point> {
        self.flatten().into_iter().flatten().collect()
    }
}

fn steps_for(approx_len: f64) -> usize {
    if !approx_len.is_finite() {
        return 1;
    }
    ((approx_len / 2.0).ceil() as usize).clamp(4, 256)
}

pub(crate) fn quad_at(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

pub(crate) fn cubic_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn pen_follows_segments() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 210.0))
            .cubic_to(Point::new(10.0, 0.0), Point::new(20.0, 0.0), Point::new(30.0, 5.0))
            .line_to(Point::new(40.0, 5.0));
        assert_eq!(p.start(), Some(Point::new(0.0, 210.0)));
        assert_eq!(p.end(), Some(Point::new(40.0, 5.0)));
        assert_eq!(p.subpaths(), 1);
    }

    #[test]
    fn arc_keeps_path_continuous() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 0.0));
        p.arc(Point::new(10.0, 0.0), 5.0, 0.0, PI);
        assert!(close(p.end().unwrap(), Point::new(5.0, 0.0)));
        let lines = p.flatten();
        assert_eq!(lines.len(), 1);
        // Implicit join from the pen to the arc start.
        assert!(close(lines[0][0], Point::new(0.0, 0.0)));
        assert!(close(lines[0][1], Point::new(15.0, 0.0)));
    }

    #[test]
    fn circle_is_its_own_subpath() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 0.0)).line_to(Point::new(1.0, 1.0));
        p.circle(Point::new(50.0, 50.0), 3.0);
        assert_eq!(p.subpaths(), 2);
        let lines = p.flatten();
        assert_eq!(lines.len(), 2);
        let ring = &lines[1];
        assert!(close(ring[0], *ring.last().unwrap()));
        for q in ring {
            assert!((q.dist(Point::new(50.0, 50.0)) - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn sweep_wraps_and_saturates() {
        assert!((arc_sweep(0.0, PI) - PI).abs() < 1e-12);
        assert!((arc_sweep(1.0, 1.0 + 3.0 * PI) - TAU).abs() < 1e-12);
        assert!((arc_sweep(PI, 0.5 * PI) - 1.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn curves_hit_their_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 9.0);
        let c = Point::new(7.0, -2.0);
        let d = Point::new(10.0, 0.0);
        assert!(close(cubic_at(a, b, c, d, 0.0), a));
        assert!(close(cubic_at(a, b, c, d, 1.0), d));
        assert!(close(quad_at(a, b, d, 1.0), d));
    }

    #[test]
    fn non_finite_input_is_detected() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 0.0)).line_to(Point::new(f64::NAN, 1.0));
        assert!(!p.all_finite());
    }

    #[test]
    fn rect_closes() {
        let mut p = Path::new();
        p.rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(p.end(), Some(Point::new(1.0, 2.0)));
        assert_eq!(p.segs().len(), 5);
    }
}
