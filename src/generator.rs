//! Path generator: draws one complete frame of the display.
//!
//! Each call clears the canvas and redraws everything from the time value and
//! fresh random draws; nothing carries over from the previous frame except
//! what the caller passes in.

use crate::canvas::{Canvas, Stroke};
use crate::chaos;
use crate::error::Skip;
use crate::geom::{Point, Rect};
use crate::path::Path;
use crate::random::{between, chance, jitter};
use crate::scale;
use crate::staircase::{self, Walk};
use rand::Rng;
use serde::Deserialize;

/// Horizontal gap between the neural box and the exterior junctions.
pub(crate) const EXTERIOR_OFFSET: f64 = 30.0;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct GeneratorTuning {
    pub(crate) exterior_jump_chance: f64,
    /// Extra per-branch jump chance on top of the side's own jump.
    pub(crate) branch_jump_chance: f64,
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            exterior_jump_chance: 0.1,
            branch_jump_chance: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Jumps {
    pub(crate) left: bool,
    pub(crate) right: bool,
}

/// Junction geometry for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FrameGeometry {
    pub(crate) neural_box: Rect,
    pub(crate) left_interior: Point,
    pub(crate) right_interior: Point,
    pub(crate) left_exterior: Point,
    pub(crate) right_exterior: Point,
    pub(crate) interior_jumps: Jumps,
    pub(crate) exterior_jumps: Jumps,
}

impl FrameGeometry {
    pub(crate) fn is_finite(&self) -> bool {
        [
            self.left_interior,
            self.right_interior,
            self.left_exterior,
            self.right_exterior,
            Point::new(self.neural_box.x, self.neural_box.y),
            Point::new(self.neural_box.w, self.neural_box.h),
        ]
        .iter()
        .all(|p| p.is_finite())
    }
}

/// What one frame drew, beyond the canvas itself.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub(crate) geometry: FrameGeometry,
    pub(crate) walk: Walk,
}

pub(crate) fn neural_box(width: f64, height: f64) -> Rect {
    let left = width * 0.35;
    let right = width * 0.65;
    Rect::new(left, height * 0.12, right - left, height * 0.66)
}

/// Computes interior and exterior junctions. Interior jumps are decided by the
/// caller; exterior jumps are rolled here.
pub(crate) fn connection_points<R: Rng + ?Sized>(
    width: f64,
    height: f64,
    time: f64,
    jumps: Jumps,
    rng: &mut R,
    tuning: &GeneratorTuning,
) -> FrameGeometry {
    let bx = neural_box(width, height);
    let mid_y = bx.mid_y();
    let t = time;

    let left_interior = Point::new(
        bx.x + bx.w * between(rng, 0.1, 0.3) + kick(rng, jumps.left, 40.0),
        mid_y + (t * 1.2).sin() * height * 0.1 + jitter(rng, 25.0) + (t * 0.7).cos() * 8.0
            + kick(rng, jumps.left, 70.0),
    );
    let right_interior = Point::new(
        bx.right() - bx.w * between(rng, 0.1, 0.3) + kick(rng, jumps.right, 40.0),
        mid_y - (t * 0.9).sin() * height * 0.1 + jitter(rng, 30.0) + (t * 1.3).sin() * 12.0
            + kick(rng, jumps.right, 70.0),
    );

    let exterior_jumps = Jumps {
        left: chance(rng, tuning.exterior_jump_chance),
        right: chance(rng, tuning.exterior_jump_chance),
    };
    let base_y = height * 0.4;
    let left_exterior = Point::new(
        bx.x - EXTERIOR_OFFSET,
        base_y + (t * 1.4).sin() * 12.0 + (t * 2.1).cos() * 6.0 + jitter(rng, 5.0)
            + kick(rng, exterior_jumps.left, 50.0),
    );
    let right_exterior = Point::new(
        bx.right() + EXTERIOR_OFFSET,
        base_y + (t * 1.7).sin() * 10.0 + (t * 0.9).cos() * 8.0 + (t * 3.3).sin() * 4.0
            + jitter(rng, 6.0)
            + kick(rng, exterior_jumps.right, 50.0),
    );

    // jumps may throw a junction off a short surface; keep it on the canvas
    let on_surface = |p: Point| Point::new(p.x, p.y.clamp(0.0, height));

    FrameGeometry {
        neural_box: bx,
        left_interior: on_surface(left_interior),
        right_interior: on_surface(right_interior),
        left_exterior: on_surface(left_exterior),
        right_exterior: on_surface(right_exterior),
        interior_jumps: jumps,
        exterior_jumps,
    }
}

fn kick<R: Rng + ?Sized>(rng: &mut R, on: bool, span: f64) -> f64 {
    if on {
        jitter(rng, span)
    } else {
        0.0
    }
}

/// Feed curve from the bottom-left origin to the left exterior junction.
fn left_feed<R: Rng + ?Sized>(width: f64, height: f64, t: f64, ext: Point, rng: &mut R) -> Path {
    let origin = Point::new(0.0, height * 0.7);
    let mid = Point::new(
        width * 0.25,
        height * 0.65 + (t * 1.2).sin() * 15.0 + jitter(rng, 10.0),
    );

    let c1 = Point::new(width * 0.1, height * 0.85 + jitter(rng, 8.0));
    let c2 = Point::new(
        mid.x - width * 0.05 + (t * 1.4).sin() * 3.0,
        mid.y + height * 0.1 + (t * 1.7).cos() * 5.0,
    );
    let c3 = Point::new(
        mid.x + width * 0.05 + (t * 1.6).sin() * 4.0,
        mid.y - height * 0.15 + (t * 1.9).cos() * 8.0,
    );
    let c4 = Point::new(
        ext.x - width * 0.08 + (t * 2.1).sin() * 6.0,
        ext.y + height * 0.1 + (t * 1.3).cos() * 7.0,
    );

    let mut path = Path::new();
    path.move_to(origin).cubic_to(c1, c2, mid).cubic_to(c3, c4, ext);
    path
}

fn left_link<R: Rng + ?Sized>(t: f64, ext: Point, int: Point, rng: &mut R) -> Path {
    let c1 = ext.lerp(int, 0.3)
        + Point::new(
            (t * 1.6).sin() * 9.0 + jitter(rng, 6.0),
            (t * 2.2).cos() * 8.0 + jitter(rng, 5.0),
        );
    let c2 = ext.lerp(int, 0.7)
        + Point::new(
            (t * 1.9).sin() * 7.0 + jitter(rng, 4.0),
            (t * 1.7).cos() * 9.0 + jitter(rng, 5.0),
        );
    let mut path = Path::new();
    path.move_to(ext).cubic_to(c1, c2, int);
    path
}

/// Interior junction → exterior junction → staircase, as one stroke.
fn right_circuit<R: Rng + ?Sized>(
    width: f64,
    height: f64,
    t: f64,
    int: Point,
    ext: Point,
    rng: &mut R,
) -> (Path, Walk) {
    let c1 = int.lerp(ext, 0.3)
        + Point::new(
            (t * 2.0).sin() * 8.0 + (t * 1.3).cos() * 6.0 + jitter(rng, 10.0),
            (t * 1.8).cos() * 7.0 + (t * 3.0).sin() * 5.0 + jitter(rng, 8.0),
        );
    let c2 = int.lerp(ext, 0.7)
        + Point::new(
            (t * 1.5).sin() * 9.0 - (t * 2.5).cos() * 5.0 + jitter(rng, 7.0),
            (t * 2.2).sin() * 7.0 + (t * 1.4).cos() * 8.0 + jitter(rng, 9.0),
        );

    let mut path = Path::new();
    path.move_to(int).cubic_to(c1, c2, ext);
    let walk = staircase::walk(&mut path, ext, width, height, rng);
    (path, walk)
}

/// Clears `canvas` and draws one full frame for a `width`×`height` surface.
pub(crate) fn draw_frame<C, R>(
    canvas: &mut C,
    width: u32,
    height: u32,
    time: f64,
    jumps: Jumps,
    rng: &mut R,
    tuning: &GeneratorTuning,
) -> Result<Frame, Skip>
where
    C: Canvas + ?Sized,
    R: Rng + ?Sized,
{
    if width == 0 || height == 0 {
        return Err(Skip::ZeroExtent { width, height });
    }
    let time = if time.is_finite() { time } else { 0.0 };
    let (w, h) = (width as f64, height as f64);

    canvas.clear();

    let geo = connection_points(w, h, time, jumps, rng, tuning);

    let feed = left_feed(w, h, time, geo.left_exterior, rng);
    canvas.stroke(&feed, Stroke::CIRCUIT);
    canvas.stroke(
        &left_link(time, geo.left_exterior, geo.left_interior, rng),
        Stroke::CIRCUIT,
    );

    chaos::draw(canvas, &geo, time, rng, tuning);

    let (right, walk) = right_circuit(w, h, time, geo.right_interior, geo.right_exterior, rng);
    canvas.stroke(&right, Stroke::CIRCUIT);

    let mut outline = Path::new();
    outline.rect(geo.neural_box);
    canvas.stroke(&outline, Stroke::OUTLINE);

    scale::draw(canvas, w, h);

    Ok(Frame {
        geometry: geo,
        walk,
    })
}
