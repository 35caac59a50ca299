//! Dense tangle inside the neural box.
//!
//! Content is pulled towards an inner rectangle inset by `BUFFER_ZONE`, so the
//! tangle thins out near the border instead of being cut off by it.

use crate::canvas::{Canvas, Stroke};
use crate::generator::{FrameGeometry, GeneratorTuning};
use crate::geom::{Point, Rect};
use crate::path::Path;
use crate::random::{between, chance, count, jitter};
use rand::Rng;
use std::f64::consts::{PI, TAU};

pub(crate) const BUFFER_ZONE: f64 = 20.0;
const FLOW_CURVES: usize = 50;
const LOOPS: usize = 30;
const WAVES: usize = 20;
const BRANCHES: usize = 4;
const VERTICAL_BIAS: f64 = 0.7;
const DOWNWARD_BIAS: f64 = 0.8;
/// Share of flow curves allowed to wander into the buffer zone.
const EDGE_REACH: f64 = 0.3;

/// Per-side shape of the branch fan around a connection point.
struct Fan {
    anchor: Point,
    jumping: bool,
    /// Base angle of the first branch, time rotation included.
    angle0: f64,
    base_len: f64,
    len_span: f64,
    len_wave: f64,
    jump_len: f64,
    ctrl_jitter: f64,
    radius_span: f64,
    jump_radius_span: f64,
}

pub(crate) fn draw<C, R>(
    canvas: &mut C,
    geo: &FrameGeometry,
    time: f64,
    rng: &mut R,
    tuning: &GeneratorTuning,
) where
    C: Canvas + ?Sized,
    R: Rng + ?Sized,
{
    let bx = geo.neural_box;
    let branch_room = bx.inset(-BUFFER_ZONE / 2.0);

    let fans = [
        Fan {
            anchor: geo.left_interior,
            jumping: geo.interior_jumps.left,
            angle0: time * 0.8 + (time * 2.0).sin() * 0.2,
            base_len: 20.0,
            len_span: 15.0,
            len_wave: (time * 1.5).sin() * 5.0,
            jump_len: 40.0,
            ctrl_jitter: 12.0,
            radius_span: 3.0,
            jump_radius_span: 8.0,
        },
        Fan {
            anchor: geo.right_interior,
            jumping: geo.interior_jumps.right,
            angle0: PI + time * 0.6 + (time * 1.7).cos() * 0.3,
            base_len: 15.0,
            len_span: 20.0,
            len_wave: (time * 1.8).cos() * 7.0,
            jump_len: 50.0,
            ctrl_jitter: 15.0,
            radius_span: 4.0,
            jump_radius_span: 10.0,
        },
    ];
    for fan in &fans {
        canvas.stroke(&branches(fan, branch_room, rng, tuning), Stroke::CIRCUIT);
    }

    canvas.stroke(&flow_curves(bx, rng), Stroke::CIRCUIT);

    let mut loops = Path::new();
    for _ in 0..LOOPS {
        let c = Point::new(bx.x + rng.gen::<f64>() * bx.w, bx.y + rng.gen::<f64>() * bx.h);
        loops.circle(c, between(rng, 5.0, 20.0));
    }
    canvas.stroke(&loops, Stroke::CIRCUIT);

    canvas.stroke(&waves(bx, time, rng), Stroke::CIRCUIT);

    let mut marks = Path::new();
    marks.circle(geo.left_interior, 3.0);
    marks.circle(geo.right_interior, 3.0);
    canvas.stroke(&marks, Stroke::CIRCUIT);
}

fn branches<R: Rng + ?Sized>(fan: &Fan, room: Rect, rng: &mut R, tuning: &GeneratorTuning) -> Path {
    let keep = |p: Point| {
        Point::new(
            p.x.clamp(room.x, room.right()),
            p.y.clamp(room.y, room.bottom()),
        )
    };

    let mut path = Path::new();
    for i in 0..BRANCHES {
        let jump = fan.jumping || chance(rng, tuning.branch_jump_chance);
        let angle = fan.angle0 + (PI / 3.0) * i as f64 + if jump { rng.gen::<f64>() * TAU } else { 0.0 };
        let length = fan.base_len
            + rng.gen::<f64>() * fan.len_span
            + fan.len_wave
            + if jump { rng.gen::<f64>() * fan.jump_len } else { 0.0 };

        let end = keep(fan.anchor.polar(length, angle));
        let wobble = if jump { 3.0 } else { 1.0 };
        let ctrl = keep(
            fan.anchor.polar(length * 0.5, angle)
                + Point::new(
                    jitter(rng, fan.ctrl_jitter) * wobble,
                    jitter(rng, fan.ctrl_jitter) * wobble,
                ),
        );

        path.move_to(fan.anchor).quad_to(ctrl, end);
        let span = if jump { fan.jump_radius_span } else { fan.radius_span };
        path.circle(end, 1.0 + rng.gen::<f64>() * span);
    }
    path
}

/// Pulls a coordinate that strayed past the fade edge back inside.
fn contain<R: Rng + ?Sized>(v: f64, lo: f64, hi: f64, reach_edge: bool, rng: &mut R) -> f64 {
    let (soft_lo, soft_hi) = if reach_edge {
        (lo + BUFFER_ZONE / 2.0, hi - BUFFER_ZONE / 2.0)
    } else {
        (lo + BUFFER_ZONE, hi - BUFFER_ZONE)
    };
    let (back_lo, back_hi) = if reach_edge { (lo, hi) } else { (soft_lo, soft_hi) };
    if v < soft_lo {
        back_lo + rng.gen::<f64>() * BUFFER_ZONE
    } else if v > soft_hi {
        back_hi - rng.gen::<f64>() * BUFFER_ZONE
    } else {
        v
    }
}

fn flow_curves<R: Rng + ?Sized>(bx: Rect, rng: &mut R) -> Path {
    let mut path = Path::new();
    for _ in 0..FLOW_CURVES {
        let mut cur = Point::new(
            bx.x + rng.gen::<f64>() * bx.w,
            bx.y + rng.gen::<f64>() * bx.h * 0.3,
        );
        path.move_to(cur);

        for _ in 0..count(rng, 5, 5) {
            let reach_edge = chance(rng, EDGE_REACH);
            let tx = cur.x + (rng.gen::<f64>() - 0.5) * bx.w * 0.25 * (1.0 - VERTICAL_BIAS);
            let tx = contain(tx, bx.x, bx.right(), reach_edge, rng);

            let dir = if chance(rng, DOWNWARD_BIAS) { 1.0 } else { -1.0 };
            let ty = cur.y + dir * rng.gen::<f64>() * bx.h * 0.22 * VERTICAL_BIAS;
            let ty = contain(ty, bx.y, bx.bottom(), reach_edge, rng);

            let target = Point::new(tx, ty);
            let c1 = cur.lerp(target, 0.3) + Point::new(jitter(rng, 15.0), jitter(rng, 15.0));
            let c2 = cur.lerp(target, 0.7) + Point::new(jitter(rng, 15.0), jitter(rng, 15.0));
            path.cubic_to(c1, c2, target);
            cur = target;
        }
    }
    path
}

fn waves<R: Rng + ?Sized>(bx: Rect, time: f64, rng: &mut R) -> Path {
    let mut path = Path::new();
    for _ in 0..WAVES {
        let wy = bx.y + rng.gen::<f64>() * bx.h;
        let amplitude = between(rng, 5.0, 15.0);
        let frequency = between(rng, 0.03, 0.1);
        let phase = rng.gen::<f64>() * TAU;

        path.move_to(Point::new(bx.x, wy));
        let mut dx = 0.0;
        while dx <= bx.w {
            let y = wy + (dx * frequency + phase + time * 0.2).sin() * amplitude;
            path.line_to(Point::new(bx.x + dx, y));
            dx += 5.0;
        }
    }
    path
}
