//! The right circuit's walk from the exterior junction to the right edge.
//!
//! The remaining distance is cut into 7..=12 uneven steps. Most steps are a
//! jittered stair (across, then down); at least two are replaced by an
//! "outburst" drawn with one of four patterns. Everything is appended to the
//! caller's path so the whole circuit stays a single stroke.

use crate::geom::Point;
use crate::path::Path;
use crate::random::{between, chance, count, jitter, sign};
use rand::Rng;
use std::f64::consts::{PI, TAU};

/// How far past `0.95 * width` the walk may run before steps are cut short.
pub(crate) const RIGHT_OVERRUN: f64 = 20.0;
/// Space kept free above the bottom edge for the scale.
pub(crate) const BOTTOM_RESERVE: f64 = 60.0;
/// The stair baseline never drops below the scale line.
const FLOOR_OFFSET: f64 = 30.0;
/// Room kept above the stair baseline for outburst excursions.
const TOP_RESERVE: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pattern {
    SineWave,
    SquareWave,
    CurvedBurst,
    Zigzag,
}

impl Pattern {
    pub(crate) const ALL: [Pattern; 4] = [
        Pattern::SineWave,
        Pattern::SquareWave,
        Pattern::CurvedBurst,
        Pattern::Zigzag,
    ];

    pub(crate) fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Segment sizes and outburst flags for one walk.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Plan {
    pub(crate) widths: Vec<f64>,
    pub(crate) heights: Vec<f64>,
    pub(crate) outbursts: Vec<bool>,
}

impl Plan {
    pub(crate) fn len(&self) -> usize {
        self.widths.len()
    }
}

/// Result of a walk, for callers that want to inspect what was drawn.
#[derive(Clone, Debug)]
pub(crate) struct Walk {
    pub(crate) plan: Plan,
    /// Pattern used by each outburst, in order of appearance.
    pub(crate) patterns: Vec<Pattern>,
    /// Sweep of every decorative arc spliced into the path.
    pub(crate) arc_sweeps: Vec<f64>,
    pub(crate) end: Point,
    /// Whether a closing horizontal run to `0.95 * width` was appended.
    pub(crate) closed: bool,
}

/// Splits `total_w`/`total_h` into 7..=12 randomly weighted pieces.
pub(crate) fn partition<R: Rng + ?Sized>(rng: &mut R, total_w: f64, total_h: f64) -> Plan {
    let n = count(rng, 7, 6);
    let mut widths = Vec::with_capacity(n);
    let mut heights = Vec::with_capacity(n);
    for _ in 0..n {
        widths.push(between(rng, 0.5, 1.5));
        heights.push(between(rng, 0.5, 1.5));
    }
    normalize(&mut widths, total_w);
    normalize(&mut heights, total_h);
    let outbursts = flag_outbursts(rng, n);
    Plan {
        widths,
        heights,
        outbursts,
    }
}

fn normalize(weights: &mut [f64], total: f64) {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return;
    }
    for w in weights.iter_mut() {
        *w = *w / sum * total;
    }
}

/// Flags each segment with its own 10..40% chance, then tops up to two flags.
pub(crate) fn flag_outbursts<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<bool> {
    let mut flags: Vec<bool> = (0..n)
        .map(|_| {
            let p = between(rng, 0.1, 0.4);
            chance(rng, p)
        })
        .collect();
    let want = n.min(2);
    let mut have = flags.iter().filter(|f| **f).count();
    while have < want {
        let free: Vec<usize> = (0..n).filter(|&i| !flags[i]).collect();
        flags[free[rng.gen_range(0..free.len())]] = true;
        have += 1;
    }
    flags
}

struct Walker<'a> {
    path: &'a mut Path,
    arc_sweeps: Vec<f64>,
}

impl Walker<'_> {
    /// Splices a partial arc into the path and returns to `back`.
    fn loop_at(&mut self, center: Point, radius: f64, start: f64, sweep: f64, back: Point) {
        let sweep = sweep.min(TAU * 0.95);
        self.path.line_to(center.polar(radius, start));
        self.path.arc(center, radius, start, start + sweep);
        self.path.line_to(back);
        self.arc_sweeps.push(sweep);
    }

    fn sine<R: Rng + ?Sized>(&mut self, rng: &mut R, start: Point, width: f64) {
        let cycles = between(rng, 0.5, 3.5);
        let amplitude = between(rng, 10.0, 50.0);
        let points = count(rng, 10, 20);

        for j in 0..=points {
            let f = j as f64 / points as f64;
            let p = Point::new(
                start.x + f * width,
                start.y + (f * TAU * cycles).sin() * amplitude + jitter(rng, 5.0),
            );
            self.path.line_to(p);

            if chance(rng, 0.07) && j > 0 && j + 1 < points {
                let r = between(rng, 3.0, 11.0);
                let a = rng.gen::<f64>() * PI;
                let sweep = PI * between(rng, 0.3, 1.5);
                self.loop_at(p, r, a, sweep, p);
            }
        }
    }

    fn square<R: Rng + ?Sized>(&mut self, rng: &mut R, start: Point, width: f64) {
        let steps = count(rng, 2, 4);
        let step_w = width / steps as f64;
        let vertical_scale = between(rng, 0.4, 1.0);

        for j in 0..steps {
            let j = j as f64;
            let h = between(rng, 10.0, 40.0) * vertical_scale * sign(rng);
            let rise_x = start.x + j * step_w + step_w * 0.4;
            let fall_x = start.x + (j + 1.0) * step_w;

            self.path.line_to(Point::new(rise_x, start.y));
            let top = start.y + h + jitter(rng, 4.0);
            self.path.line_to(Point::new(rise_x, top));
            self.path.line_to(Point::new(fall_x, top));
            let corner = Point::new(fall_x, start.y + jitter(rng, 4.0));
            self.path.line_to(corner);

            if chance(rng, 0.25) {
                let r = between(rng, 2.0, 8.0);
                let a = rng.gen::<f64>() * PI;
                let sweep = PI * between(rng, 0.5, 1.3);
                self.loop_at(corner, r, a, sweep, corner);
            }
        }

        self.path
            .line_to(Point::new(start.x + width, start.y + jitter(rng, 6.0)));
    }

    fn curved<R: Rng + ?Sized>(&mut self, rng: &mut R, start: Point, width: f64) {
        let c1 = Point::new(
            start.x + width * between(rng, 0.2, 0.5),
            start.y - between(rng, 10.0, 70.0),
        );
        let c2 = Point::new(
            start.x + width * between(rng, 0.6, 0.9),
            start.y + between(rng, 10.0, 70.0),
        );
        let end = Point::new(start.x + width, start.y);
        self.path.cubic_to(c1, c2, end);

        for _ in 0..count(rng, 2, 4) {
            let center = Point::new(start.x + width * rng.gen::<f64>(), start.y + jitter(rng, 80.0));
            let r = between(rng, 3.0, 15.0);
            let a = rng.gen::<f64>() * TAU;
            let sweep = PI * between(rng, 0.5, 1.7);
            self.loop_at(center, r, a, sweep, end);
        }
    }

    fn zigzag<R: Rng + ?Sized>(&mut self, rng: &mut R, start: Point, width: f64) {
        let teeth = count(rng, 3, 5);
        let tooth_w = width / teeth as f64;

        for z in 0..teeth {
            let z = z as f64;
            let h = sign(rng) * between(rng, 10.0, 40.0);
            let peak = Point::new(start.x + (z + 0.5) * tooth_w, start.y + h);
            let base = Point::new(start.x + (z + 1.0) * tooth_w, start.y);

            if chance(rng, 0.6) {
                let c1 = Point::new(start.x + z * tooth_w + tooth_w * 0.25, start.y + h * 0.8);
                self.path.quad_to(c1, peak);
                let c2 = Point::new(peak.x + tooth_w * 0.25, start.y + h);
                self.path.quad_to(c2, base);
            } else {
                self.path
                    .line_to(Point::new(peak.x, peak.y + jitter(rng, 6.0)));
                self.path.line_to(base);
            }

            if chance(rng, 0.2) {
                let r = between(rng, 3.0, 11.0);
                let a = rng.gen::<f64>() * TAU;
                let sweep = PI * between(rng, 0.4, 1.4);
                self.loop_at(peak, r, a, sweep, peak);
            }
        }
    }
}

/// Walks from `from` towards the right edge of a `width`×`height` surface,
/// appending to `path` (whose pen is expected to sit at `from`).
pub(crate) fn walk<R: Rng + ?Sized>(
    path: &mut Path,
    from: Point,
    width: f64,
    height: f64,
    rng: &mut R,
) -> Walk {
    let edge = width * 0.95;
    let limit = edge + RIGHT_OVERRUN;
    let floor = (height - FLOOR_OFFSET).max(0.0);
    let top = TOP_RESERVE.min(floor);
    let settle = |y: f64| y.clamp(top, floor);

    let plan = partition(rng, edge - from.x, (height - BOTTOM_RESERVE) - from.y);

    let mut w = Walker {
        path,
        arc_sweeps: Vec::new(),
    };
    let mut patterns = Vec::new();
    let mut x = from.x;
    let mut y = settle(from.y);

    for i in 0..plan.len() {
        let seg_w = plan.widths[i];
        let seg_h = plan.heights[i];

        if !plan.outbursts[i] {
            let jx = if chance(rng, 0.3) { jitter(rng, 8.0) } else { 0.0 };
            let jy = if chance(rng, 0.3) { jitter(rng, 8.0) } else { 0.0 };
            let slope = if chance(rng, 0.3) { jitter(rng, 10.0) } else { 0.0 };

            let next_x = (x + seg_w + jx).min(limit);
            let mid_y = y + slope;
            w.path.line_to(Point::new(next_x, mid_y));

            let next_y = settle(mid_y + seg_h + jy);
            if chance(rng, 0.3) {
                let ctrl = Point::new(next_x + jitter(rng, 20.0), (mid_y + next_y) / 2.0);
                w.path.quad_to(ctrl, Point::new(next_x, next_y));
            } else {
                w.path.line_to(Point::new(next_x, next_y));
            }
            y = next_y;

            if chance(rng, 0.15) {
                let size = between(rng, 5.0, 15.0);
                let center = Point::new(next_x - size / 2.0, y - size / 2.0);
                let a = rng.gen::<f64>() * PI;
                let sweep = PI * between(rng, 0.5, 1.5);
                w.loop_at(center, size, a, sweep, Point::new(next_x, y));
            }
            x = next_x;
        } else {
            let burst_w = (seg_w * between(rng, 0.8, 2.0)).min((limit - x).max(0.0));
            let start = Point::new(x, y);
            let pattern = Pattern::pick(rng);
            match pattern {
                Pattern::SineWave => w.sine(rng, start, burst_w),
                Pattern::SquareWave => w.square(rng, start, burst_w),
                Pattern::CurvedBurst => w.curved(rng, start, burst_w),
                Pattern::Zigzag => w.zigzag(rng, start, burst_w),
            }
            patterns.push(pattern);

            x = start.x + burst_w;
            if chance(rng, 0.7) {
                y = settle(y + seg_h + jitter(rng, 10.0));
                w.path.line_to(Point::new(x, y));
            }
        }
    }

    // Decorations can leave the pen behind the stair cursor, so close from the pen.
    let pen = w.path.end().unwrap_or(Point::new(x, y));
    let closed = pen.x < edge;
    if closed {
        w.path.line_to(Point::new(edge, y));
    }
    let end = w.path.end().unwrap_or(pen);

    Walk {
        plan,
        patterns,
        arc_sweeps: w.arc_sweeps,
        end,
        closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Seg;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn partition_is_normalized() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = partition(&mut rng, 180.0, 60.0);
            assert!((7..=12).contains(&plan.len()));
            let sw: f64 = plan.widths.iter().sum();
            let sh: f64 = plan.heights.iter().sum();
            assert!(((sw - 180.0) / 180.0).abs() < 1e-6);
            assert!(((sh - 60.0) / 60.0).abs() < 1e-6);
            // weights are drawn from 0.5..1.5, so no piece is more than 3x another
            let min = plan.widths.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = plan.widths.iter().cloned().fold(0.0, f64::max);
            assert!(max <= min * 3.0 + 1e-9);
        }
    }

    #[test]
    fn negative_totals_are_still_normalized() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = partition(&mut rng, 50.0, -40.0);
        let sh: f64 = plan.heights.iter().sum();
        assert!((sh + 40.0).abs() < 1e-9);
        assert!(plan.heights.iter().all(|h| *h < 0.0));
    }

    #[test]
    fn at_least_two_outbursts() {
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            for n in 2..=12 {
                let flags = flag_outbursts(&mut rng, n);
                assert_eq!(flags.len(), n);
                assert!(flags.iter().filter(|f| **f).count() >= 2);
            }
        }
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(flag_outbursts(&mut rng, 1), vec![true]);
        assert!(flag_outbursts(&mut rng, 0).is_empty());
    }

    #[test]
    fn every_pattern_shows_up() {
        let mut rng = StdRng::seed_from_u64(77);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let p = Pattern::pick(&mut rng);
            seen[Pattern::ALL.iter().position(|q| *q == p).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    fn run(seed: u64, width: f64, height: f64) -> (Path, Walk) {
        let mut rng = StdRng::seed_from_u64(seed);
        let from = Point::new(width * 0.65 + 30.0, height * 0.4);
        let mut path = Path::new();
        path.move_to(from);
        let walk = walk(&mut path, from, width, height, &mut rng);
        (path, walk)
    }

    #[test]
    fn walk_reaches_the_right_edge() {
        for seed in 0..300 {
            let (path, walk) = run(seed, 600.0, 300.0);
            assert!(walk.end.x >= 570.0 - 1e-9, "seed {seed} ended at {:?}", walk.end);
            assert_eq!(path.end(), Some(walk.end));
            assert!(walk.patterns.len() >= 2);
            assert_eq!(
                walk.patterns.len(),
                walk.plan.outbursts.iter().filter(|f| **f).count()
            );
        }
    }

    #[test]
    fn walk_is_one_unbroken_stroke() {
        for seed in 0..100 {
            let (path, _) = run(seed, 800.0, 400.0);
            assert_eq!(path.subpaths(), 1);
            assert!(path.all_finite());
        }
    }

    #[test]
    fn decorative_arcs_never_close() {
        for seed in 0..300 {
            let (path, walk) = run(seed, 600.0, 300.0);
            assert!(walk.arc_sweeps.iter().all(|s| *s > 0.0 && *s < TAU));
            for seg in path.segs() {
                if let Seg::Arc { start, end, .. } = *seg {
                    assert!(end - start < TAU);
                }
            }
        }
    }

    #[test]
    fn short_surfaces_keep_outbursts_in_the_margin() {
        for height in [60.0, 72.0, 96.0, 120.0] {
            for from_y in [-20.0, 0.0, 12.0, height * 0.4] {
                for seed in 0..150 {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let from = Point::new(330.0, from_y);
                    let mut path = Path::new();
                    path.move_to(from);
                    walk(&mut path, from, 480.0, height, &mut rng);
                    for p in path.plotted_points() {
                        assert!(
                            p.y >= -40.0 && p.y <= height + 40.0,
                            "{height} from {from_y} seed {seed}: {p:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn walk_stays_near_the_surface() {
        for seed in 0..300 {
            let (path, _) = run(seed, 600.0, 300.0);
            for p in path.plotted_points() {
                assert!(p.x >= -40.0 && p.x <= 640.0, "seed {seed}: {p:?}");
                assert!(p.y >= -40.0 && p.y <= 340.0, "seed {seed}: {p:?}");
            }
        }
    }
}
