//! Bottom ruler.

use crate::canvas::{Canvas, Stroke, TextStyle, ORANGE};
use crate::geom::Point;
use crate::path::Path;

/// Distance of the ruler baseline from the bottom edge.
pub(crate) const BASELINE_OFFSET: f64 = 30.0;
const MAJOR_TICKS: usize = 10;
const MINOR_DIVISIONS: usize = 100;
const MINOR_HEIGHT: f64 = 2.0;
const LABEL_DROP: f64 = 20.0;

pub(crate) const LABEL_STYLE: TextStyle = TextStyle {
    color: ORANGE,
    size_px: 14.0,
    centered: true,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Tick {
    pub(crate) index: usize,
    pub(crate) x: f64,
    pub(crate) height: f64,
    pub(crate) label: Option<String>,
}

pub(crate) fn baseline(height: f64) -> f64 {
    height - BASELINE_OFFSET
}

/// Major ticks `0..=10`, evenly spread across `width`.
pub(crate) fn ticks(width: f64) -> Vec<Tick> {
    (0..=MAJOR_TICKS)
        .map(|i| Tick {
            index: i,
            x: i as f64 / MAJOR_TICKS as f64 * width,
            height: match i {
                i if i % 5 == 0 => 8.0,
                i if i % 2 == 0 => 5.0,
                _ => 3.0,
            },
            label: (i > 0 && i < MAJOR_TICKS && i % 2 == 0).then(|| format!("+{}", i * 10)),
        })
        .collect()
}

/// x positions of the 1% sub-ticks that don't coincide with a major tick.
pub(crate) fn minor_ticks(width: f64) -> Vec<f64> {
    (0..MINOR_DIVISIONS)
        .filter(|i| i % 10 != 0)
        .map(|i| i as f64 / MINOR_DIVISIONS as f64 * width)
        .collect()
}

pub(crate) fn draw<C: Canvas + ?Sized>(canvas: &mut C, width: f64, height: f64) {
    let y = baseline(height);

    let mut path = Path::new();
    path.move_to(Point::new(0.0, y)).line_to(Point::new(width, y));

    let major = ticks(width);
    for tick in &major {
        path.move_to(Point::new(tick.x, y))
            .line_to(Point::new(tick.x, y + tick.height));
    }
    for x in minor_ticks(width) {
        path.move_to(Point::new(x, y))
            .line_to(Point::new(x, y + MINOR_HEIGHT));
    }
    canvas.stroke(&path, Stroke::CIRCUIT);

    for tick in &major {
        if let Some(label) = &tick.label {
            canvas.fill_text(label, Point::new(tick.x, y + LABEL_DROP), LABEL_STYLE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Recorder;

    #[test]
    fn ticks_are_evenly_spaced() {
        let t = ticks(600.0);
        assert_eq!(t.len(), 11);
        for pair in t.windows(2) {
            assert!((pair[1].x - pair[0].x - 60.0).abs() < 1e-9);
        }
        assert!((t[10].x - 600.0).abs() < 1e-9);
    }

    #[test]
    fn labels_sit_on_even_interior_ticks() {
        let labelled: Vec<_> = ticks(800.0)
            .into_iter()
            .filter_map(|t| t.label.map(|l| (t.index, l)))
            .collect();
        assert_eq!(
            labelled,
            vec![
                (2, "+20".to_string()),
                (4, "+40".to_string()),
                (6, "+60".to_string()),
                (8, "+80".to_string()),
            ]
        );
    }

    #[test]
    fn tick_heights_alternate() {
        let heights: Vec<f64> = ticks(100.0).iter().map(|t| t.height).collect();
        assert_eq!(heights, vec![8.0, 3.0, 5.0, 3.0, 5.0, 8.0, 5.0, 3.0, 5.0, 3.0, 8.0]);
    }

    #[test]
    fn ninety_minor_ticks() {
        let minor = minor_ticks(600.0);
        assert_eq!(minor.len(), 90);
        assert!(minor.windows(2).all(|w| w[1] > w[0]));
        assert!(minor.iter().all(|x| (x / 60.0).fract().abs() > 1e-6));
    }

    #[test]
    fn draws_one_stroke_and_four_labels() {
        let mut rec = Recorder::new(600, 300);
        draw(&mut rec, 600.0, 300.0);
        let strokes: Vec<_> = rec.strokes().collect();
        assert_eq!(strokes.len(), 1);
        // baseline + 11 major + 90 minor
        assert_eq!(strokes[0].0.subpaths(), 102);

        let texts: Vec<_> = rec.texts().collect();
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[0].0, "+20");
        assert!((texts[0].1.x - 120.0).abs() < 1e-9);
        assert!((texts[0].1.y - 290.0).abs() < 1e-9);
    }
}
