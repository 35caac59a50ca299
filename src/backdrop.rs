//! Layers around the generated frame: green measurement lines behind it and
//! a grid of crosshairs on top. Both work on whole cells, after the frame's
//! dots have been encoded.

use crate::canvas::{Rgba, GREEN};
use crate::render::{term_color, Cell, CellBuffer};
use crossterm::style::Color;

pub(crate) const LINE_POSITIONS: [f64; 10] = [0.05, 0.15, 0.25, 0.35, 0.45, 0.55, 0.65, 0.75, 0.85, 0.95];
const CROSSHAIR_COLS: u16 = 5;
const CROSSHAIR_ROWS: u16 = 4;
const CROSSHAIR_OPACITY: f32 = 0.8;

/// Cell columns of the measurement lines across `cols`.
pub(crate) fn line_columns(cols: u16) -> Vec<u16> {
    let mut out: Vec<u16> = LINE_POSITIONS
        .iter()
        .map(|p| (p * cols as f64 + 1e-9).floor() as u16)
        .filter(|&x| x < cols)
        .collect();
    out.dedup();
    out
}

/// Cell positions of the crosshairs, row-major.
pub(crate) fn crosshair_cells(cols: u16, rows: u16) -> Vec<(u16, u16)> {
    let at = |i: u16, n: u16, extent: u16| ((i as f64 + 0.5) / n as f64 * extent as f64 + 1e-9).floor() as u16;
    let mut out = Vec::with_capacity((CROSSHAIR_COLS * CROSSHAIR_ROWS) as usize);
    if cols == 0 || rows == 0 {
        return out;
    }
    for y in 0..CROSSHAIR_ROWS {
        for x in 0..CROSSHAIR_COLS {
            out.push((at(x, CROSSHAIR_COLS, cols), at(y, CROSSHAIR_ROWS, rows)));
        }
    }
    out
}

fn green(enable_color: bool, opacity: f32) -> Color {
    if enable_color {
        term_color(Rgba {
            a: GREEN.a * opacity,
            ..GREEN
        })
    } else {
        Color::White
    }
}

/// Draws the lines into the top `rows` rows, only where the frame left a cell empty.
pub(crate) fn draw_lines(buf: &mut CellBuffer, rows: u16, enable_color: bool) {
    let fg = green(enable_color, 1.0);
    for x in line_columns(buf.w) {
        for y in 0..rows.min(buf.h) {
            let Some(cell) = buf.get(x, y) else { continue };
            if cell.is_blank() {
                buf.set(
                    x,
                    y,
                    Cell {
                        ch: '│',
                        fg,
                        ..cell
                    },
                );
            }
        }
    }
}

pub(crate) fn draw_crosshairs(buf: &mut CellBuffer, rows: u16, enable_color: bool) {
    let fg = green(enable_color, CROSSHAIR_OPACITY);
    for (x, y) in crosshair_cells(buf.w, rows.min(buf.h)) {
        if let Some(cell) = buf.get(x, y) {
            buf.set(
                x,
                y,
                Cell {
                    ch: '+',
                    fg,
                    ..cell
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_lines_at_the_tenths() {
        assert_eq!(line_columns(100), vec![5, 15, 25, 35, 45, 55, 65, 75, 85, 95]);
        assert!(line_columns(3).len() <= 3);
        assert!(line_columns(0).is_empty());
    }

    #[test]
    fn crosshairs_form_a_five_by_four_grid() {
        let cells = crosshair_cells(100, 40);
        assert_eq!(cells.len(), 20);
        assert_eq!(cells[0], (10, 5));
        assert_eq!(cells[4], (90, 5));
        assert_eq!(cells[19], (90, 35));
        assert!(crosshair_cells(0, 10).is_empty());
    }

    #[test]
    fn lines_stay_behind_the_frame() {
        let mut buf = CellBuffer::new(20, 6);
        let inked = Cell {
            ch: '\u{28FF}',
            ..Cell::default()
        };
        buf.set(1, 2, inked);
        draw_lines(&mut buf, 5, false);

        assert_eq!(buf.get(1, 2), Some(inked));
        assert_eq!(buf.get(1, 0).map(|c| c.ch), Some('│'));
        assert_eq!(buf.get(3, 4).map(|c| c.ch), Some('│'));
        // status row untouched
        assert_eq!(buf.get(1, 5).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn crosshairs_sit_on_top() {
        let mut buf = CellBuffer::new(100, 41);
        for c in &mut buf.cells {
            c.ch = '\u{28FF}';
        }
        draw_crosshairs(&mut buf, 40, true);
        let plus = buf.cells.iter().filter(|c| c.ch == '+').count();
        assert_eq!(plus, 20);
        let c = buf.get(50, 25).unwrap();
        assert_eq!(c.ch, '+');
        assert!(matches!(c.fg, Color::Rgb { r: 0, g, b: 0 } if g > 150));
        assert!(buf.cells.iter().filter(|c| c.ch == '+').all(|c| !c.bold));
    }
}
