use crate::canvas::{Canvas, Rgba, Stroke, TextStyle};
use crate::display::Container;
use crate::geom::Point;
use crate::path::Path;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Surface units per braille dot. Keeps the generator's pixel constants
/// proportionate on a terminal-sized canvas.
pub(crate) const UNITS_PER_DOT: f64 = 3.0;

/// Longest run of dots plotted for one line segment.
const MAX_SEGMENT_DOTS: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

impl Cell {
    /// No braille dot and no glyph: something drawn behind may show through.
    pub(crate) fn is_blank(&self) -> bool {
        self.ch == ' ' || self.ch == '\u{2800}'
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
            c.bold = false;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba> for Pixel {
    fn from(c: Rgba) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: (c.a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        }
    }
}

/// Text queued on the canvas; placed onto cells after the dots are encoded.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Label {
    pub(crate) text: String,
    pub(crate) at: Point,
    pub(crate) style: TextStyle,
}

/// Braille-resolution raster that the generator draws into.
///
/// The surface is measured in units; one dot covers `UNITS_PER_DOT` units
/// in each direction.
#[derive(Default)]
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
    pub(crate) labels: Vec<Label>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        let mut canvas = Self::default();
        canvas.resize(w, h);
        canvas
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    fn to_dots(p: Point) -> (f64, f64) {
        (p.x / UNITS_PER_DOT, p.y / UNITS_PER_DOT)
    }

    /// Plots one polyline, touching each dot at most once per segment run.
    fn polyline(&mut self, points: &[Point], ink: Pixel) {
        let mut last: Option<(i32, i32)> = None;
        for pair in points.windows(2) {
            let (x0, y0) = Self::to_dots(pair[0]);
            let (x1, y1) = Self::to_dots(pair[1]);
            if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
                last = None;
                continue;
            }
            let steps = ((x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize).clamp(1, MAX_SEGMENT_DOTS);
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                let dot = (
                    (x0 + (x1 - x0) * t).floor() as i32,
                    (y0 + (y1 - y0) * t).floor() as i32,
                );
                if last != Some(dot) {
                    self.blend_over(dot.0, dot.1, ink);
                    last = Some(dot);
                }
            }
        }
    }
}

impl Canvas for PixelCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.w = (width as f64 / UNITS_PER_DOT).ceil() as u32;
        self.h = (height as f64 / UNITS_PER_DOT).ceil() as u32;
        self.px = vec![Pixel::default(); (self.w as usize) * (self.h as usize)];
        self.labels.clear();
    }

    fn clear(&mut self) {
        self.px.fill(Pixel::default());
        self.labels.clear();
    }

    fn stroke(&mut self, path: &Path, style: Stroke) {
        // hairlines fade instead of thinning below one dot
        let mut ink = Pixel::from(style.color);
        ink.a = (ink.a as f64 * style.width.clamp(0.0, 1.0)).round() as u8;
        for line in path.flatten() {
            self.polyline(&line, ink);
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) {
        if at.is_finite() {
            self.labels.push(Label {
                text: text.to_string(),
                at,
                style,
            });
        }
    }
}

/// The region of the terminal the display occupies, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
}

impl Container for Viewport {
    fn content_size(&self) -> (u32, u32) {
        (
            (self.cols as f64 * 2.0 * UNITS_PER_DOT) as u32,
            (self.rows as f64 * 4.0 * UNITS_PER_DOT) as u32,
        )
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Cells left for the display after the status line and `margin_rows`.
    pub(crate) fn viewport(&self, margin_rows: u16) -> Viewport {
        Viewport {
            cols: self.cols,
            rows: self.rows.saturating_sub(1).saturating_sub(margin_rows),
        }
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 dots -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Straight-alpha color flattened onto black.
pub(crate) fn term_color(c: Rgba) -> Color {
    let a = c.a.clamp(0.0, 1.0);
    let ch = |v: u8| (v as f32 * a + 0.5) as u8;
    Color::Rgb {
        r: ch(c.r),
        g: ch(c.g),
        b: ch(c.b),
    }
}

pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut sum_a: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = px0 + dx;
                    let y = py0 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    let a = p.a as u32;

                    // threshold: treat alpha as ink
                    if a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        sum_a += a;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color && ink_count > 0 {
                term_color(Rgba::new(
                    (sum_r / ink_count) as u8,
                    (sum_g / ink_count) as u8,
                    (sum_b / ink_count) as u8,
                    (sum_a / ink_count) as f32 / 255.0,
                ))
            } else {
                Color::White
            };

            out.set(
                cx as u16,
                cy as u16,
                Cell {
                    ch,
                    fg,
                    bg,
                    bold: false,
                },
            );
        }
    }

    for label in &canvas.labels {
        draw_label(out, label, enable_color, bg);
    }
}

fn draw_label(buf: &mut CellBuffer, label: &Label, enable_color: bool, bg: Color) {
    let col = label.at.x / UNITS_PER_DOT / 2.0;
    let row = label.at.y / UNITS_PER_DOT / 4.0;
    let len = label.text.chars().count() as f64;
    let col = if label.style.centered { col - len / 2.0 } else { col };
    if col < 0.0 || row < 0.0 {
        return;
    }
    let fg = if enable_color {
        term_color(label.style.color)
    } else {
        Color::White
    };
    draw_text(buf, col.round() as u16, row.floor() as u16, &label.text, fg, bg);
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{ORANGE, ORANGE_FAINT};

    fn units(dots: f64) -> f64 {
        dots * UNITS_PER_DOT
    }

    #[test]
    fn braille_bits_cover_the_whole_block() {
        let mut all = 0u8;
        for dy in 0..4 {
            for dx in 0..2 {
                let bit = braille_bit(dx, dy);
                assert_eq!(all & bit, 0);
                all |= bit;
            }
        }
        assert_eq!(all, 0xFF);
        assert_eq!(braille_bit(2, 0), 0);
    }

    #[test]
    fn resize_is_measured_in_dots() {
        let canvas = PixelCanvas::new(600, 300);
        assert_eq!((canvas.w, canvas.h), (200, 100));
        assert_eq!(canvas.px.len(), 200 * 100);
    }

    #[test]
    fn horizontal_stroke_lands_on_one_row() {
        let mut canvas = PixelCanvas::new(60, 30);
        let mut path = Path::new();
        path.move_to(Point::new(0.5, units(4.5)))
            .line_to(Point::new(units(9.5), units(4.5)));
        canvas.stroke(&path, Stroke::CIRCUIT);

        for y in 0..canvas.h {
            for x in 0..canvas.w {
                let inked = canvas.px[canvas.idx(x, y)].a > 0;
                assert_eq!(inked, y == 4 && x <= 9, "dot ({x},{y})");
            }
        }
        let p = canvas.px[canvas.idx(3, 4)];
        assert_eq!((p.r, p.g, p.b), (ORANGE.r, ORANGE.g, ORANGE.b));
    }

    #[test]
    fn thin_strokes_are_fainter() {
        let mut canvas = PixelCanvas::new(60, 30);
        let mut path = Path::new();
        path.move_to(Point::new(1.0, 1.0)).line_to(Point::new(1.0, 1.0 + units(3.0)));
        canvas.stroke(&path, Stroke::OUTLINE);
        let a = canvas.px[canvas.idx(0, 1)].a;
        let full = Pixel::from(ORANGE_FAINT).a;
        assert!(a > 0 && a < full);
    }

    #[test]
    fn off_canvas_and_non_finite_points_are_ignored() {
        let mut canvas = PixelCanvas::new(30, 30);
        let mut path = Path::new();
        path.move_to(Point::new(-100.0, -100.0))
            .line_to(Point::new(1e9, 1e9))
            .line_to(Point::new(f64::NAN, 3.0));
        canvas.stroke(&path, Stroke::CIRCUIT);
        assert_eq!(canvas.px.len(), 100);
        assert!(canvas.px.iter().all(|p| p.a == 0));
    }

    #[test]
    fn clear_drops_dots_and_labels() {
        let mut canvas = PixelCanvas::new(60, 60);
        let mut path = Path::new();
        path.circle(Point::new(30.0, 30.0), 10.0);
        canvas.stroke(&path, Stroke::CIRCUIT);
        canvas.fill_text("+20", Point::new(30.0, 30.0), crate::scale::LABEL_STYLE);
        assert!(canvas.px.iter().any(|p| p.a > 0));
        assert_eq!(canvas.labels.len(), 1);

        canvas.clear();
        assert!(canvas.px.iter().all(|p| *p == Pixel::default()));
        assert!(canvas.labels.is_empty());
    }

    #[test]
    fn dots_become_braille_cells() {
        let mut canvas = PixelCanvas::new(units(4.0) as u32, units(8.0) as u32);
        let i = canvas.idx(0, 0);
        canvas.px[i] = Pixel::from(ORANGE);
        let i = canvas.idx(3, 7);
        canvas.px[i] = Pixel::from(ORANGE);

        let mut buf = CellBuffer::new(2, 2);
        canvas_to_cells(&canvas, &mut buf, true, Color::Black);
        assert_eq!(buf.get(0, 0).unwrap().ch, '\u{2801}');
        assert_eq!(buf.get(1, 1).unwrap().ch, '\u{2880}');
        assert!(buf.get(1, 0).unwrap().is_blank());
        assert!(matches!(buf.get(0, 0).unwrap().fg, Color::Rgb { r, .. } if r > 200));

        canvas_to_cells(&canvas, &mut buf, false, Color::Black);
        assert_eq!(buf.get(0, 0).unwrap().fg, Color::White);
    }

    #[test]
    fn centered_labels_straddle_their_anchor() {
        let mut canvas = PixelCanvas::new(units(40.0) as u32, units(16.0) as u32);
        canvas.fill_text("+40", Point::new(units(20.0), units(8.0)), crate::scale::LABEL_STYLE);
        let mut buf = CellBuffer::new(20, 4);
        canvas_to_cells(&canvas, &mut buf, false, Color::Black);
        let row: String = (0..20).map(|x| buf.get(x, 2).unwrap().ch).collect();
        let at = row.find("+40").unwrap();
        assert!((8..=9).contains(&at), "{row}");
    }

    #[test]
    fn viewport_measures_in_surface_units() {
        let vp = Viewport { cols: 100, rows: 25 };
        assert_eq!(vp.content_size(), (600, 300));
    }
}
