use crate::backdrop;
use crate::canvas::Canvas;
use crate::config::{load_settings, project_paths, Args, Settings};
use crate::display::{Container, Display};
use crate::driver::AnimationState;
use crate::generator::FrameGeometry;
use crate::input::{collect_input_nonblocking, map_event_to_action, HostAction};
use crate::render::{canvas_to_cells, draw_text, PixelCanvas, Terminal, Viewport};
use anyhow::Context;
use clap::Parser;
use crossterm::style::Color;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LOG_ENV: &str = "PSYCHOGRAPH_LOG";

pub(crate) struct App {
    settings: Settings,
    margin_rows: u16,
    display: Display<PixelCanvas, StdRng>,
    term: Terminal,
    paused: bool,
    should_quit: bool,
}

impl App {
    fn init(args: Args) -> anyhow::Result<Self> {
        let paths = project_paths().ok();
        if let Some(paths) = &paths {
            // the screen belongs to the display, so no log file means no logging
            init_tracing(&paths.log_path).ok();
        }

        let settings_path = args
            .config
            .clone()
            .or_else(|| paths.map(|p| p.settings_path));
        let mut settings = settings_path
            .as_deref()
            .map(load_settings)
            .unwrap_or_default();
        settings.apply_args(&args);

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(seed = ?settings.seed, fps = settings.fps_cap, "starting");

        let term = Terminal::begin()?;
        let mut display = Display::new(rng, settings.tuning.clone());
        display.initialize_surface(Some(&term.viewport(args.margin_rows)));

        Ok(Self {
            settings,
            margin_rows: args.margin_rows,
            display,
            term,
            paused: false,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();

            let resized = self.term.resize_if_needed()?;
            follow_layout(&mut self.display, self.term.viewport(self.margin_rows), resized);

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(&ev) {
                    self.apply(action);
                }
            }

            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            if !self.paused {
                let delta_ms = real_dt.as_secs_f64() * 1000.0 * self.settings.delta_scale;
                self.display.advance_frame(delta_ms);
            }

            self.render_frame()?;
            spin_sleep(frame_dt, frame_start);
        }

        info!("shutting down");
        Ok(())
    }

    fn apply(&mut self, action: HostAction) {
        debug!(?action, "key");
        match action {
            HostAction::Quit => self.should_quit = true,
            HostAction::TogglePause => self.paused = !self.paused,
            HostAction::ForceReset => {
                self.display.force_reset();
            }
            HostAction::ToggleGrid => self.settings.show_grid = !self.settings.show_grid,
            HostAction::ToggleCrosshairs => {
                self.settings.show_crosshairs = !self.settings.show_crosshairs
            }
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = Color::Black;
        let color = self.settings.enable_color;
        self.term.cur.clear(bg);

        let viewport = self.term.viewport(self.margin_rows);
        let status = match self.display.surface() {
            Some(surface) => {
                canvas_to_cells(surface.canvas(), &mut self.term.cur, color, bg);
                status_text(surface.state(), surface.geometry(), self.paused)
            }
            None => "no surface  |  q quit".to_string(),
        };

        if self.settings.show_grid {
            backdrop::draw_lines(&mut self.term.cur, viewport.rows, color);
        }
        if self.settings.show_crosshairs {
            backdrop::draw_crosshairs(&mut self.term.cur, viewport.rows, color);
        }

        draw_text(&mut self.term.cur, 1, viewport.rows, &status, Color::White, bg);

        self.term.present(true)?;
        Ok(())
    }
}

/// Resize and the deferred initial draw both measure the same viewport.
fn follow_layout<C, R>(display: &mut Display<C, R>, viewport: Viewport, resized: bool)
where
    C: Canvas + Default,
    R: Rng,
{
    if resized {
        let (w, h) = viewport.content_size();
        display.resize(w, h);
    }
    display.settle(&viewport);
}

fn status_text(state: &AnimationState, geometry: Option<&FrameGeometry>, paused: bool) -> String {
    let jumps = geometry.map_or(String::new(), |g| {
        let mark = |on: bool, side: char| if on { side } else { '.' };
        format!(
            "  jump {}{}/{}{}",
            mark(g.interior_jumps.left, 'L'),
            mark(g.interior_jumps.right, 'R'),
            mark(g.exterior_jumps.left, 'L'),
            mark(g.exterior_jumps.right, 'R'),
        )
    });
    format!(
        "t={:>9.3}  frame {}{}{}  |  q quit  space pause  r reset  g grid  c crosshairs",
        state.time_cursor,
        state.frames,
        jumps,
        if paused { "  [paused]" } else { "" },
    )
}

/// Sends events to `psychograph.log`; the filter comes from `PSYCHOGRAPH_LOG`.
fn init_tracing(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(())
}

pub(crate) fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut app = App::init(args)?;
    let result = app.run();
    app.term.end()?;
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Jumps;
    use crate::geom::{Point, Rect};

    #[test]
    fn status_shows_cursor_frames_and_pause() {
        let state = AnimationState {
            time_cursor: 12.5,
            frames: 42,
            ..AnimationState::default()
        };
        let s = status_text(&state, None, true);
        assert!(s.starts_with("t=   12.500  frame 42"), "{s}");
        assert!(s.contains("[paused]"));
        assert!(!status_text(&state, None, false).contains("paused"));
    }

    #[test]
    fn status_marks_jumping_sides() {
        let p = Point::new(0.0, 0.0);
        let geo = FrameGeometry {
            neural_box: Rect::new(0.0, 0.0, 1.0, 1.0),
            left_interior: p,
            right_interior: p,
            left_exterior: p,
            right_exterior: p,
            interior_jumps: Jumps {
                left: true,
                right: false,
            },
            exterior_jumps: Jumps {
                left: false,
                right: true,
            },
        };
        let s = status_text(&AnimationState::default(), Some(&geo), false);
        assert!(s.contains("jump L./.R"), "{s}");
    }

    #[test]
    fn layout_follows_the_viewport_measured_after_resize() {
        let mut display: Display<PixelCanvas, StdRng> =
            Display::new(StdRng::seed_from_u64(3), Default::default());
        display.initialize_surface(Some(&Viewport { cols: 0, rows: 0 }));

        let grown = Viewport { cols: 80, rows: 20 };
        follow_layout(&mut display, grown, true);
        let surface = display.surface().unwrap();
        assert_eq!(surface.size(), grown.content_size());
        assert!(!surface.awaiting_initial_draw());

        let shrunk = Viewport { cols: 40, rows: 6 };
        follow_layout(&mut display, shrunk, true);
        assert_eq!(display.surface().unwrap().size(), shrunk.content_size());

        follow_layout(&mut display, grown, false);
        assert_eq!(display.surface().unwrap().size(), shrunk.content_size());
    }

    #[test]
    fn spin_sleep_waits_at_least_the_target() {
        let start = Instant::now();
        spin_sleep(Duration::from_millis(5), start);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
