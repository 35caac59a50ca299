//! Owns the drawing surface and exposes the two entry points the host drives:
//! `initialize_surface` once, then `advance_frame` on every refresh.

use crate::canvas::Canvas;
use crate::config::Tuning;
use crate::driver::{AnimationState, Step, Tick};
use crate::error::Skip;
use crate::generator::{self, FrameGeometry, GeneratorTuning, Jumps};
use rand::Rng;
use tracing::{debug, info, trace};

/// Size used when the container has not been laid out yet.
pub(crate) const FALLBACK_SIZE: (u32, u32) = (600, 300);

/// Whatever region the display is placed in.
pub(crate) trait Container {
    /// Current content-box size in canvas pixels; zero while layout is unsettled.
    fn content_size(&self) -> (u32, u32);
}

pub(crate) struct Surface<C> {
    width: u32,
    height: u32,
    canvas: C,
    state: AnimationState,
    geometry: Option<FrameGeometry>,
    pending_initial_draw: bool,
}

impl<C> Surface<C> {
    pub(crate) fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn canvas(&self) -> &C {
        &self.canvas
    }

    pub(crate) fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Junctions of the most recent frame.
    pub(crate) fn geometry(&self) -> Option<&FrameGeometry> {
        self.geometry.as_ref()
    }

    pub(crate) fn awaiting_initial_draw(&self) -> bool {
        self.pending_initial_draw
    }
}

pub(crate) struct Display<C, R> {
    surface: Option<Surface<C>>,
    rng: R,
    tuning: Tuning,
}

impl<C, R> Display<C, R>
where
    C: Canvas + Default,
    R: Rng,
{
    pub(crate) fn new(rng: R, tuning: Tuning) -> Self {
        Self {
            surface: None,
            rng,
            tuning,
        }
    }

    /// Creates a fresh surface sized to `container`. Without a container the
    /// display stays detached and every later frame is skipped.
    pub(crate) fn initialize_surface(&mut self, container: Option<&dyn Container>) {
        let Some(container) = container else {
            debug!("no container, display stays detached");
            return;
        };

        let (mut width, mut height) = container.content_size();
        if width == 0 || height == 0 {
            debug!(width, height, "container not laid out, using fallback size");
            (width, height) = FALLBACK_SIZE;
        }

        let mut canvas = C::default();
        canvas.resize(width, height);
        canvas.clear();

        self.surface = Some(Surface {
            width,
            height,
            canvas,
            state: AnimationState::new(&mut self.rng, &self.tuning.driver),
            geometry: None,
            pending_initial_draw: true,
        });
        info!(width, height, "surface initialized");
    }

    /// Runs the deferred initial draw once the container measures non-zero.
    /// Returns true when the draw happened.
    pub(crate) fn settle(&mut self, container: &dyn Container) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if !surface.pending_initial_draw {
            return false;
        }
        let (width, height) = container.content_size();
        if width == 0 || height == 0 {
            trace!("layout still unsettled, initial draw deferred");
            return false;
        }

        surface.pending_initial_draw = false;
        surface.width = width;
        surface.height = height;
        surface.canvas.resize(width, height);
        debug!(width, height, "deferred initial draw");
        redraw(surface, 0.0, &mut self.rng, &self.tuning.generator).is_ok()
    }

    /// Advances the animation by `delta_ms` and redraws. `None` when no
    /// surface is attached.
    pub(crate) fn advance_frame(&mut self, delta_ms: f64) -> Option<Tick> {
        let Some(surface) = self.surface.as_mut() else {
            trace!(skip = %Skip::MissingSurface, "frame skipped");
            return None;
        };

        let tick = surface
            .state
            .advance(delta_ms, &mut self.rng, &self.tuning.driver);
        if let Step::Jumped(by) = tick.step {
            debug!(by, cursor = surface.state.time_cursor, "time jump");
        }
        if let Some(to) = tick.reset_to {
            debug!(to, "time cursor reset");
        }
        if tick.cycle {
            trace!(frames = surface.state.frames, "cycle mark");
        }

        let time = surface.state.time_cursor;
        if let Err(skip) = redraw(surface, time, &mut self.rng, &self.tuning.generator) {
            trace!(%skip, "frame skipped");
        }
        Some(tick)
    }

    /// Follows a container resize: new extent, one redraw at the current time.
    pub(crate) fn resize(&mut self, width: u32, height: u32) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if surface.size() == (width, height) {
            return false;
        }
        surface.width = width;
        surface.height = height;
        surface.canvas.resize(width, height);
        info!(width, height, "surface resized");

        let time = surface.state.time_cursor;
        match redraw(surface, time, &mut self.rng, &self.tuning.generator) {
            Ok(()) => true,
            Err(skip) => {
                trace!(%skip, "resize redraw skipped");
                false
            }
        }
    }

    /// Throws the time cursor to a random spot; takes effect on the next frame.
    pub(crate) fn force_reset(&mut self) -> Option<f64> {
        let surface = self.surface.as_mut()?;
        let to = surface
            .state
            .force_reset(&mut self.rng, &self.tuning.driver);
        debug!(to, "forced reset");
        Some(to)
    }

    pub(crate) fn detach(&mut self) {
        if self.surface.take().is_some() {
            debug!("surface detached");
        }
    }

    pub(crate) fn surface(&self) -> Option<&Surface<C>> {
        self.surface.as_ref()
    }

    #[cfg(test)]
    fn surface_mut(&mut self) -> Option<&mut Surface<C>> {
        self.surface.as_mut()
    }
}

fn redraw<C, R>(
    surface: &mut Surface<C>,
    time: f64,
    rng: &mut R,
    tuning: &GeneratorTuning,
) -> Result<(), Skip>
where
    C: Canvas,
    R: Rng + ?Sized,
{
    if surface.geometry.is_some_and(|g| !g.is_finite()) {
        surface.geometry = None;
        debug!(skip = %Skip::MalformedState("frame geometry"), "cached geometry discarded");
    }

    let jumps = Jumps {
        left: surface.state.pending_jump_left,
        right: surface.state.pending_jump_right,
    };
    let frame = generator::draw_frame(
        &mut surface.canvas,
        surface.width,
        surface.height,
        time,
        jumps,
        rng,
        tuning,
    )?;
    surface.geometry = Some(frame.geometry).filter(FrameGeometry::is_finite);
    Ok(())
}
