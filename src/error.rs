use thiserror::Error;

/// Reasons a frame is not drawn. None of these are faults: the display is
/// decorative, so every entry point absorbs a `Skip` and tries again next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum Skip {
    #[error("no surface attached")]
    MissingSurface,
    #[error("surface has zero extent ({width}x{height})")]
    ZeroExtent { width: u32, height: u32 },
    #[error("cached state was malformed: {0}")]
    MalformedState(&'static str),
}
