//! Error types for presentation.

use thiserror::Error;

/// A failure reported by a [`GraphicsDevice`](crate::GraphicsDevice).
///
/// The renderer logs these and continues with the next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The device became unusable.
    #[error("graphics device lost: {0}")]
    DeviceLost(String),

    /// The surface no longer matches the target size.
    #[error("surface outdated: target is {width}x{height}")]
    SurfaceOutdated {
        /// Target width.
        width: u32,
        /// Target height.
        height: u32,
    },

    /// `end_frame` without a matching `begin_frame`.
    #[error("no frame in progress")]
    NoFrameInProgress,
}

/// Result type for device operations.
pub type RenderResult<T> = Result<T, RenderError>;
