use alloc::string::String;
use enough::StopReason;

/// Errors from container decoding and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TiffError {
    #[error("unrecognized container magic bytes")]
    UnrecognizedFormat,

    #[error("invalid container header: {0}")]
    InvalidHeader(String),

    /// A directory is missing a mandatory field or carries a nonsensical one
    /// (no dimensions, undefined planar configuration, indexed image without
    /// a color map, mismatched offset/count arrays).
    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    /// The directory's photometric interpretation or ink configuration has
    /// no destination colorspace. Distinct from [`TiffError::InvalidDirectory`]
    /// so callers can skip the directory instead of aborting the load.
    #[error("unsupported colorspace: {0}")]
    UnsupportedColorspace(String),

    #[error("unsupported container variant: {0}")]
    UnsupportedVariant(String),

    /// Pixel data shorter than the geometry the directory declares.
    #[error("corrupt pixel data: {0}")]
    InvalidData(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("layer data does not match {expected:?} channel depth")]
    DepthMismatch { expected: crate::ChannelDepth },

    /// Encode was asked to write an image with no pixel data.
    #[error("image has no pixel data to encode")]
    EmptyImage,

    #[error("operation cancelled")]
    Cancelled(StopReason),

    #[cfg(feature = "std")]
    #[error("i/o error: {0}")]
    Io(std::io::Error),
}

impl From<StopReason> for TiffError {
    fn from(r: StopReason) -> Self {
        TiffError::Cancelled(r)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for TiffError {
    fn from(e: std::io::Error) -> Self {
        TiffError::Io(e)
    }
}
