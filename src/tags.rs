//! Tag numbers, value types, and directory-level enums for the
//! tagged-directory container layout.

/// Standard tag numbers read and written by this codec.
pub(crate) mod tag {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC: u16 = 262;
    pub const DOCUMENT_NAME: u16 = 269;
    pub const IMAGE_DESCRIPTION: u16 = 270;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const X_RESOLUTION: u16 = 282;
    pub const Y_RESOLUTION: u16 = 283;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const RESOLUTION_UNIT: u16 = 296;
    pub const ARTIST: u16 = 315;
    pub const COLOR_MAP: u16 = 320;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const INK_SET: u16 = 332;
    pub const EXTRA_SAMPLES: u16 = 338;
    pub const ICC_PROFILE: u16 = 34675;
}

/// Entry value types. Each type has a fixed byte size; entries whose total
/// value fits in 4 bytes store it inline, larger values live at an offset.
pub(crate) mod field_type {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
    pub const UNDEFINED: u16 = 7;

    /// Byte size of one value of type `t`, or `None` for types this codec
    /// does not interpret (such entries are skipped, not rejected).
    pub fn byte_size(t: u16) -> Option<usize> {
        match t {
            1 | 2 | 6 | 7 => Some(1),     // BYTE, ASCII, SBYTE, UNDEFINED
            3 | 8 => Some(2),             // SHORT, SSHORT
            4 | 9 | 11 => Some(4),        // LONG, SLONG, FLOAT
            5 | 10 | 12 => Some(8),       // RATIONAL, SRATIONAL, DOUBLE
            _ => None,
        }
    }
}

pub(crate) mod photometric {
    pub const MIN_IS_WHITE: u16 = 0;
    pub const MIN_IS_BLACK: u16 = 1;
    pub const RGB: u16 = 2;
    pub const PALETTE: u16 = 3;
    pub const SEPARATED: u16 = 5;
    pub const CIE_LAB: u16 = 8;
    pub const ICC_LAB: u16 = 9;
}

pub(crate) const COMPRESSION_NONE: u16 = 1;
pub(crate) const INK_SET_CMYK: u16 = 1;
pub(crate) const RESOLUTION_UNIT_INCH: u16 = 2;
pub(crate) const RESOLUTION_UNIT_CM: u16 = 3;

/// How raw samples map to a color meaning.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Photometric {
    /// Grayscale, 0 = white. Decoded samples are inverted.
    MinIsWhite,
    /// Grayscale, 0 = black.
    MinIsBlack,
    Rgb,
    /// Indexed color through the directory's color map tables.
    Palette,
    /// Ink-based separations; CMYK unless the ink set tag says otherwise.
    Separated,
    CieLab,
    /// Lab with offset-binary a/b encoding; rebiased to CIE Lab on decode.
    IccLab,
    /// A photometric code this codec does not recognize.
    Unknown(u16),
}

impl Photometric {
    pub(crate) fn from_u16(v: u16) -> Self {
        match v {
            photometric::MIN_IS_WHITE => Photometric::MinIsWhite,
            photometric::MIN_IS_BLACK => Photometric::MinIsBlack,
            photometric::RGB => Photometric::Rgb,
            photometric::PALETTE => Photometric::Palette,
            photometric::SEPARATED => Photometric::Separated,
            photometric::CIE_LAB => Photometric::CieLab,
            photometric::ICC_LAB => Photometric::IccLab,
            other => Photometric::Unknown(other),
        }
    }
}

/// Whether channel samples are interleaved per pixel or stored as separate
/// full-image planes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanarConfiguration {
    Contiguous,
    Separate,
}

impl PlanarConfiguration {
    pub(crate) fn from_u16(v: u16) -> Option<Self> {
        match v {
            1 => Some(PlanarConfiguration::Contiguous),
            2 => Some(PlanarConfiguration::Separate),
            _ => None,
        }
    }
}

/// Semantic tag of one extra sample (any sample beyond the colorspace's
/// intrinsic channel count).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraSampleKind {
    Unspecified,
    /// Opacity premultiplied into the color values; becomes the alpha channel.
    AssociatedAlpha,
    UnassociatedAlpha,
    Unknown(u16),
}

impl ExtraSampleKind {
    pub(crate) fn from_u16(v: u16) -> Self {
        match v {
            0 => ExtraSampleKind::Unspecified,
            1 => ExtraSampleKind::AssociatedAlpha,
            2 => ExtraSampleKind::UnassociatedAlpha,
            other => ExtraSampleKind::Unknown(other),
        }
    }
}
