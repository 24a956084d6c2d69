//! Destination raster model: colorspaces, layers, and the merged image.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::TiffError;

/// Destination colorspace of a decoded layer.
///
/// Every colorspace carries an alpha channel as its last memory channel;
/// color channels occupy the positions before it. `Rgba` layers store their
/// color channels in B,G,R memory order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colorspace {
    /// Gray + alpha.
    GrayA,
    /// Red, green, blue + alpha (B,G,R,A memory order).
    Rgba,
    /// Cyan, magenta, yellow, black + alpha.
    Cmyka,
    /// L, a, b + alpha. 16-bit only.
    Laba,
}

impl Colorspace {
    /// Number of color channels, excluding alpha.
    pub fn color_channels(self) -> usize {
        match self {
            Self::GrayA => 1,
            Self::Rgba | Self::Laba => 3,
            Self::Cmyka => 4,
        }
    }

    /// Total channels including alpha.
    pub fn channels(self) -> usize {
        self.color_channels() + 1
    }

    /// Stable identifier for this colorspace.
    pub fn id(self) -> &'static str {
        match self {
            Self::GrayA => "GRAYA",
            Self::Rgba => "RGBA",
            Self::Cmyka => "CMYKA",
            Self::Laba => "LABA",
        }
    }
}

/// Bits per destination channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelDepth {
    Eight,
    Sixteen,
}

impl ChannelDepth {
    pub fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
        }
    }
}

/// Channel-interleaved pixel storage at the layer's depth.
///
/// 16-bit samples are native-endian words; byte order of the source
/// container is resolved during decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerData {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl LayerData {
    /// Number of stored samples (not bytes).
    pub fn len(&self) -> usize {
        match self {
            Self::U8(d) => d.len(),
            Self::U16(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::U8(d) => Some(d),
            Self::U16(_) => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Self::U16(d) => Some(d),
            Self::U8(_) => None,
        }
    }
}

/// Mutable view of one row region, matching the layer's depth.
pub(crate) enum RowMut<'a> {
    U8(&'a mut [u8]),
    U16(&'a mut [u16]),
}

/// One decoded sub-image: a channel-interleaved pixel grid plus the ICC
/// profile bound to it (if any).
#[derive(Clone, Debug)]
pub struct Layer {
    pub width: u32,
    pub height: u32,
    pub colorspace: Colorspace,
    pub depth: ChannelDepth,
    data: LayerData,
    /// Profile the pixel data is expressed in; `None` means the built-in
    /// working profile of the colorspace.
    pub icc_profile: Option<Vec<u8>>,
}

impl Layer {
    /// Allocate a zeroed layer.
    pub(crate) fn new(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        depth: ChannelDepth,
    ) -> Result<Self, TiffError> {
        let samples = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(colorspace.channels()))
            .ok_or(TiffError::DimensionsTooLarge { width, height })?;
        let data = match depth {
            ChannelDepth::Eight => LayerData::U8(vec![0u8; samples]),
            ChannelDepth::Sixteen => LayerData::U16(vec![0u16; samples]),
        };
        Ok(Self { width, height, colorspace, depth, data, icc_profile: None })
    }

    /// Build a layer from existing pixel data (for the encode path).
    ///
    /// The data variant must match `depth` and hold exactly
    /// `width * height * channels` samples.
    pub fn from_data(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        depth: ChannelDepth,
        data: LayerData,
    ) -> Result<Self, TiffError> {
        match (&data, depth) {
            (LayerData::U8(_), ChannelDepth::Eight)
            | (LayerData::U16(_), ChannelDepth::Sixteen) => {}
            _ => return Err(TiffError::DepthMismatch { expected: depth }),
        }
        let samples = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(colorspace.channels()))
            .ok_or(TiffError::DimensionsTooLarge { width, height })?;
        if data.len() != samples {
            return Err(TiffError::BufferTooSmall {
                needed: samples * depth.bytes(),
                actual: data.len() * depth.bytes(),
            });
        }
        Ok(Self { width, height, colorspace, depth, data, icc_profile: None })
    }

    /// Access the pixel data.
    pub fn data(&self) -> &LayerData {
        &self.data
    }

    /// One sample value, widened to `u32`. `None` when out of bounds.
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> Option<u32> {
        let ch = self.colorspace.channels();
        if x >= self.width || y >= self.height || channel >= ch {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * ch + channel;
        match &self.data {
            LayerData::U8(d) => d.get(idx).map(|&v| u32::from(v)),
            LayerData::U16(d) => d.get(idx).map(|&v| u32::from(v)),
        }
    }

    /// Mutable slice of `npixels` pixels starting at `(x0, y)`.
    pub(crate) fn row_region_mut(&mut self, y: u32, x0: u32, npixels: u32) -> RowMut<'_> {
        let ch = self.colorspace.channels();
        let start = (y as usize * self.width as usize + x0 as usize) * ch;
        let end = start + npixels as usize * ch;
        match &mut self.data {
            LayerData::U8(d) => RowMut::U8(&mut d[start..end]),
            LayerData::U16(d) => RowMut::U16(&mut d[start..end]),
        }
    }

    /// Typed view of an 8-bit `Rgba` layer as B,G,R,A pixels.
    ///
    /// `None` when the layer is not 8-bit `Rgba`.
    #[cfg(feature = "rgb")]
    pub fn as_bgra8(&self) -> Option<&[rgb::alt::BGRA<u8>]> {
        use rgb::AsPixels as _;
        match (&self.data, self.colorspace, self.depth) {
            (LayerData::U8(d), Colorspace::Rgba, ChannelDepth::Eight) => Some(d.as_pixels()),
            _ => None,
        }
    }

    /// Typed view of an 8-bit `GrayA` layer as gray+alpha pixels.
    #[cfg(feature = "rgb")]
    pub fn as_gray_alpha8(&self) -> Option<&[rgb::alt::GrayAlpha<u8>]> {
        use rgb::AsPixels as _;
        match (&self.data, self.colorspace, self.depth) {
            (LayerData::U8(d), Colorspace::GrayA, ChannelDepth::Eight) => Some(d.as_pixels()),
            _ => None,
        }
    }

    /// Zero-copy [`imgref::ImgRef`] view of an 8-bit `Rgba` layer.
    #[cfg(feature = "imgref")]
    pub fn as_imgref_bgra8(&self) -> Option<imgref::ImgRef<'_, rgb::alt::BGRA<u8>>> {
        let pixels = self.as_bgra8()?;
        Some(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// Free-text document metadata carried by the container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

impl DocumentInfo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.author.is_none()
    }
}

/// Pixel density in pixels per inch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub x_dpi: f64,
    pub y_dpi: f64,
}

/// The merged destination image: one layer per decoded directory.
///
/// The canvas extent grows (never shrinks) to the union of merged layers.
#[derive(Clone, Debug, Default)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
    pub info: DocumentInfo,
    pub resolution: Option<Resolution>,
}

impl RasterImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a layer, growing the canvas to cover it.
    pub fn push_layer(&mut self, layer: Layer) {
        self.width = self.width.max(layer.width);
        self.height = self.height.max(layer.height);
        self.layers.push(layer);
    }
}
