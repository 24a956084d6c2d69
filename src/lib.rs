//! # zentiff
//!
//! Tagged-container (TIFF baseline) raster image decoder and encoder.
//!
//! A container holds one or more *directories*, each describing a sub-image
//! as a set of typed tag entries: dimensions, bit depth, samples per pixel,
//! photometric interpretation, planar configuration, strip/tile layout,
//! optional palette and optional embedded ICC profile. Decoding resolves
//! each directory to an internal colorspace (gray+alpha, RGBA, CMYK+alpha,
//! Lab+alpha at 8 or 16 bits per channel), streams its raw samples at native
//! bit depth, and writes normalized pixels into a [`Layer`] of the
//! destination [`RasterImage`]. Encoding writes one directory per layer.
//!
//! ## Supported input
//!
//! - Strip and tile layouts, contiguous and separate planar configurations
//! - Bit depths 1–32 (sub-byte depths are unpacked MSB-first)
//! - Photometrics: min-is-white, min-is-black, RGB, separated (CMYK),
//!   CIE Lab, ICC Lab, and palette-indexed color
//! - Associated-alpha extra samples; other extra samples are dropped and
//!   counted in [`DirectoryMetadata::ignored_extra_samples`]
//! - Embedded ICC profiles, either bound to the output layer or converted
//!   through a perceptual transform (`cms` feature)
//! - Little- and big-endian containers (the encoder always writes
//!   little-endian)
//!
//! ## Non-Goals
//!
//! - Compressed pixel data (the stream layer is defined over raw
//!   scanline/tile buffers; compressed containers are rejected)
//! - BigTIFF
//! - Rendering, compositing, or colorspace conversion beyond the
//!   decode-time profile binding
//!
//! ## Usage
//!
//! ```no_run
//! use enough::Unstoppable;
//! use zentiff::{DecodeRequest, EncodeRequest};
//!
//! let data: &[u8] = &[]; // your container bytes
//!
//! // Decode every directory into layers
//! let image = DecodeRequest::new(data).decode(Unstoppable)?;
//! for layer in &image.layers {
//!     println!("{}x{} {:?}", layer.width, layer.height, layer.colorspace);
//! }
//!
//! // Encode back (one directory per layer)
//! let encoded = EncodeRequest::new().encode(&image, Unstoppable)?;
//! # let _ = encoded;
//! # Ok::<(), zentiff::TiffError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod colorspace;
mod error;
mod ifd;
mod limits;
mod raster;
mod stream;
mod tags;
mod writer;

#[cfg(feature = "cms")]
mod cms;

mod decode;
mod encode;
pub mod reader;

// Re-exports
pub use decode::{DecodeRequest, decode};
pub use encode::{EncodeRequest, encode};
pub use enough::{Stop, Unstoppable};
pub use error::TiffError;
pub use limits::Limits;
pub use raster::{
    ChannelDepth, Colorspace, DocumentInfo, Layer, LayerData, RasterImage, Resolution,
};
pub use reader::{Chunking, Container, DirectoryMetadata, Palette};
pub use tags::{ExtraSampleKind, Photometric, PlanarConfiguration};

#[cfg(feature = "std")]
pub use decode::decode_path;
#[cfg(feature = "std")]
pub use encode::encode_path;
