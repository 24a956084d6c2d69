//! Encode driver: writes one directory per layer into a little-endian
//! container.
//!
//! Pixel data is emitted strip by strip (inverting the channel position
//! map, so B,G,R,A layer memory leaves as R,G,B,A samples), followed by the
//! out-of-line value blocks and the directory itself with entries in
//! ascending tag order. Directories chain through their next-directory
//! offsets; document metadata and the resolution block ride on the first
//! directory, an ICC profile block on any layer that carries one.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::colorspace::channel_positions;
use crate::error::TiffError;
use crate::raster::{Colorspace, Layer, LayerData, RasterImage, Resolution};
use crate::tags::{
    COMPRESSION_NONE, INK_SET_CMYK, RESOLUTION_UNIT_INCH, field_type, photometric, tag,
};

/// Strips are grouped to roughly this many bytes.
const STRIP_SIZE_TARGET: usize = 8 * 1024;

/// Encode an image, one directory per layer.
pub fn encode(image: &RasterImage, stop: impl Stop) -> Result<Vec<u8>, TiffError> {
    EncodeRequest::new().encode(image, stop)
}

/// Encode an image and write it to a file.
#[cfg(feature = "std")]
pub fn encode_path(
    image: &RasterImage,
    path: impl AsRef<std::path::Path>,
    stop: impl Stop,
) -> Result<(), TiffError> {
    let bytes = EncodeRequest::new().encode(image, stop)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode options, builder style.
#[derive(Clone, Debug, Default)]
pub struct EncodeRequest {
    rows_per_strip: Option<u32>,
}

impl EncodeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the strip height instead of targeting ~8 KiB strips.
    pub fn with_rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = Some(rows.max(1));
        self
    }

    pub fn encode(&self, image: &RasterImage, stop: impl Stop) -> Result<Vec<u8>, TiffError> {
        let stop: &dyn Stop = &stop;
        if image.layers.is_empty() {
            return Err(TiffError::EmptyImage);
        }
        if image.layers.iter().any(|l| l.width == 0 || l.height == 0) {
            return Err(TiffError::EmptyImage);
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        let mut chain_pos = 4;
        for (index, layer) in image.layers.iter().enumerate() {
            let (ifd_offset, next_pos) =
                self.encode_layer(&mut out, image, layer, index == 0, stop)?;
            patch_u32(&mut out, chain_pos, ifd_offset);
            chain_pos = next_pos;
        }
        Ok(out)
    }

    fn encode_layer(
        &self,
        out: &mut Vec<u8>,
        image: &RasterImage,
        layer: &Layer,
        first: bool,
        stop: &dyn Stop,
    ) -> Result<(u32, usize), TiffError> {
        let channels = layer.colorspace.channels();
        let positions = channel_positions(layer.colorspace);
        let bits = u16::from(layer.depth.bits());
        let row_bytes = layer.width as usize * channels * layer.depth.bytes();
        let rows_per_strip = self
            .rows_per_strip
            .unwrap_or_else(|| (STRIP_SIZE_TARGET / row_bytes.max(1)).max(1) as u32)
            .min(layer.height);
        let strips = layer.height.div_ceil(rows_per_strip);

        let mut offsets = Vec::with_capacity(strips as usize);
        let mut counts = Vec::with_capacity(strips as usize);
        for s in 0..strips {
            stop.check()?;
            align(out);
            let start = out.len();
            offsets.push(offset_u32(start)?);
            let y0 = s * rows_per_strip;
            let rows_in = rows_per_strip.min(layer.height - y0);
            write_strip(out, layer, &positions, y0, rows_in);
            counts.push(
                u32::try_from(out.len() - start)
                    .map_err(|_| TiffError::UnsupportedVariant("strip larger than 4 GiB".into()))?,
            );
        }

        let mut ifd = IfdBuilder::default();
        ifd.push_long(tag::IMAGE_WIDTH, layer.width);
        ifd.push_long(tag::IMAGE_LENGTH, layer.height);
        ifd.push_shorts(tag::BITS_PER_SAMPLE, &vec![bits; channels], out)?;
        ifd.push_short(tag::COMPRESSION, COMPRESSION_NONE);
        ifd.push_short(tag::PHOTOMETRIC, photometric_code(layer.colorspace));
        if first {
            if let Some(title) = &image.info.title {
                ifd.push_ascii(tag::DOCUMENT_NAME, title, out)?;
            }
            if let Some(description) = &image.info.description {
                ifd.push_ascii(tag::IMAGE_DESCRIPTION, description, out)?;
            }
            if let Some(author) = &image.info.author {
                ifd.push_ascii(tag::ARTIST, author, out)?;
            }
        }
        ifd.push_longs(tag::STRIP_OFFSETS, &offsets, out)?;
        ifd.push_short(tag::SAMPLES_PER_PIXEL, channels as u16);
        ifd.push_long(tag::ROWS_PER_STRIP, rows_per_strip);
        ifd.push_longs(tag::STRIP_BYTE_COUNTS, &counts, out)?;
        if let Some(res) = image.resolution {
            let (xr, yr) = (dpi_rational(res), dpi_rational_y(res));
            ifd.push_rational(tag::X_RESOLUTION, xr, out)?;
            ifd.push_rational(tag::Y_RESOLUTION, yr, out)?;
            ifd.push_short(tag::RESOLUTION_UNIT, RESOLUTION_UNIT_INCH);
        }
        ifd.push_short(tag::PLANAR_CONFIGURATION, 1);
        if layer.colorspace == Colorspace::Cmyka {
            ifd.push_short(tag::INK_SET, INK_SET_CMYK);
        }
        // The trailing channel is always associated alpha.
        ifd.push_shorts(tag::EXTRA_SAMPLES, &[1], out)?;
        if let Some(icc) = &layer.icc_profile {
            ifd.push_undefined(tag::ICC_PROFILE, icc, out)?;
        }
        ifd.finish(out)
    }
}

/// Emit `rows` scanlines, one sample per source channel, reading layer
/// memory through the channel position map.
fn write_strip(out: &mut Vec<u8>, layer: &Layer, positions: &[usize], y0: u32, rows: u32) {
    let channels = layer.colorspace.channels();
    let width = layer.width as usize;
    match layer.data() {
        LayerData::U8(d) => {
            for y in y0..y0 + rows {
                let base = y as usize * width * channels;
                for x in 0..width {
                    let px = base + x * channels;
                    for &p in positions {
                        out.push(d[px + p]);
                    }
                }
            }
        }
        LayerData::U16(d) => {
            for y in y0..y0 + rows {
                let base = y as usize * width * channels;
                for x in 0..width {
                    let px = base + x * channels;
                    for &p in positions {
                        out.extend_from_slice(&d[px + p].to_le_bytes());
                    }
                }
            }
        }
    }
}

fn photometric_code(cs: Colorspace) -> u16 {
    match cs {
        Colorspace::GrayA => photometric::MIN_IS_BLACK,
        Colorspace::Rgba => photometric::RGB,
        Colorspace::Cmyka => photometric::SEPARATED,
        Colorspace::Laba => photometric::CIE_LAB,
    }
}

fn dpi_rational(res: Resolution) -> (u32, u32) {
    ((res.x_dpi.max(0.0) * 10_000.0).round() as u32, 10_000)
}

fn dpi_rational_y(res: Resolution) -> (u32, u32) {
    ((res.y_dpi.max(0.0) * 10_000.0).round() as u32, 10_000)
}

fn align(out: &mut Vec<u8>) {
    if out.len() % 2 == 1 {
        out.push(0);
    }
}

fn offset_u32(pos: usize) -> Result<u32, TiffError> {
    u32::try_from(pos)
        .map_err(|_| TiffError::UnsupportedVariant("container larger than 4 GiB".into()))
}

fn patch_u32(out: &mut [u8], pos: usize, value: u32) {
    out[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

/// Collects directory entries, spilling values larger than 4 bytes into
/// out-of-line blocks, then writes the directory with entries in ascending
/// tag order.
#[derive(Default)]
struct IfdBuilder {
    entries: Vec<(u16, u16, u32, [u8; 4])>,
}

impl IfdBuilder {
    fn push_short(&mut self, t: u16, v: u16) {
        let mut val = [0u8; 4];
        val[..2].copy_from_slice(&v.to_le_bytes());
        self.entries.push((t, field_type::SHORT, 1, val));
    }

    fn push_long(&mut self, t: u16, v: u32) {
        self.entries.push((t, field_type::LONG, 1, v.to_le_bytes()));
    }

    fn push_shorts(&mut self, t: u16, vals: &[u16], out: &mut Vec<u8>) -> Result<(), TiffError> {
        match *vals {
            [v] => self.push_short(t, v),
            [a, b] => {
                let mut val = [0u8; 4];
                val[..2].copy_from_slice(&a.to_le_bytes());
                val[2..].copy_from_slice(&b.to_le_bytes());
                self.entries.push((t, field_type::SHORT, 2, val));
            }
            _ => {
                align(out);
                let offset = offset_u32(out.len())?;
                for v in vals {
                    out.extend_from_slice(&v.to_le_bytes());
                }
                self.entries
                    .push((t, field_type::SHORT, vals.len() as u32, offset.to_le_bytes()));
            }
        }
        Ok(())
    }

    fn push_longs(&mut self, t: u16, vals: &[u32], out: &mut Vec<u8>) -> Result<(), TiffError> {
        if let [v] = *vals {
            self.push_long(t, v);
            return Ok(());
        }
        align(out);
        let offset = offset_u32(out.len())?;
        for v in vals {
            out.extend_from_slice(&v.to_le_bytes());
        }
        self.entries
            .push((t, field_type::LONG, vals.len() as u32, offset.to_le_bytes()));
        Ok(())
    }

    fn push_ascii(&mut self, t: u16, s: &str, out: &mut Vec<u8>) -> Result<(), TiffError> {
        let count = s.len() + 1; // trailing NUL
        if count <= 4 {
            let mut val = [0u8; 4];
            val[..s.len()].copy_from_slice(s.as_bytes());
            self.entries
                .push((t, field_type::ASCII, count as u32, val));
            return Ok(());
        }
        align(out);
        let offset = offset_u32(out.len())?;
        out.extend_from_slice(s.as_bytes());
        out.push(0);
        self.entries
            .push((t, field_type::ASCII, count as u32, offset.to_le_bytes()));
        Ok(())
    }

    fn push_rational(
        &mut self,
        t: u16,
        (num, den): (u32, u32),
        out: &mut Vec<u8>,
    ) -> Result<(), TiffError> {
        align(out);
        let offset = offset_u32(out.len())?;
        out.extend_from_slice(&num.to_le_bytes());
        out.extend_from_slice(&den.to_le_bytes());
        self.entries
            .push((t, field_type::RATIONAL, 1, offset.to_le_bytes()));
        Ok(())
    }

    fn push_undefined(&mut self, t: u16, bytes: &[u8], out: &mut Vec<u8>) -> Result<(), TiffError> {
        if bytes.len() <= 4 {
            let mut val = [0u8; 4];
            val[..bytes.len()].copy_from_slice(bytes);
            self.entries
                .push((t, field_type::UNDEFINED, bytes.len() as u32, val));
            return Ok(());
        }
        align(out);
        let offset = offset_u32(out.len())?;
        out.extend_from_slice(bytes);
        self.entries
            .push((t, field_type::UNDEFINED, bytes.len() as u32, offset.to_le_bytes()));
        Ok(())
    }

    fn finish(mut self, out: &mut Vec<u8>) -> Result<(u32, usize), TiffError> {
        align(out);
        let ifd_offset = offset_u32(out.len())?;
        self.entries.sort_by_key(|e| e.0);
        out.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
        for (t, ftype, count, val) in &self.entries {
            out.extend_from_slice(&t.to_le_bytes());
            out.extend_from_slice(&ftype.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(val);
        }
        let next_pos = out.len();
        out.extend_from_slice(&0u32.to_le_bytes());
        Ok((ifd_offset, next_pos))
    }
}
