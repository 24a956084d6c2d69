//! Channel Writer: reorders, rescales, and post-processes native-depth
//! samples from a buffer stream into destination rows.
//!
//! The write target is fixed at construction from the colorspace binding:
//! direct 8-bit, direct 16-bit, or palette expansion. Color samples scatter
//! through the channel position map (so RGB sources land in B,G,R,A layer
//! memory), the alpha slot defaults to fully opaque, extra samples without
//! an alpha tag are read and dropped, and any pending post-process directive
//! runs per pixel. A bound color-management transform then runs over each
//! completed row's color channels.

use alloc::vec::Vec;

use crate::colorspace::ColorspaceBinding;
use crate::raster::RowMut;
use crate::stream::BufferStream;

#[cfg(feature = "cms")]
use crate::cms::CmsTransform;

/// Rescale a sample from `from_bits` to `to_bits` of precision.
///
/// Exact identity at equal depths, and exact `* 257` expansion for 8→16;
/// other depth pairs round to nearest.
pub(crate) fn rescale(value: u32, from_bits: u16, to_bits: u16) -> u32 {
    if from_bits == to_bits {
        return value;
    }
    let from_max = (1u64 << from_bits) - 1;
    let to_max = (1u64 << to_bits) - 1;
    ((u64::from(value) * to_max + from_max / 2) / from_max) as u32
}

pub(crate) struct ChannelWriter<'b> {
    binding: &'b ColorspaceBinding,
    src_depth: u16,
    /// Row scratch for the color-management pass.
    #[cfg_attr(not(feature = "cms"), allow(dead_code))]
    scratch: Vec<u8>,
}

impl<'b> ChannelWriter<'b> {
    pub(crate) fn new(binding: &'b ColorspaceBinding, src_depth: u16) -> Self {
        Self { binding, src_depth, scratch: Vec::new() }
    }

    /// Fill a row region of whole destination pixels from the stream,
    /// reading one native sample per declared source sample.
    pub(crate) fn copy_data_to_channels(&mut self, dst: RowMut<'_>, stream: &mut BufferStream<'_>) {
        let binding = self.binding;
        match (dst, &binding.palette) {
            (RowMut::U16(row), Some(_)) => self.copy_palette(row, stream),
            (RowMut::U8(row), _) => self.copy_direct8(row, stream),
            (RowMut::U16(row), None) => self.copy_direct16(row, stream),
        }
    }

    fn copy_direct8(&mut self, row: &mut [u8], stream: &mut BufferStream<'_>) {
        let b = self.binding;
        let channels = b.colorspace.channels();
        let color = b.colorspace.color_channels();
        for px in row.chunks_exact_mut(channels) {
            let mut alpha = 255u32;
            for s in 0..b.source_samples {
                let raw = stream.next_value();
                if s < b.source_color_channels {
                    px[b.positions[s]] = rescale(raw, self.src_depth, 8) as u8;
                } else if Some(s) == b.alpha_source {
                    alpha = rescale(raw, self.src_depth, 8);
                }
                // remaining extra samples are dropped
            }
            px[b.positions[color]] = alpha as u8;
            b.post.apply8(&mut px[..color]);
        }
        #[cfg(feature = "cms")]
        if let Some(t) = &b.transform {
            self.transform_row8(t, row, channels, color);
        }
    }

    fn copy_direct16(&mut self, row: &mut [u16], stream: &mut BufferStream<'_>) {
        let b = self.binding;
        let channels = b.colorspace.channels();
        let color = b.colorspace.color_channels();
        for px in row.chunks_exact_mut(channels) {
            let mut alpha = 65535u32;
            for s in 0..b.source_samples {
                let raw = stream.next_value();
                if s < b.source_color_channels {
                    px[b.positions[s]] = rescale(raw, self.src_depth, 16) as u16;
                } else if Some(s) == b.alpha_source {
                    alpha = rescale(raw, self.src_depth, 16);
                }
            }
            px[b.positions[color]] = alpha as u16;
            b.post.apply16(&mut px[..color]);
        }
        #[cfg(feature = "cms")]
        if let Some(t) = &b.transform {
            self.transform_row16(t, row, channels, color);
        }
    }

    /// Expand palette indices straight to 16-bit B,G,R,A. The raw index is
    /// the lookup key (no rescale); an associated-alpha extra sample is
    /// honored independently of the lookup.
    fn copy_palette(&mut self, row: &mut [u16], stream: &mut BufferStream<'_>) {
        let b = self.binding;
        let Some(pal) = &b.palette else { return };
        let channels = b.colorspace.channels();
        for px in row.chunks_exact_mut(channels) {
            let mut alpha = 65535u32;
            for s in 0..b.source_samples {
                let raw = stream.next_value();
                if s == 0 {
                    let idx = raw as usize;
                    px[b.positions[0]] = pal.red.get(idx).copied().unwrap_or(0);
                    px[b.positions[1]] = pal.green.get(idx).copied().unwrap_or(0);
                    px[b.positions[2]] = pal.blue.get(idx).copied().unwrap_or(0);
                } else if Some(s) == b.alpha_source {
                    alpha = rescale(raw, self.src_depth, 16);
                }
            }
            px[b.positions[3]] = alpha as u16;
        }
    }

    #[cfg(feature = "cms")]
    fn transform_row8(&mut self, t: &CmsTransform, row: &mut [u8], channels: usize, color: usize) {
        self.scratch.clear();
        for px in row.chunks_exact(channels) {
            self.scratch.extend_from_slice(&px[..color]);
        }
        t.transform_in_place(&mut self.scratch);
        for (px, s) in row
            .chunks_exact_mut(channels)
            .zip(self.scratch.chunks_exact(color))
        {
            px[..color].copy_from_slice(s);
        }
    }

    #[cfg(feature = "cms")]
    fn transform_row16(
        &mut self,
        t: &CmsTransform,
        row: &mut [u16],
        channels: usize,
        color: usize,
    ) {
        self.scratch.clear();
        for px in row.chunks_exact(channels) {
            for &v in &px[..color] {
                self.scratch.extend_from_slice(&v.to_ne_bytes());
            }
        }
        t.transform_in_place(&mut self.scratch);
        let mut words = self.scratch.chunks_exact(2);
        for px in row.chunks_exact_mut(channels) {
            for v in &mut px[..color] {
                if let Some(w) = words.next() {
                    *v = u16::from_ne_bytes([w[0], w[1]]);
                }
            }
        }
    }
}
