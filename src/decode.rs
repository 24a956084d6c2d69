//! Decode driver: walks the directory chain and runs the per-directory
//! strip/tile loops.

use alloc::format;
use alloc::vec::Vec;

use enough::Stop;

use crate::colorspace::{self, ColorspaceBinding};
use crate::error::TiffError;
use crate::limits::Limits;
use crate::raster::{Layer, RasterImage};
use crate::reader::{Chunking, Container, DirectoryMetadata};
use crate::stream::BufferStream;
use crate::tags::PlanarConfiguration;
use crate::writer::ChannelWriter;

/// Decode every directory of a container into a [`RasterImage`].
///
/// The first failing directory aborts the whole decode. Use
/// [`Container::next_directory`] and [`Container::decode_directory`]
/// directly to skip unsupported directories instead.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<RasterImage, TiffError> {
    DecodeRequest::new(data).decode(stop)
}

/// Read a container file and decode it.
#[cfg(feature = "std")]
pub fn decode_path(
    path: impl AsRef<std::path::Path>,
    stop: impl Stop,
) -> Result<RasterImage, TiffError> {
    let data = std::fs::read(path)?;
    DecodeRequest::new(&data).decode(stop)
}

/// Decode options, builder style.
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    color_management: bool,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, limits: None, color_management: true }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Skip embedded-profile binding; layers keep their raw profile bytes
    /// and no transform is applied.
    pub fn without_color_management(mut self) -> Self {
        self.color_management = false;
        self
    }

    pub fn decode(self, stop: impl Stop) -> Result<RasterImage, TiffError> {
        let stop: &dyn Stop = &stop;
        let mut container = Container::parse(self.data)?;
        let mut image = RasterImage::new();
        while let Some(meta) = container.next_directory()? {
            if let Some(limits) = self.limits {
                limits.check_directories(container.directories_read() as u64)?;
            }
            stop.check()?;
            let layer =
                container.decode_directory(&meta, self.limits, self.color_management, stop)?;
            if image.info.title.is_none() {
                image.info.title = meta.document_name.clone();
            }
            if image.info.description.is_none() {
                image.info.description = meta.image_description.clone();
            }
            if image.info.author.is_none() {
                image.info.author = meta.artist.clone();
            }
            if image.resolution.is_none() {
                image.resolution = meta.resolution;
            }
            image.push_layer(layer);
        }
        if image.layers.is_empty() {
            return Err(TiffError::InvalidHeader("container has no directories".into()));
        }
        Ok(image)
    }
}

impl<'a> Container<'a> {
    /// Decode one directory into a fresh layer.
    ///
    /// Failures leave previously decoded layers untouched; callers looping
    /// over directories can skip an [`TiffError::UnsupportedColorspace`]
    /// directory and continue with the rest of the chain.
    pub fn decode_directory(
        &self,
        meta: &DirectoryMetadata,
        limits: Option<&Limits>,
        color_management: bool,
        stop: &dyn Stop,
    ) -> Result<Layer, TiffError> {
        if let Some(limits) = limits {
            limits.check(meta.width, meta.height)?;
        }
        let binding = colorspace::resolve(meta, color_management)?;
        if let Some(limits) = limits {
            let bytes = u64::from(meta.width)
                * u64::from(meta.height)
                * binding.colorspace.channels() as u64
                * binding.depth.bytes() as u64;
            let bytes = usize::try_from(bytes).map_err(|_| TiffError::DimensionsTooLarge {
                width: meta.width,
                height: meta.height,
            })?;
            limits.check_memory(bytes)?;
        }

        let mut layer = Layer::new(meta.width, meta.height, binding.colorspace, binding.depth)?;
        layer.icc_profile = binding.icc_profile.clone();
        let mut writer = ChannelWriter::new(&binding, meta.bits_per_sample);

        match (meta.planar, meta.chunking) {
            (PlanarConfiguration::Contiguous, Chunking::Strips { rows_per_strip }) => {
                self.decode_contig_strips(meta, &binding, &mut writer, &mut layer, rows_per_strip, stop)?;
            }
            (PlanarConfiguration::Contiguous, Chunking::Tiles { width, height }) => {
                self.decode_contig_tiles(meta, &binding, &mut writer, &mut layer, width, height, stop)?;
            }
            (PlanarConfiguration::Separate, Chunking::Strips { rows_per_strip }) => {
                self.decode_separate_strips(meta, &binding, &mut writer, &mut layer, rows_per_strip, stop)?;
            }
            (PlanarConfiguration::Separate, Chunking::Tiles { width, height }) => {
                self.decode_separate_tiles(meta, &binding, &mut writer, &mut layer, width, height, stop)?;
            }
        }
        Ok(layer)
    }

    /// Bounds-checked view of one strip/tile, `need` bytes long. A chunk
    /// whose declared byte count is shorter than the geometry requires is a
    /// contract violation, fatal to the directory.
    fn chunk_slice(
        &self,
        meta: &DirectoryMetadata,
        idx: usize,
        need: usize,
    ) -> Result<&'a [u8], TiffError> {
        let offset = *meta
            .chunk_offsets
            .get(idx)
            .ok_or_else(|| TiffError::InvalidDirectory(format!("missing strip/tile {idx}")))?
            as usize;
        let count = meta.chunk_byte_counts[idx] as usize;
        if count < need {
            return Err(TiffError::InvalidData(format!(
                "strip/tile {idx} holds {count} bytes, needs {need}"
            )));
        }
        let end = offset.checked_add(need).ok_or(TiffError::UnexpectedEof)?;
        self.data().get(offset..end).ok_or(TiffError::UnexpectedEof)
    }

    fn decode_contig_strips(
        &self,
        meta: &DirectoryMetadata,
        binding: &ColorspaceBinding,
        writer: &mut ChannelWriter<'_>,
        layer: &mut Layer,
        rows_per_strip: u32,
        stop: &dyn Stop,
    ) -> Result<(), TiffError> {
        let samples_per_line = samples_per_line(meta, meta.width, binding.source_samples)?;
        let row_bytes = line_bytes(samples_per_line, meta);
        let strips = meta.height.div_ceil(rows_per_strip);
        for s in 0..strips {
            stop.check()?;
            let y0 = s * rows_per_strip;
            let rows_in = rows_per_strip.min(meta.height - y0);
            let need = row_bytes
                .checked_mul(rows_in as usize)
                .ok_or(dims_error(meta))?;
            let buf = self.chunk_slice(meta, s as usize, need)?;
            let mut stream =
                BufferStream::contiguous(buf, meta.bits_per_sample, samples_per_line, self.order());
            for r in 0..rows_in {
                stream.move_to_line(r as usize);
                let row = layer.row_region_mut(y0 + r, 0, meta.width);
                writer.copy_data_to_channels(row, &mut stream);
            }
        }
        Ok(())
    }

    fn decode_contig_tiles(
        &self,
        meta: &DirectoryMetadata,
        binding: &ColorspaceBinding,
        writer: &mut ChannelWriter<'_>,
        layer: &mut Layer,
        tile_width: u32,
        tile_height: u32,
        stop: &dyn Stop,
    ) -> Result<(), TiffError> {
        let across = meta.width.div_ceil(tile_width);
        let down = meta.height.div_ceil(tile_height);
        let samples_per_line = samples_per_line(meta, tile_width, binding.source_samples)?;
        let tile_row_bytes = line_bytes(samples_per_line, meta);
        // Edge tiles are stored full-size; only the in-bounds region is read.
        let need = tile_row_bytes
            .checked_mul(tile_height as usize)
            .ok_or(dims_error(meta))?;
        for ty in 0..down {
            for tx in 0..across {
                stop.check()?;
                let idx = ty as usize * across as usize + tx as usize;
                let buf = self.chunk_slice(meta, idx, need)?;
                let rows_in = tile_height.min(meta.height - ty * tile_height);
                let cols_in = tile_width.min(meta.width - tx * tile_width);
                let mut stream = BufferStream::contiguous(
                    buf,
                    meta.bits_per_sample,
                    samples_per_line,
                    self.order(),
                );
                for r in 0..rows_in {
                    stream.move_to_line(r as usize);
                    let row = layer.row_region_mut(ty * tile_height + r, tx * tile_width, cols_in);
                    writer.copy_data_to_channels(row, &mut stream);
                }
            }
        }
        Ok(())
    }

    fn decode_separate_strips(
        &self,
        meta: &DirectoryMetadata,
        binding: &ColorspaceBinding,
        writer: &mut ChannelWriter<'_>,
        layer: &mut Layer,
        rows_per_strip: u32,
        stop: &dyn Stop,
    ) -> Result<(), TiffError> {
        let planes = binding.source_samples;
        let strips_per_plane = meta.height.div_ceil(rows_per_strip) as usize;
        let plane_samples_per_line = meta.width as usize;
        let plane_row_bytes = line_bytes(plane_samples_per_line, meta);
        for s in 0..strips_per_plane {
            stop.check()?;
            let y0 = s as u32 * rows_per_strip;
            let rows_in = rows_per_strip.min(meta.height - y0);
            let need = plane_row_bytes
                .checked_mul(rows_in as usize)
                .ok_or(dims_error(meta))?;
            let mut bufs = Vec::with_capacity(planes);
            for p in 0..planes {
                bufs.push(self.chunk_slice(meta, p * strips_per_plane + s, need)?);
            }
            let mut stream = BufferStream::separate(
                bufs,
                meta.bits_per_sample,
                plane_samples_per_line,
                self.order(),
            );
            for r in 0..rows_in {
                stream.move_to_line(r as usize);
                let row = layer.row_region_mut(y0 + r, 0, meta.width);
                writer.copy_data_to_channels(row, &mut stream);
            }
        }
        Ok(())
    }

    fn decode_separate_tiles(
        &self,
        meta: &DirectoryMetadata,
        binding: &ColorspaceBinding,
        writer: &mut ChannelWriter<'_>,
        layer: &mut Layer,
        tile_width: u32,
        tile_height: u32,
        stop: &dyn Stop,
    ) -> Result<(), TiffError> {
        let planes = binding.source_samples;
        let across = meta.width.div_ceil(tile_width);
        let down = meta.height.div_ceil(tile_height);
        let tiles_per_plane = across as usize * down as usize;
        let plane_samples_per_line = tile_width as usize;
        let tile_row_bytes = line_bytes(plane_samples_per_line, meta);
        let need = tile_row_bytes
            .checked_mul(tile_height as usize)
            .ok_or(dims_error(meta))?;
        for ty in 0..down {
            for tx in 0..across {
                stop.check()?;
                let t = ty as usize * across as usize + tx as usize;
                let mut bufs = Vec::with_capacity(planes);
                for p in 0..planes {
                    bufs.push(self.chunk_slice(meta, p * tiles_per_plane + t, need)?);
                }
                let rows_in = tile_height.min(meta.height - ty * tile_height);
                let cols_in = tile_width.min(meta.width - tx * tile_width);
                let mut stream = BufferStream::separate(
                    bufs,
                    meta.bits_per_sample,
                    plane_samples_per_line,
                    self.order(),
                );
                for r in 0..rows_in {
                    stream.move_to_line(r as usize);
                    let row = layer.row_region_mut(ty * tile_height + r, tx * tile_width, cols_in);
                    writer.copy_data_to_channels(row, &mut stream);
                }
            }
        }
        Ok(())
    }
}

fn dims_error(meta: &DirectoryMetadata) -> TiffError {
    TiffError::DimensionsTooLarge { width: meta.width, height: meta.height }
}

fn samples_per_line(
    meta: &DirectoryMetadata,
    line_pixels: u32,
    samples: usize,
) -> Result<usize, TiffError> {
    (line_pixels as usize)
        .checked_mul(samples)
        .ok_or(dims_error(meta))
}

/// Bytes one byte-aligned scanline occupies at the directory's bit depth.
fn line_bytes(samples_per_line: usize, meta: &DirectoryMetadata) -> usize {
    samples_per_line
        .saturating_mul(usize::from(meta.bits_per_sample))
        .div_ceil(8)
}
