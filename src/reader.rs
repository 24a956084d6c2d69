//! Container Directory Reader: header parse and typed per-directory metadata.
//!
//! A container is a chain of directories, each a count-prefixed array of
//! 12-byte tag entries followed by the offset of the next directory (0 ends
//! the chain). [`Container::next_directory`] walks the chain and resolves
//! each directory into an immutable [`DirectoryMetadata`] record, applying
//! the lenient defaults real-world producers rely on: only width and height
//! are hard-required.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::TiffError;
use crate::ifd::{ByteOrder, EndianCursor, IfdEntry};
use crate::raster::Resolution;
use crate::tags::{
    self, ExtraSampleKind, Photometric, PlanarConfiguration, field_type, tag,
};

const MAGIC: u16 = 42;
const BIG_TIFF_MAGIC: u16 = 43;

/// Indexed-color lookup tables, copied out of the container bytes so their
/// lifetime is not tied to the parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub red: Vec<u16>,
    pub green: Vec<u16>,
    pub blue: Vec<u16>,
}

/// How a directory's pixel data is chunked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chunking {
    Strips { rows_per_strip: u32 },
    Tiles { width: u32, height: u32 },
}

/// Typed record of one directory. Populated once per directory at decode
/// start; immutable thereafter.
#[derive(Clone, Debug)]
pub struct DirectoryMetadata {
    pub width: u32,
    pub height: u32,
    /// Bits per sample, 1–32. Defaults to 1 when absent.
    pub bits_per_sample: u16,
    /// Declared samples per pixel; 0 means "absent — let the colorspace
    /// resolver infer it from the photometric interpretation".
    pub samples_per_pixel: u16,
    pub extra_samples: Vec<ExtraSampleKind>,
    pub photometric: Photometric,
    pub planar: PlanarConfiguration,
    pub chunking: Chunking,
    /// Ink set of a separated directory; defaults to CMYK.
    pub ink_set: u16,
    pub icc_profile: Option<Vec<u8>>,
    pub palette: Option<Palette>,
    pub document_name: Option<String>,
    pub image_description: Option<String>,
    pub artist: Option<String>,
    pub resolution: Option<Resolution>,
    /// Declared extra samples that carry no associated-alpha tag. Their
    /// values are read and dropped during decode; callers that care can
    /// warn on a nonzero count.
    pub ignored_extra_samples: usize,
    pub(crate) chunk_offsets: Vec<u32>,
    pub(crate) chunk_byte_counts: Vec<u32>,
}

impl DirectoryMetadata {
    pub fn is_tiled(&self) -> bool {
        matches!(self.chunking, Chunking::Tiles { .. })
    }
}

/// An opened container: validated header plus a cursor over the directory
/// chain. Iterate with [`Container::next_directory`] until it returns `None`.
pub struct Container<'a> {
    data: &'a [u8],
    order: ByteOrder,
    next_ifd: u32,
    directories_read: usize,
}

impl<'a> Container<'a> {
    /// Validate the container header.
    pub fn parse(data: &'a [u8]) -> Result<Self, TiffError> {
        let order = match data.get(0..2) {
            Some(b"II") => ByteOrder::LittleEndian,
            Some(b"MM") => ByteOrder::BigEndian,
            Some(_) => return Err(TiffError::UnrecognizedFormat),
            None => return Err(TiffError::UnexpectedEof),
        };
        let mut cursor = EndianCursor::new(data, order);
        cursor.seek(2)?;
        let magic = cursor.read_u16()?;
        if magic == BIG_TIFF_MAGIC {
            return Err(TiffError::UnsupportedVariant("BigTIFF container".into()));
        }
        if magic != MAGIC {
            return Err(TiffError::InvalidHeader(format!(
                "version {magic}, expected {MAGIC}"
            )));
        }
        let next_ifd = cursor.read_u32()?;
        Ok(Self { data, order, next_ifd, directories_read: 0 })
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        self.data
    }

    pub(crate) fn order(&self) -> ByteOrder {
        self.order
    }

    /// Number of directories read so far.
    pub fn directories_read(&self) -> usize {
        self.directories_read
    }

    /// Read the next directory in the chain, or `None` when the chain ends.
    pub fn next_directory(&mut self) -> Result<Option<DirectoryMetadata>, TiffError> {
        if self.next_ifd == 0 {
            return Ok(None);
        }
        // A chain with more directories than the data could possibly hold
        // is cyclic.
        if self.directories_read > self.data.len() / 6 {
            return Err(TiffError::InvalidHeader("directory chain loops".into()));
        }

        let mut cursor = EndianCursor::new(self.data, self.order);
        cursor.seek(self.next_ifd as usize)?;
        let entry_count = cursor.read_u16()?;
        let mut entries = Vec::with_capacity(usize::from(entry_count));
        for _ in 0..entry_count {
            entries.push(IfdEntry::parse(&mut cursor)?);
        }
        self.next_ifd = cursor.read_u32()?;
        self.directories_read += 1;

        self.read_directory(&entries).map(Some)
    }

    fn find<'e>(entries: &'e [IfdEntry], t: u16) -> Option<&'e IfdEntry> {
        entries.iter().find(|e| e.tag == t)
    }

    fn read_directory(&self, entries: &[IfdEntry]) -> Result<DirectoryMetadata, TiffError> {
        let data = self.data;
        let order = self.order;
        let require_u32 = |t: u16, name: &str| -> Result<u32, TiffError> {
            Self::find(entries, t)
                .ok_or_else(|| TiffError::InvalidDirectory(format!("missing {name}")))?
                .read_u32_first(data, order)
        };

        let width = require_u32(tag::IMAGE_WIDTH, "image width")?;
        let height = require_u32(tag::IMAGE_LENGTH, "image height")?;
        if width == 0 || height == 0 {
            return Err(TiffError::InvalidDirectory(format!(
                "zero-area image {width}x{height}"
            )));
        }

        let bits_per_sample = match Self::find(entries, tag::BITS_PER_SAMPLE) {
            Some(e) => e.read_u32_first(data, order)? as u16,
            None => 1,
        };
        if bits_per_sample == 0 || bits_per_sample > 32 {
            return Err(TiffError::UnsupportedVariant(format!(
                "{bits_per_sample} bits per sample"
            )));
        }

        let compression = match Self::find(entries, tag::COMPRESSION) {
            Some(e) => e.read_u32_first(data, order)? as u16,
            None => tags::COMPRESSION_NONE,
        };
        if compression != tags::COMPRESSION_NONE {
            return Err(TiffError::UnsupportedVariant(format!(
                "compression scheme {compression} (only uncompressed data is read)"
            )));
        }

        let samples_per_pixel = match Self::find(entries, tag::SAMPLES_PER_PIXEL) {
            Some(e) => e.read_u32_first(data, order)? as u16,
            None => 0,
        };

        let extra_samples = match Self::find(entries, tag::EXTRA_SAMPLES) {
            Some(e) => e
                .read_u16s(data, order)?
                .into_iter()
                .map(ExtraSampleKind::from_u16)
                .collect(),
            None => Vec::new(),
        };
        let has_alpha = extra_samples
            .iter()
            .any(|e| *e == ExtraSampleKind::AssociatedAlpha);
        let ignored_extra_samples = extra_samples.len() - usize::from(has_alpha);

        let photometric = match Self::find(entries, tag::PHOTOMETRIC) {
            Some(e) => Photometric::from_u16(e.read_u32_first(data, order)? as u16),
            None => Photometric::MinIsWhite,
        };

        let planar = match Self::find(entries, tag::PLANAR_CONFIGURATION) {
            Some(e) => {
                let raw = e.read_u32_first(data, order)? as u16;
                PlanarConfiguration::from_u16(raw).ok_or_else(|| {
                    TiffError::InvalidDirectory(format!("planar configuration {raw}"))
                })?
            }
            None => PlanarConfiguration::Contiguous,
        };

        let ink_set = match Self::find(entries, tag::INK_SET) {
            Some(e) => e.read_u32_first(data, order)? as u16,
            None => tags::INK_SET_CMYK,
        };

        let (chunking, chunk_offsets, chunk_byte_counts) =
            self.read_chunk_layout(entries, height)?;

        let palette = if photometric == Photometric::Palette {
            Some(self.read_palette(entries, bits_per_sample)?)
        } else {
            None
        };

        let icc_profile = match Self::find(entries, tag::ICC_PROFILE) {
            Some(e) => Some(e.read_raw(data, order)?),
            None => None,
        };

        let read_text = |t: u16| -> Result<Option<String>, TiffError> {
            match Self::find(entries, t) {
                Some(e) => e.read_ascii(data, order).map(Some),
                None => Ok(None),
            }
        };
        let document_name = read_text(tag::DOCUMENT_NAME)?;
        let image_description = read_text(tag::IMAGE_DESCRIPTION)?;
        let artist = read_text(tag::ARTIST)?;

        let resolution = self.read_resolution(entries)?;

        Ok(DirectoryMetadata {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            extra_samples,
            photometric,
            planar,
            chunking,
            ink_set,
            icc_profile,
            palette,
            document_name,
            image_description,
            artist,
            resolution,
            ignored_extra_samples,
            chunk_offsets,
            chunk_byte_counts,
        })
    }

    fn read_chunk_layout(
        &self,
        entries: &[IfdEntry],
        height: u32,
    ) -> Result<(Chunking, Vec<u32>, Vec<u32>), TiffError> {
        let data = self.data;
        let order = self.order;

        let (chunking, offsets_tag, counts_tag) =
            if let Some(e) = Self::find(entries, tag::TILE_WIDTH) {
                let tile_width = e.read_u32_first(data, order)?;
                let tile_height = Self::find(entries, tag::TILE_LENGTH)
                    .ok_or_else(|| {
                        TiffError::InvalidDirectory("tile width without tile length".into())
                    })?
                    .read_u32_first(data, order)?;
                if tile_width == 0 || tile_height == 0 {
                    return Err(TiffError::InvalidDirectory(format!(
                        "zero-area tiles {tile_width}x{tile_height}"
                    )));
                }
                (
                    Chunking::Tiles { width: tile_width, height: tile_height },
                    tag::TILE_OFFSETS,
                    tag::TILE_BYTE_COUNTS,
                )
            } else {
                let rows_per_strip = match Self::find(entries, tag::ROWS_PER_STRIP) {
                    // The tag's "infinity" convention: one strip for the
                    // whole image.
                    Some(e) => match e.read_u32_first(data, order)? {
                        0 => height,
                        n => n.min(height),
                    },
                    None => height,
                };
                (
                    Chunking::Strips { rows_per_strip },
                    tag::STRIP_OFFSETS,
                    tag::STRIP_BYTE_COUNTS,
                )
            };

        let offsets = Self::find(entries, offsets_tag)
            .ok_or_else(|| TiffError::InvalidDirectory("missing strip/tile offsets".into()))?
            .read_u32s(data, order)?;
        let counts = Self::find(entries, counts_tag)
            .ok_or_else(|| TiffError::InvalidDirectory("missing strip/tile byte counts".into()))?
            .read_u32s(data, order)?;
        if offsets.len() != counts.len() {
            return Err(TiffError::InvalidDirectory(format!(
                "{} offsets but {} byte counts",
                offsets.len(),
                counts.len()
            )));
        }
        if offsets.is_empty() {
            return Err(TiffError::InvalidDirectory("empty strip/tile offsets".into()));
        }
        Ok((chunking, offsets, counts))
    }

    fn read_palette(
        &self,
        entries: &[IfdEntry],
        bits_per_sample: u16,
    ) -> Result<Palette, TiffError> {
        if bits_per_sample > 16 {
            return Err(TiffError::InvalidDirectory(format!(
                "{bits_per_sample}-bit palette index"
            )));
        }
        let entry = Self::find(entries, tag::COLOR_MAP).ok_or_else(|| {
            TiffError::InvalidDirectory("indexed image without a color map".into())
        })?;
        let values = entry.read_u16s(self.data, self.order)?;
        let per_table = 1usize << bits_per_sample;
        if values.len() != per_table * 3 {
            return Err(TiffError::InvalidDirectory(format!(
                "color map has {} entries, expected {}",
                values.len(),
                per_table * 3
            )));
        }
        Ok(Palette {
            red: values[..per_table].to_vec(),
            green: values[per_table..2 * per_table].to_vec(),
            blue: values[2 * per_table..].to_vec(),
        })
    }

    fn read_resolution(&self, entries: &[IfdEntry]) -> Result<Option<Resolution>, TiffError> {
        let (Some(xe), Some(ye)) = (
            Self::find(entries, tag::X_RESOLUTION),
            Self::find(entries, tag::Y_RESOLUTION),
        ) else {
            return Ok(None);
        };
        // Tolerate producers that mistype resolution entries.
        if xe.field_type != field_type::RATIONAL || ye.field_type != field_type::RATIONAL {
            return Ok(None);
        }
        let (xn, xd) = xe.read_rational_first(self.data, self.order)?;
        let (yn, yd) = ye.read_rational_first(self.data, self.order)?;
        if xd == 0 || yd == 0 {
            return Ok(None);
        }
        let unit = match Self::find(entries, tag::RESOLUTION_UNIT) {
            Some(e) => e.read_u32_first(self.data, self.order)? as u16,
            None => tags::RESOLUTION_UNIT_INCH,
        };
        let scale = if unit == tags::RESOLUTION_UNIT_CM { 2.54 } else { 1.0 };
        Ok(Some(Resolution {
            x_dpi: f64::from(xn) / f64::from(xd) * scale,
            y_dpi: f64::from(yn) / f64::from(yd) * scale,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            Container::parse(b"PK\x03\x04\0\0\0\0"),
            Err(TiffError::UnrecognizedFormat)
        ));
        assert!(matches!(
            Container::parse(b"II\x2B\x00\0\0\0\0"),
            Err(TiffError::UnsupportedVariant(_))
        ));
        assert!(matches!(Container::parse(b"II"), Err(TiffError::UnexpectedEof)));
    }

    #[test]
    fn empty_chain_ends_immediately() {
        let mut c = Container::parse(b"II\x2A\x00\x00\x00\x00\x00").unwrap();
        assert!(c.next_directory().unwrap().is_none());
        assert_eq!(c.directories_read(), 0);
    }
}
