//! Colorspace Resolver: maps a directory's (photometric, depth, channel
//! count) tuple to a destination colorspace binding.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::TiffError;
use crate::raster::{ChannelDepth, Colorspace};
use crate::reader::{DirectoryMetadata, Palette};
use crate::tags::{ExtraSampleKind, INK_SET_CMYK, Photometric};

#[cfg(feature = "cms")]
use crate::cms::{self, CmsTransform};

/// Post-decode directive applied per pixel by the channel writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PostProcess {
    None,
    /// min-is-white: 0 = white, so stored samples are inverted.
    Invert,
    /// Rebias offset-binary a/b to the CIE Lab encoding.
    IccLabToCieLab,
}

impl PostProcess {
    pub(crate) fn apply8(self, color: &mut [u8]) {
        match self {
            PostProcess::None => {}
            PostProcess::Invert => {
                for v in color {
                    *v = 255 - *v;
                }
            }
            PostProcess::IccLabToCieLab => {
                if color.len() >= 3 {
                    color[1] = color[1].wrapping_sub(0x80);
                    color[2] = color[2].wrapping_sub(0x80);
                }
            }
        }
    }

    pub(crate) fn apply16(self, color: &mut [u16]) {
        match self {
            PostProcess::None => {}
            PostProcess::Invert => {
                for v in color {
                    *v = 65535 - *v;
                }
            }
            PostProcess::IccLabToCieLab => {
                if color.len() >= 3 {
                    color[1] = color[1].wrapping_sub(0x8000);
                    color[2] = color[2].wrapping_sub(0x8000);
                }
            }
        }
    }
}

/// Everything the channel writer needs, computed once per directory and
/// discarded when the directory's decode ends.
pub(crate) struct ColorspaceBinding {
    pub colorspace: Colorspace,
    pub depth: ChannelDepth,
    /// Destination channel of each source color sample, plus the alpha slot
    /// as the final entry. RGB sources carry the documented B,G,R,A remap
    /// `[2, 1, 0, 3]`.
    pub positions: Vec<usize>,
    /// Source sample index carrying associated alpha, if any.
    pub alpha_source: Option<usize>,
    /// Samples read from the stream per pixel.
    pub source_samples: usize,
    /// Leading samples that carry color (1 for palette indices).
    pub source_color_channels: usize,
    pub post: PostProcess,
    pub palette: Option<Palette>,
    #[cfg(feature = "cms")]
    pub transform: Option<CmsTransform>,
    /// Profile bytes the decoded layer stays bound to.
    pub icc_profile: Option<Vec<u8>>,
}

/// Destination channel order for a colorspace: one slot per source color
/// sample, then the alpha slot. Shared with the encoder, which walks it in
/// reverse to emit samples from layer memory.
pub(crate) fn channel_positions(cs: Colorspace) -> Vec<usize> {
    match cs {
        Colorspace::GrayA => vec![0, 1],
        Colorspace::Rgba => vec![2, 1, 0, 3],
        Colorspace::Cmyka => vec![0, 1, 2, 3, 4],
        Colorspace::Laba => vec![0, 1, 2, 3],
    }
}

pub(crate) fn resolve(
    meta: &DirectoryMetadata,
    color_management: bool,
) -> Result<ColorspaceBinding, TiffError> {
    let bits = meta.bits_per_sample;
    let tier = if bits <= 8 { ChannelDepth::Eight } else { ChannelDepth::Sixteen };
    let declared = meta.samples_per_pixel as usize;
    let declared_extras = meta.extra_samples.len();

    let (colorspace, depth, post, source_color) = match meta.photometric {
        Photometric::MinIsWhite => (Colorspace::GrayA, tier, PostProcess::Invert, 1),
        Photometric::MinIsBlack => (Colorspace::GrayA, tier, PostProcess::None, 1),
        Photometric::Rgb => (Colorspace::Rgba, tier, PostProcess::None, 3),
        Photometric::Separated => {
            if meta.ink_set != INK_SET_CMYK {
                // Undefined ink names with exactly four inks decode as CMYK;
                // anything else has no destination colorspace.
                let inks = if declared == 0 {
                    4
                } else {
                    declared.saturating_sub(declared_extras)
                };
                if inks != 4 {
                    return Err(TiffError::UnsupportedColorspace(format!(
                        "ink set {} with {inks} inks",
                        meta.ink_set
                    )));
                }
            }
            (Colorspace::Cmyka, tier, PostProcess::None, 4)
        }
        Photometric::CieLab => (Colorspace::Laba, ChannelDepth::Sixteen, PostProcess::None, 3),
        Photometric::IccLab => (
            Colorspace::Laba,
            ChannelDepth::Sixteen,
            PostProcess::IccLabToCieLab,
            3,
        ),
        // Index + optional alpha expand through the color map into 16-bit
        // RGBA regardless of the index depth.
        Photometric::Palette => (Colorspace::Rgba, ChannelDepth::Sixteen, PostProcess::None, 1),
        Photometric::Unknown(v) => {
            return Err(TiffError::UnsupportedColorspace(format!(
                "photometric interpretation {v}"
            )));
        }
    };

    let palette = if meta.photometric == Photometric::Palette {
        match &meta.palette {
            Some(p) => Some(p.clone()),
            None => {
                return Err(TiffError::InvalidDirectory(
                    "indexed image without a color map".into(),
                ));
            }
        }
    } else {
        None
    };

    let source_samples = if declared == 0 { source_color + declared_extras } else { declared };
    if source_samples < source_color + declared_extras {
        return Err(TiffError::InvalidDirectory(format!(
            "samples-per-pixel {source_samples} cannot hold {source_color} color channels \
             and {declared_extras} extra samples"
        )));
    }

    let alpha_source = meta
        .extra_samples
        .iter()
        .position(|e| *e == ExtraSampleKind::AssociatedAlpha)
        .map(|i| source_color + i);

    #[cfg(feature = "cms")]
    let (transform, icc_profile) = match &meta.icc_profile {
        Some(icc) if palette.is_none() && color_management => {
            cms::bind_profile(icc, colorspace, depth)
        }
        Some(icc) if palette.is_none() => (None, Some(icc.clone())),
        _ => (None, None),
    };
    #[cfg(not(feature = "cms"))]
    let icc_profile = {
        let _ = color_management;
        if palette.is_none() { meta.icc_profile.clone() } else { None }
    };

    Ok(ColorspaceBinding {
        colorspace,
        depth,
        positions: channel_positions(colorspace),
        alpha_source,
        source_samples,
        source_color_channels: source_color,
        post,
        palette,
        #[cfg(feature = "cms")]
        transform,
        icc_profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Chunking;
    use crate::tags::PlanarConfiguration;

    fn meta(
        photometric: Photometric,
        bits: u16,
        samples: u16,
        extras: Vec<ExtraSampleKind>,
    ) -> DirectoryMetadata {
        DirectoryMetadata {
            width: 4,
            height: 4,
            bits_per_sample: bits,
            samples_per_pixel: samples,
            extra_samples: extras,
            photometric,
            planar: PlanarConfiguration::Contiguous,
            chunking: Chunking::Strips { rows_per_strip: 4 },
            ink_set: INK_SET_CMYK,
            icc_profile: None,
            palette: None,
            document_name: None,
            image_description: None,
            artist: None,
            resolution: None,
            ignored_extra_samples: 0,
            chunk_offsets: vec![0],
            chunk_byte_counts: vec![0],
        }
    }

    #[test]
    fn rgb_remap_and_depth_tiers() {
        let b = resolve(&meta(Photometric::Rgb, 8, 3, vec![]), false).unwrap();
        assert_eq!(b.colorspace, Colorspace::Rgba);
        assert_eq!(b.depth, ChannelDepth::Eight);
        assert_eq!(b.positions, [2, 1, 0, 3]);
        assert_eq!(b.alpha_source, None);

        let b = resolve(&meta(Photometric::Rgb, 16, 3, vec![]), false).unwrap();
        assert_eq!(b.depth, ChannelDepth::Sixteen);
    }

    #[test]
    fn min_is_white_requests_inversion() {
        let b = resolve(&meta(Photometric::MinIsWhite, 8, 1, vec![]), false).unwrap();
        assert_eq!(b.colorspace, Colorspace::GrayA);
        assert_eq!(b.post, PostProcess::Invert);
        assert_eq!(
            resolve(&meta(Photometric::MinIsBlack, 8, 1, vec![]), false)
                .unwrap()
                .post,
            PostProcess::None
        );
    }

    #[test]
    fn alpha_is_first_associated_extra() {
        let extras = vec![
            ExtraSampleKind::Unspecified,
            ExtraSampleKind::AssociatedAlpha,
        ];
        let b = resolve(&meta(Photometric::Rgb, 8, 5, extras), false).unwrap();
        assert_eq!(b.alpha_source, Some(4));
        assert_eq!(b.source_samples, 5);

        // Extra samples without the associated-alpha tag produce no alpha.
        let extras = vec![ExtraSampleKind::UnassociatedAlpha];
        let b = resolve(&meta(Photometric::Rgb, 8, 4, extras), false).unwrap();
        assert_eq!(b.alpha_source, None);
    }

    #[test]
    fn separated_ink_set_fallback() {
        let mut m = meta(Photometric::Separated, 8, 4, vec![]);
        m.ink_set = 2;
        let b = resolve(&m, false).unwrap();
        assert_eq!(b.colorspace, Colorspace::Cmyka);

        let mut m = meta(Photometric::Separated, 8, 3, vec![]);
        m.ink_set = 2;
        assert!(matches!(
            resolve(&m, false),
            Err(TiffError::UnsupportedColorspace(_))
        ));
    }

    #[test]
    fn lab_is_always_sixteen_bit() {
        let b = resolve(&meta(Photometric::CieLab, 8, 3, vec![]), false).unwrap();
        assert_eq!(b.depth, ChannelDepth::Sixteen);
        assert_eq!(b.post, PostProcess::None);

        let b = resolve(&meta(Photometric::IccLab, 16, 3, vec![]), false).unwrap();
        assert_eq!(b.post, PostProcess::IccLabToCieLab);
    }

    #[test]
    fn palette_requires_color_map() {
        assert!(matches!(
            resolve(&meta(Photometric::Palette, 4, 1, vec![]), false),
            Err(TiffError::InvalidDirectory(_))
        ));

        let mut m = meta(Photometric::Palette, 4, 1, vec![]);
        m.palette = Some(Palette {
            red: vec![0; 16],
            green: vec![0; 16],
            blue: vec![0; 16],
        });
        let b = resolve(&m, false).unwrap();
        assert_eq!(b.colorspace, Colorspace::Rgba);
        assert_eq!(b.depth, ChannelDepth::Sixteen);
        assert_eq!(b.source_color_channels, 1);
    }

    #[test]
    fn unknown_photometric_is_unsupported() {
        assert!(matches!(
            resolve(&meta(Photometric::Unknown(6), 8, 3, vec![]), false),
            Err(TiffError::UnsupportedColorspace(_))
        ));
    }

    #[test]
    fn undersized_sample_count_is_invalid() {
        let extras = vec![ExtraSampleKind::AssociatedAlpha];
        assert!(matches!(
            resolve(&meta(Photometric::Rgb, 8, 3, extras), false),
            Err(TiffError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn samples_absent_is_inferred() {
        let b = resolve(&meta(Photometric::Rgb, 8, 0, vec![]), false).unwrap();
        assert_eq!(b.source_samples, 3);
        let b = resolve(
            &meta(Photometric::Rgb, 8, 0, vec![ExtraSampleKind::AssociatedAlpha]),
            false,
        )
        .unwrap();
        assert_eq!(b.source_samples, 4);
        assert_eq!(b.alpha_source, Some(3));
    }

    #[test]
    fn post_process_primitives() {
        let mut px = [0u8, 64, 255];
        PostProcess::Invert.apply8(&mut px);
        assert_eq!(px, [255, 191, 0]);

        let mut lab = [1000u16, 0x8000, 0x8001];
        PostProcess::IccLabToCieLab.apply16(&mut lab);
        assert_eq!(lab, [1000, 0, 1]);
    }
}
