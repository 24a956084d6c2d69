//! Color management: embedded-profile binding and perceptual transforms.
//!
//! An embedded profile that is usable as an output profile stays bound to
//! the decoded layer unchanged. A profile that cannot drive output (an
//! input-only scanner/camera profile) is converted away: pixels pass through
//! a perceptual-intent transform into the colorspace's built-in working
//! profile and the layer keeps no profile. CMYK and Lab profiles always bind
//! directly — there is no built-in working profile to convert into.

use alloc::vec::Vec;

use lcms2::{CIExyY, ColorSpaceSignature, Intent, PixelFormat, Profile, ToneCurve, Transform};

use crate::raster::{ChannelDepth, Colorspace};

/// A per-directory transform handle, applied row by row over the color
/// channels by the channel writer and released with the binding.
pub(crate) struct CmsTransform {
    transform: Transform<u8, u8>,
}

impl CmsTransform {
    /// Transform packed color-channel bytes in place. The buffer layout must
    /// match the pixel format the transform was created with.
    pub(crate) fn transform_in_place(&self, color: &mut [u8]) {
        self.transform.transform_in_place(color);
    }
}

/// Resolve an embedded profile against the destination colorspace.
///
/// Returns `(transform, profile_bytes)` — at most one of the two is `Some`.
/// Malformed profiles are passed through untouched rather than failing the
/// decode; profiles for a different color model are dropped.
pub(crate) fn bind_profile(
    icc: &[u8],
    colorspace: Colorspace,
    depth: ChannelDepth,
) -> (Option<CmsTransform>, Option<Vec<u8>>) {
    let profile = match Profile::new_icc(icc) {
        Ok(p) => p,
        Err(_) => return (None, Some(icc.to_vec())),
    };

    let expected = match colorspace {
        Colorspace::GrayA => ColorSpaceSignature::GrayData,
        Colorspace::Rgba => ColorSpaceSignature::RgbData,
        Colorspace::Cmyka => ColorSpaceSignature::CmykData,
        Colorspace::Laba => ColorSpaceSignature::LabData,
    };
    if profile.color_space() != expected {
        return (None, None);
    }

    if matches!(colorspace, Colorspace::Cmyka | Colorspace::Laba) {
        return (None, Some(icc.to_vec()));
    }

    if is_suitable_for_output(&profile) {
        return (None, Some(icc.to_vec()));
    }

    // Input-only profile: convert into the built-in working profile.
    let working = if colorspace == Colorspace::Rgba {
        Profile::new_srgb()
    } else {
        match builtin_gray() {
            Ok(p) => p,
            Err(_) => return (None, Some(icc.to_vec())),
        }
    };
    let format = row_pixel_format(colorspace, depth);
    match Transform::new(&profile, format, &working, format, Intent::Perceptual) {
        Ok(transform) => (Some(CmsTransform { transform }), None),
        Err(_) => (None, Some(icc.to_vec())),
    }
}

fn is_suitable_for_output(profile: &Profile) -> bool {
    // LCMS `LCMS_USED_AS_OUTPUT` direction constant.
    const USED_AS_OUTPUT: u32 = 1;
    profile.is_matrix_shaper() || profile.is_clut(Intent::Perceptual, USED_AS_OUTPUT)
}

/// Pixel format of one packed color-channel row (alpha excluded) in layer
/// memory order: B,G,R for `Rgba` layers. Only gray and RGB layers are ever
/// transformed.
fn row_pixel_format(colorspace: Colorspace, depth: ChannelDepth) -> PixelFormat {
    match (colorspace, depth) {
        (Colorspace::GrayA, ChannelDepth::Eight) => PixelFormat::GRAY_8,
        (Colorspace::GrayA, ChannelDepth::Sixteen) => PixelFormat::GRAY_16,
        (_, ChannelDepth::Eight) => PixelFormat::BGR_8,
        (_, ChannelDepth::Sixteen) => PixelFormat::BGR_16,
    }
}

fn builtin_gray() -> lcms2::LCMSResult<Profile> {
    // D50 white point, 2.2 gamma.
    let white = CIExyY { x: 0.3457, y: 0.3585, Y: 1.0 };
    let curve = ToneCurve::new(2.2);
    Profile::new_gray(&white, &curve)
}
