//! Encode-then-decode round trips for every supported colorspace and depth.

use enough::Unstoppable;
use zentiff::*;

fn noise_u8(samples: usize) -> Vec<u8> {
    let mut state: u32 = 0xDEAD_BEEF;
    let mut out = vec![0u8; samples];
    for v in out.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *v = state as u8;
    }
    out
}

fn noise_u16(samples: usize) -> Vec<u16> {
    let mut state: u32 = 0xC0FF_EE11;
    let mut out = vec![0u16; samples];
    for v in out.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *v = state as u16;
    }
    out
}

fn roundtrip_u8(w: u32, h: u32, cs: Colorspace) {
    let pixels = noise_u8(w as usize * h as usize * cs.channels());
    let layer =
        Layer::from_data(w, h, cs, ChannelDepth::Eight, LayerData::U8(pixels.clone())).unwrap();
    let mut image = RasterImage::new();
    image.push_layer(layer);

    let encoded = encode(&image, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();

    assert_eq!(decoded.layers.len(), 1);
    let out = &decoded.layers[0];
    assert_eq!((out.width, out.height), (w, h));
    assert_eq!(out.colorspace, cs);
    assert_eq!(out.depth, ChannelDepth::Eight);
    assert_eq!(out.data().as_u8().unwrap(), &pixels[..]);
}

fn roundtrip_u16(w: u32, h: u32, cs: Colorspace) {
    let pixels = noise_u16(w as usize * h as usize * cs.channels());
    let layer =
        Layer::from_data(w, h, cs, ChannelDepth::Sixteen, LayerData::U16(pixels.clone())).unwrap();
    let mut image = RasterImage::new();
    image.push_layer(layer);

    let encoded = encode(&image, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();

    let out = &decoded.layers[0];
    assert_eq!((out.width, out.height), (w, h));
    assert_eq!(out.colorspace, cs);
    assert_eq!(out.depth, ChannelDepth::Sixteen);
    assert_eq!(out.data().as_u16().unwrap(), &pixels[..]);
}

#[test]
fn graya_roundtrips() {
    roundtrip_u8(5, 4, Colorspace::GrayA);
    roundtrip_u16(5, 4, Colorspace::GrayA);
}

#[test]
fn rgba_roundtrips() {
    roundtrip_u8(7, 3, Colorspace::Rgba);
    roundtrip_u16(7, 3, Colorspace::Rgba);
}

#[test]
fn cmyka_roundtrips() {
    roundtrip_u8(4, 6, Colorspace::Cmyka);
    roundtrip_u16(4, 6, Colorspace::Cmyka);
}

#[test]
fn laba_roundtrip() {
    roundtrip_u16(3, 3, Colorspace::Laba);
}

#[test]
fn single_pixel_roundtrip() {
    roundtrip_u8(1, 1, Colorspace::Rgba);
}

#[test]
fn narrow_strips_roundtrip() {
    let w = 5u32;
    let h = 7u32;
    let pixels = noise_u8(w as usize * h as usize * 4);
    let layer = Layer::from_data(
        w,
        h,
        Colorspace::Rgba,
        ChannelDepth::Eight,
        LayerData::U8(pixels.clone()),
    )
    .unwrap();
    let mut image = RasterImage::new();
    image.push_layer(layer);

    // One-row strips must decode identically to the default grouping.
    let encoded = EncodeRequest::new()
        .with_rows_per_strip(1)
        .encode(&image, Unstoppable)
        .unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.layers[0].data().as_u8().unwrap(), &pixels[..]);
}

#[test]
fn multi_layer_roundtrip_grows_canvas() {
    let a_pixels = noise_u8(4 * 2 * 2);
    let b_pixels = noise_u16(2 * 6 * 4);
    let mut image = RasterImage::new();
    image.push_layer(
        Layer::from_data(
            4,
            2,
            Colorspace::GrayA,
            ChannelDepth::Eight,
            LayerData::U8(a_pixels.clone()),
        )
        .unwrap(),
    );
    image.push_layer(
        Layer::from_data(
            2,
            6,
            Colorspace::Rgba,
            ChannelDepth::Sixteen,
            LayerData::U16(b_pixels.clone()),
        )
        .unwrap(),
    );

    let encoded = encode(&image, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();

    assert_eq!((decoded.width, decoded.height), (4, 6));
    assert_eq!(decoded.layers.len(), 2);
    assert_eq!(decoded.layers[0].data().as_u8().unwrap(), &a_pixels[..]);
    assert_eq!(decoded.layers[1].data().as_u16().unwrap(), &b_pixels[..]);
}

#[test]
fn document_metadata_roundtrip() {
    let mut image = RasterImage::new();
    image.push_layer(
        Layer::from_data(
            2,
            2,
            Colorspace::GrayA,
            ChannelDepth::Eight,
            LayerData::U8(vec![0; 8]),
        )
        .unwrap(),
    );
    image.info = DocumentInfo {
        title: Some("composition".into()),
        description: Some("a gray square".into()),
        author: Some("nobody in particular".into()),
    };
    image.resolution = Some(Resolution { x_dpi: 300.0, y_dpi: 150.0 });

    let encoded = encode(&image, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();

    assert_eq!(decoded.info, image.info);
    let res = decoded.resolution.unwrap();
    assert!((res.x_dpi - 300.0).abs() < 1e-6);
    assert!((res.y_dpi - 150.0).abs() < 1e-6);
}

#[test]
fn icc_profile_bytes_survive_roundtrip() {
    // Not a parseable profile: binding falls back to carrying the bytes.
    let icc = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE];
    let mut layer = Layer::from_data(
        2,
        1,
        Colorspace::Rgba,
        ChannelDepth::Eight,
        LayerData::U8(vec![1, 2, 3, 4, 5, 6, 7, 8]),
    )
    .unwrap();
    layer.icc_profile = Some(icc.clone());
    let mut image = RasterImage::new();
    image.push_layer(layer);

    let encoded = encode(&image, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.layers[0].icc_profile.as_deref(), Some(&icc[..]));

    let decoded = DecodeRequest::new(&encoded)
        .without_color_management()
        .decode(Unstoppable)
        .unwrap();
    assert_eq!(decoded.layers[0].icc_profile.as_deref(), Some(&icc[..]));
}

#[test]
fn limits_reject_large() {
    let mut image = RasterImage::new();
    image.push_layer(
        Layer::from_data(
            2,
            2,
            Colorspace::GrayA,
            ChannelDepth::Eight,
            LayerData::U8(vec![0; 8]),
        )
        .unwrap(),
    );
    let encoded = encode(&image, Unstoppable).unwrap();

    let limits = Limits { max_pixels: Some(1), ..Default::default() };
    let result = DecodeRequest::new(&encoded)
        .with_limits(&limits)
        .decode(Unstoppable);
    match result.unwrap_err() {
        TiffError::LimitExceeded(_) => {}
        other => panic!("expected LimitExceeded, got {other:?}"),
    }
}
