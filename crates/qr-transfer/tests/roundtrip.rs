use qr_transfer::qr::{MAX_SIZE, MIN_SIZE};
use qr_transfer::{EncodeRequest, EncodedImage, ImageFormat, encode};

const SAMPLES: &[&str] = &[
    "https://qrtr.syaryn.com/",
    "hello world",
    "こんにちは、QRコード",
    "line one\nline two\ttabbed",
];

fn decode_greyscale(width: usize, height: usize, pixel: impl FnMut(usize, usize) -> u8) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, pixel);
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR grid");
    let (_meta, content) = grids[0].decode().expect("grid should decode");
    content
}

fn decode_png(bytes: &[u8]) -> String {
    let image = image::load_from_memory(bytes).expect("valid PNG").to_luma8();
    let (width, height) = image.dimensions();
    decode_greyscale(width as usize, height as usize, |x, y| {
        image.get_pixel(x as u32, y as u32).0[0]
    })
}

/// Render a generated SVG with resvg and decode the pixels.
fn decode_svg(markup: &str) -> String {
    let tree = resvg::usvg::Tree::from_str(markup, &resvg::usvg::Options::default())
        .expect("valid SVG");
    let size = tree.size().to_int_size();
    let mut pixmap =
        resvg::tiny_skia::Pixmap::new(size.width(), size.height()).expect("non-empty canvas");
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let width = size.width() as usize;
    let pixels = pixmap.data();
    decode_greyscale(width, size.height() as usize, |x, y| {
        pixels[(y * width + x) * 4]
    })
}

#[test]
fn png_roundtrip_at_size_bounds() {
    for data in SAMPLES {
        for size in [MIN_SIZE, MAX_SIZE] {
            let request = EncodeRequest::new(*data, size as i64, ImageFormat::Png).unwrap();
            let EncodedImage::Png { bytes } = encode(&request).unwrap() else {
                panic!("expected PNG output");
            };
            assert_eq!(decode_png(&bytes), *data, "size {size}");
        }
    }
}

#[test]
fn svg_roundtrip_at_size_bounds() {
    for data in SAMPLES {
        for size in [MIN_SIZE, MAX_SIZE] {
            let request = EncodeRequest::new(*data, size as i64, ImageFormat::Svg).unwrap();
            let EncodedImage::Svg { markup } = encode(&request).unwrap() else {
                panic!("expected SVG output");
            };
            assert!(markup.starts_with("<svg"));
            assert!(markup.ends_with("</svg>"));
            assert_eq!(decode_svg(&markup), *data, "size {size}");
        }
    }
}

#[test]
fn png_matches_requested_dimensions() {
    let request = EncodeRequest::new("dimensions", 457, ImageFormat::Png).unwrap();
    let EncodedImage::Png { bytes } = encode(&request).unwrap() else {
        panic!("expected PNG output");
    };
    let image = image::load_from_memory(&bytes).unwrap().to_luma8();
    assert_eq!(image.dimensions(), (457, 457));
}

#[test]
fn dense_symbol_still_decodes_at_minimum_size() {
    let data = "https://qrtr.syaryn.com/".repeat(4);
    for format in [ImageFormat::Png, ImageFormat::Svg] {
        let request = EncodeRequest::new(data.clone(), MIN_SIZE as i64, format).unwrap();
        let decoded = match encode(&request).unwrap() {
            EncodedImage::Png { bytes } => decode_png(&bytes),
            EncodedImage::Svg { markup } => decode_svg(&markup),
        };
        assert_eq!(decoded, data);
    }
}
