mod png;
mod svg;

pub use png::PngRenderer;
pub use svg::{SvgRenderer, optimize_svg};

use qrcode::bits::Bits;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};

use crate::error::QrTransferError;

pub const MIN_SIZE: u32 = 120;
pub const MAX_SIZE: u32 = 1000;
pub const DEFAULT_SIZE: u32 = 320;

/// Quiet zone around the symbol, in modules.
pub const MARGIN_MODULES: usize = 1;

pub const EC_LEVEL: EcLevel = EcLevel::M;

const MAX_VERSION: i16 = 40;

/// Output format of a generated QR image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    /// Format used by the direct image endpoint: anything but `png` is SVG.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("png") => Self::Png,
            _ => Self::Svg,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml; charset=utf-8",
        }
    }
}

/// A generated image, ready to be written to a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedImage {
    Svg { markup: String },
    Png { bytes: Vec<u8> },
}

impl EncodedImage {
    pub fn format(&self) -> ImageFormat {
        match self {
            Self::Svg { .. } => ImageFormat::Svg,
            Self::Png { .. } => ImageFormat::Png,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Svg { markup } => markup.into_bytes(),
            Self::Png { bytes } => bytes,
        }
    }
}

/// Clamp a requested pixel width into `MIN_SIZE..=MAX_SIZE`.
pub fn clamp_size(requested: i64) -> u32 {
    requested.clamp(MIN_SIZE as i64, MAX_SIZE as i64) as u32
}

/// Parse a `size` query value into an effective size.
///
/// Missing or non-numeric values fall back to [`DEFAULT_SIZE`]; fractional
/// values are rounded before clamping.
pub fn effective_size(requested: Option<&str>) -> u32 {
    let parsed = requested
        .map(str::trim)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|value| value.is_finite());

    match parsed {
        // Saturating float-to-int cast keeps huge values clamped to MAX_SIZE.
        Some(value) => clamp_size(value.round() as i64),
        None => DEFAULT_SIZE,
    }
}

/// A validated request to the encode service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    data: String,
    size: u32,
    format: ImageFormat,
}

impl EncodeRequest {
    /// Build a request, rejecting data that is empty after trimming.
    ///
    /// The data itself is kept as given; only the emptiness check trims.
    pub fn new(data: impl Into<String>, size: i64, format: ImageFormat) -> Result<Self, QrTransferError> {
        let data = data.into();
        if data.trim().is_empty() {
            return Err(QrTransferError::InvalidInput);
        }
        Ok(Self {
            data,
            size: clamp_size(size),
            format,
        })
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Trait for turning an encoded QR symbol into an image payload.
pub trait ImageRenderer: Send + Sync {
    /// Render `symbol` at `size` pixels wide, including the quiet zone.
    fn render(&self, symbol: &Symbol, size: u32) -> Result<EncodedImage, QrTransferError>;

    /// Format this renderer produces.
    fn format(&self) -> ImageFormat;
}

/// The module matrix of an encoded QR symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    width: usize,
    dark: Vec<bool>,
}

impl Symbol {
    /// Encode `data` at the default error-correction level.
    ///
    /// ASCII input gets the encoder's mixed-mode segmentation. Anything else
    /// is written as a single byte segment so UTF-8 sequences are never
    /// misread as Shift JIS and packed in kanji mode.
    pub fn encode(data: &str) -> Result<Self, QrTransferError> {
        let code = if data.is_ascii() {
            QrCode::with_error_correction_level(data.as_bytes(), EC_LEVEL)?
        } else {
            byte_mode_code(data.as_bytes())?
        };
        let dark = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();
        Ok(Self {
            width: code.width(),
            dark,
        })
    }

    /// Modules per side, without the quiet zone.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Modules per side, including the quiet zone on both edges.
    pub fn outer_width(&self) -> usize {
        self.width + 2 * MARGIN_MODULES
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }

    /// Whether the module at quiet-zone-inclusive coordinates is dark.
    pub fn is_dark_with_margin(&self, x: usize, y: usize) -> bool {
        match (x.checked_sub(MARGIN_MODULES), y.checked_sub(MARGIN_MODULES)) {
            (Some(x), Some(y)) => self.is_dark(x, y),
            _ => false,
        }
    }
}

/// Placement of a symbol on a square pixel canvas.
///
/// Every module covers the same whole number of pixels and the symbol is
/// centred, so decoders never see modules of uneven width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Canvas side in pixels.
    pub canvas: u32,
    /// Pixels per module.
    pub scale: u32,
    /// Light padding before the quiet zone, on both axes.
    pub offset: u32,
}

impl Layout {
    /// Fit `symbol` into `size` pixels. A symbol with more modules than
    /// pixels gets one pixel per module and a canvas of its own width.
    pub fn fit(symbol: &Symbol, size: u32) -> Self {
        let outer = symbol.outer_width() as u32;
        let scale = (size / outer).max(1);
        let canvas = size.max(outer * scale);
        Self {
            canvas,
            scale,
            offset: (canvas - outer * scale) / 2,
        }
    }

    /// Whether the canvas pixel at `(x, y)` is dark.
    pub fn is_dark_at(&self, symbol: &Symbol, x: u32, y: u32) -> bool {
        let module = |pixel: u32| pixel.checked_sub(self.offset).map(|p| (p / self.scale) as usize);
        match (module(x), module(y)) {
            (Some(x), Some(y)) => symbol.is_dark_with_margin(x, y),
            _ => false,
        }
    }
}

/// Smallest symbol holding `data` as one byte segment.
fn byte_mode_code(data: &[u8]) -> Result<QrCode, QrError> {
    for number in 1..=MAX_VERSION {
        let mut bits = Bits::new(Version::Normal(number));
        let pushed = bits
            .push_byte_data(data)
            .and_then(|()| bits.push_terminator(EC_LEVEL));
        match pushed {
            Ok(()) => return QrCode::with_bits(bits, EC_LEVEL),
            Err(QrError::DataTooLong) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(QrError::DataTooLong)
}

/// Check that `data` fits in a QR symbol without rendering an image.
pub fn ensure_encodable(data: &str) -> Result<(), QrTransferError> {
    Symbol::encode(data).map(|_| ())
}

/// Encode a request into an image in the requested format.
pub fn encode(request: &EncodeRequest) -> Result<EncodedImage, QrTransferError> {
    let renderer: &dyn ImageRenderer = match request.format() {
        ImageFormat::Png => &PngRenderer,
        ImageFormat::Svg => &SvgRenderer,
    };
    encode_with(request, renderer)
}

/// Encode a request with an explicit renderer.
pub fn encode_with(
    request: &EncodeRequest,
    renderer: &dyn ImageRenderer,
) -> Result<EncodedImage, QrTransferError> {
    let symbol = Symbol::encode(request.data())?;
    let image = renderer.render(&symbol, request.size())?;
    tracing::debug!(
        format = renderer.format().as_str(),
        size = request.size(),
        modules = symbol.width(),
        "generated QR image"
    );
    Ok(image)
}
