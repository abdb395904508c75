use std::fmt::Write as _;

use super::{EncodedImage, ImageFormat, ImageRenderer, Layout, Symbol};
use crate::error::QrTransferError;

const MAX_PASSES: usize = 4;

/// Renders vector markup on the same pixel grid as the PNG output, then
/// minimizes it.
pub struct SvgRenderer;

impl SvgRenderer {
    fn markup(symbol: &Symbol, size: u32) -> Result<String, std::fmt::Error> {
        let Layout {
            canvas,
            scale,
            offset,
        } = Layout::fit(symbol, size);
        let outer = symbol.outer_width();

        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        writeln!(
            out,
            "<!-- QR code: {0} x {0} modules, {scale} px per module -->",
            symbol.width()
        )?;
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{canvas}" height="{canvas}" viewBox="0 0 {canvas} {canvas}" shape-rendering="crispEdges">"#
        )?;
        writeln!(
            out,
            r##"  <rect x="0" y="0" width="{canvas}" height="{canvas}" fill="#ffffff" stroke="none"/>"##
        )?;
        write!(out, r##"  <path fill="#000000" stroke="none" d=""##)?;

        // One closed rectangle per horizontal run of dark modules.
        for y in 0..outer {
            let mut x = 0;
            while x < outer {
                if !symbol.is_dark_with_margin(x, y) {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < outer && symbol.is_dark_with_margin(x, y) {
                    x += 1;
                }
                let left = offset + start as u32 * scale;
                let top = offset + y as u32 * scale;
                let right = offset + x as u32 * scale;
                let bottom = top + scale;
                write!(out, "M {left} {top} H {right} V {bottom} H {left} Z ")?;
            }
        }
        writeln!(out, r#""/>"#)?;
        writeln!(out, "</svg>")?;
        Ok(out)
    }
}

impl ImageRenderer for SvgRenderer {
    fn render(&self, symbol: &Symbol, size: u32) -> Result<EncodedImage, QrTransferError> {
        let markup = Self::markup(symbol, size)
            .map_err(|e| eyre::eyre!("writing SVG markup: {e}"))?;
        Ok(EncodedImage::Svg {
            markup: optimize_svg(&markup)?,
        })
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Svg
    }
}

/// Minimize SVG markup without changing how it renders.
///
/// The document is parsed into a normalized `usvg` tree and written back
/// without declarations, comments, indentation or default-valued attributes.
/// Passes repeat until the output stops changing.
pub fn optimize_svg(markup: &str) -> Result<String, QrTransferError> {
    let options = usvg::Options::default();
    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        ..usvg::WriteOptions::default()
    };

    let mut current = markup.trim().to_string();
    for _ in 0..MAX_PASSES {
        let tree = usvg::Tree::from_str(&current, &options)
            .map_err(|e| eyre::eyre!("parsing SVG markup: {e}"))?;
        let next = tree.to_string(&write_options).trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(data: &str, size: u32) -> String {
        let symbol = Symbol::encode(data).unwrap();
        match SvgRenderer.render(&symbol, size).unwrap() {
            EncodedImage::Svg { markup } => markup,
            other => panic!("expected SVG, got {other:?}"),
        }
    }

    #[test]
    fn raw_markup_uses_whole_pixel_modules() {
        let symbol = Symbol::encode("hello").unwrap();
        let raw = SvgRenderer::markup(&symbol, 120).unwrap();
        assert!(raw.contains(r#"width="120" height="120" viewBox="0 0 120 120""#));
        // Finder pattern's top edge: seven modules of five pixels after the padding and quiet zone.
        assert!(raw.contains("M 7 7 H 42 V 12 H 7 Z"));
    }

    #[test]
    fn strips_declaration_comments_and_whitespace() {
        let markup = render("hello", 320);
        assert!(markup.starts_with("<svg"));
        assert!(markup.ends_with("</svg>"));
        assert!(!markup.contains("<?xml"));
        assert!(!markup.contains("<!--"));
        assert!(!markup.contains('\n'));
    }

    #[test]
    fn keeps_requested_dimensions() {
        let markup = render("hello", 320);
        assert!(markup.contains("width=\"320\""));
        assert!(markup.contains("height=\"320\""));
    }

    #[test]
    fn optimization_reaches_fixpoint() {
        let symbol = Symbol::encode("fixpoint").unwrap();
        let raw = SvgRenderer::markup(&symbol, 320).unwrap();
        let once = optimize_svg(&raw).unwrap();
        assert_eq!(optimize_svg(&once).unwrap(), once);
    }

    #[test]
    fn malformed_markup_is_an_error() {
        assert!(matches!(
            optimize_svg("<svg><path"),
            Err(QrTransferError::Unexpected(_))
        ));
    }
}
