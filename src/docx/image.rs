//! Image format detection and dimension sniffing.
//!
//! Embedded screenshots are scaled to a fixed display width, so the embedder
//! needs the pixel aspect ratio. Reading it straight from the PNG/JPEG
//! headers avoids pulling in a full image decoder.

use crate::docx::xml::XmlNode;
use crate::error::{Error, Result};

const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Supported embedded image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
}

impl ImageFormat {
    /// File extension used when storing the image in `word/media/`.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// Content type registered in `[Content_Types].xml`.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8];

/// Detect the image format from magic bytes.
pub fn detect_image_format(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(PNG_MAGIC) {
        Ok(ImageFormat::Png)
    } else if data.starts_with(JPEG_MAGIC) {
        Ok(ImageFormat::Jpeg)
    } else {
        Err(Error::Image("unsupported image format".to_string()))
    }
}

/// Pixel dimensions `(width, height)` of a PNG or JPEG image, when the
/// header can be read.
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    match detect_image_format(data).ok()? {
        ImageFormat::Png => png_dimensions(data),
        ImageFormat::Jpeg => jpeg_dimensions(data),
    }
}

/// PNG stores width/height big-endian in the IHDR chunk, which is required
/// to come first.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
    Some((width, height))
}

/// JPEG dimensions live in the first SOF marker segment.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Standalone markers without a length field
        if (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            if pos + 9 > data.len() {
                return None;
            }
            let height = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let width = u16::from_be_bytes([data[pos + 7], data[pos + 8]]) as u32;
            return Some((width, height));
        }
        pos += 2 + length;
    }
    None
}

/// Build a `w:drawing` element showing a relationship-referenced image
/// inline at the given extent (EMU).
///
/// Namespaces are declared locally so the element is valid regardless of
/// what the document root declares.
pub fn make_inline_drawing(rel_id: &str, name: &str, cx: u64, cy: u64, doc_pr_id: u32) -> XmlNode {
    let cx = cx.to_string();
    let cy = cy.to_string();

    let blip = XmlNode::new("a:blip")
        .with_attr("xmlns:r", NS_R)
        .with_attr("r:embed", rel_id);
    let blip_fill = XmlNode::new("pic:blipFill")
        .with_child(blip)
        .with_child(XmlNode::new("a:stretch").with_child(XmlNode::new("a:fillRect")));

    let xfrm = XmlNode::new("a:xfrm")
        .with_child(XmlNode::new("a:off").with_attr("x", "0").with_attr("y", "0"))
        .with_child(
            XmlNode::new("a:ext")
                .with_attr("cx", cx.clone())
                .with_attr("cy", cy.clone()),
        );
    let sp_pr = XmlNode::new("pic:spPr").with_child(xfrm).with_child(
        XmlNode::new("a:prstGeom")
            .with_attr("prst", "rect")
            .with_child(XmlNode::new("a:avLst")),
    );

    let nv_pic_pr = XmlNode::new("pic:nvPicPr")
        .with_child(
            XmlNode::new("pic:cNvPr")
                .with_attr("id", "0")
                .with_attr("name", name),
        )
        .with_child(XmlNode::new("pic:cNvPicPr"));

    let pic = XmlNode::new("pic:pic")
        .with_attr("xmlns:pic", NS_PIC)
        .with_child(nv_pic_pr)
        .with_child(blip_fill)
        .with_child(sp_pr);

    let graphic = XmlNode::new("a:graphic")
        .with_attr("xmlns:a", NS_A)
        .with_child(
            XmlNode::new("a:graphicData")
                .with_attr("uri", NS_PIC)
                .with_child(pic),
        );

    let inline = XmlNode::new("wp:inline")
        .with_attr("xmlns:wp", NS_WP)
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            XmlNode::new("wp:extent")
                .with_attr("cx", cx)
                .with_attr("cy", cy),
        )
        .with_child(
            XmlNode::new("wp:docPr")
                .with_attr("id", doc_pr_id.to_string())
                .with_attr("name", name),
        )
        .with_child(graphic);

    XmlNode::new("w:drawing").with_child(inline)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 1-pixel-free PNG header declaring 800x600.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        // APP0 segment
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
        // SOF0 segment: length 17, precision 8, height, width
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data
    }

    #[test]
    fn test_detect_formats() {
        assert_eq!(
            detect_image_format(&png_header(1, 1)).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            detect_image_format(&jpeg_header(1, 1)).unwrap(),
            ImageFormat::Jpeg
        );
        assert!(detect_image_format(b"GIF89a").is_err());
    }

    #[test]
    fn test_png_dimensions() {
        assert_eq!(image_dimensions(&png_header(800, 600)), Some((800, 600)));
    }

    #[test]
    fn test_jpeg_dimensions() {
        assert_eq!(
            image_dimensions(&jpeg_header(1280, 720)),
            Some((1280, 720))
        );
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(image_dimensions(&PNG_MAGIC[..6]), None);
        assert_eq!(image_dimensions(PNG_MAGIC), None);
    }

    #[test]
    fn test_inline_drawing_references_relationship() {
        let drawing = make_inline_drawing("rId9", "capture_home.png", 5_669_280, 3_190_000, 3);
        let blip = drawing.descendant("a:blip").unwrap();
        assert_eq!(blip.attr("r:embed"), Some("rId9"));
        let extent = drawing.descendant("wp:extent").unwrap();
        assert_eq!(extent.attr("cx"), Some("5669280"));
        assert_eq!(extent.attr("cy"), Some("3190000"));
    }
}
