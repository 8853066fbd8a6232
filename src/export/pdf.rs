//! Multi-page print PDF built with `lopdf`.
//!
//! Each page carries one RGB image XObject drawn from the page origin and
//! scaled to the full `MediaBox`, so there is no margin and no resampling:
//! the printer receives the tile pixels as-is.

use crate::geometry::PaperDimensions;
use crate::imaging::PixelBuffer;
use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

/// One tile and the effective (orientation-aware) page it prints on.
#[derive(Debug, Clone, Copy)]
pub struct PdfPage<'a> {
    pub image: &'a PixelBuffer,
    pub page: PaperDimensions,
}

fn rgb_bytes(image: &PixelBuffer) -> Vec<u8> {
    image.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect()
}

/// PDF text string: ASCII stays literal, anything else is UTF-16BE with a
/// byte-order mark, since plain literals are read as PDFDocEncoding.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn pdf_date(at: DateTime<Utc>) -> String {
    at.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Encode `pages` in order, one PDF page each.
pub fn build_pdf(
    pages: &[PdfPage<'_>],
    title: &str,
    created: DateTime<Utc>,
) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let id_pages = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let (width_pt, height_pt) = page.page.to_points();
        let (width_pt, height_pt) = (width_pt as f32, height_pt as f32);

        let id_image = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => page.image.width() as i64,
                "Height" => page.image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb_bytes(page.image),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let id_content = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let id_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => id_pages,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Contents" => id_content,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => id_image,
                },
            },
        });
        kids.push(id_page.into());
    }

    doc.set_object(
        id_pages,
        dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        },
    );

    let id_catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => id_pages,
    });
    doc.trailer.set("Root", id_catalog);

    let date = pdf_date(created);
    let id_info = doc.add_object(dictionary! {
        "Title" => text_string(title),
        "Producer" => Object::string_literal(concat!("colorpage ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(date.clone()),
        "ModDate" => Object::string_literal(date),
    });
    doc.trailer.set("Info", id_info);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Orientation, PaperSize, effective_page};
    use chrono::TimeZone;
    use image::Rgba;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn image_stream_bytes(doc: &Document, page_id: lopdf::ObjectId) -> Vec<u8> {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
        let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
        if stream.dict.has(b"Filter") {
            stream.decompressed_content().unwrap()
        } else {
            stream.content.clone()
        }
    }

    #[test]
    fn one_page_per_tile_in_order() {
        let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [9, 9, 9]];
        let tiles: Vec<PixelBuffer> = colors
            .iter()
            .map(|&[r, g, b]| PixelBuffer::from_pixel(4, 6, Rgba([r, g, b, 255])))
            .collect();
        let page = effective_page(PaperSize::A4, Orientation::Vertical);
        let pages: Vec<PdfPage> = tiles.iter().map(|image| PdfPage { image, page }).collect();

        let bytes = build_pdf(&pages, "test", created()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_ids = doc.get_pages();
        assert_eq!(page_ids.len(), 4);

        for (i, (_, page_id)) in page_ids.into_iter().enumerate() {
            let data = image_stream_bytes(&doc, page_id);
            assert_eq!(data.len(), 4 * 6 * 3);
            assert_eq!(&data[..3], &colors[i]);
        }
    }

    #[test]
    fn media_box_is_effective_page_in_points() {
        let tile = PixelBuffer::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        let page = effective_page(PaperSize::A4, Orientation::Horizontal);
        let bytes = build_pdf(&[PdfPage { image: &tile, page }], "landscape", created()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box: Vec<f32> = dict
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media_box[0], 0.0);
        assert!((media_box[2] - 841.89).abs() < 0.01, "{media_box:?}");
        assert!((media_box[3] - 595.28).abs() < 0.01, "{media_box:?}");
    }

    #[test]
    fn info_carries_title_and_date() {
        let tile = PixelBuffer::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let page = effective_page(PaperSize::B5, Orientation::Vertical);
        let bytes = build_pdf(&[PdfPage { image: &tile, page }], "dragons", created()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"dragons");
        assert_eq!(
            info.get(b"CreationDate").unwrap().as_str().unwrap(),
            b"D:20260314092653Z"
        );
    }

    #[test]
    fn non_ascii_title_is_utf16_with_bom() {
        let tile = PixelBuffer::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let page = effective_page(PaperSize::A5, Orientation::Vertical);
        let title = "공룡 dinosaurs";
        let bytes = build_pdf(&[PdfPage { image: &tile, page }], title, created()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        let raw = info.get(b"Title").unwrap().as_str().unwrap();
        assert_eq!(&raw[..2], &[0xFE, 0xFF]);
        let units: Vec<u16> = raw[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(String::from_utf16(&units).unwrap(), title);
    }
}
