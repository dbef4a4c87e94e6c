//! Build an image-only PDF from JPEG-encoded pages.
//!
//! Each page gets one DCTDecode image XObject drawn over the whole MediaBox.
//! The JPEG bytes are embedded as-is; no re-encoding happens here.

use crate::error::PdfEditError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

const IMAGE_NAME: &str = "Im0";

/// One output page: a JPEG plus its physical size.
#[derive(Debug, Clone)]
pub struct JpegPage {
    pub jpeg: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Page size in PDF points.
    pub width_pt: f32,
    pub height_pt: f32,
}

impl JpegPage {
    /// A page whose point size is the pixel size divided by the render scale.
    pub fn from_render(jpeg: Vec<u8>, pixel_width: u32, pixel_height: u32, scale: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        Self {
            jpeg,
            pixel_width,
            pixel_height,
            width_pt: pixel_width as f32 / scale,
            height_pt: pixel_height as f32 / scale,
        }
    }
}

fn image_xobject(page: &JpegPage) -> Stream {
    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(page.pixel_width as i64)),
        ("Height", Object::Integer(page.pixel_height as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"DCTDecode".to_vec())),
    ]);
    Stream::new(dict, page.jpeg.clone()).with_compression(false)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: &JpegPage,
) -> Result<ObjectId, PdfEditError> {
    let image_id = doc.add_object(image_xobject(page));

    // Scale the unit image square up to the full page.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page.width_pt.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    page.height_pt.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfEditError::DocumentAssembly(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let xobjects = Dictionary::from_iter(vec![(IMAGE_NAME, Object::Reference(image_id))]);
    let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);

    let page_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                page.width_pt.into(),
                page.height_pt.into(),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);
    Ok(doc.add_object(page_dict))
}

/// Assemble `pages` into a PDF and serialise it.
pub fn assemble_jpeg_pdf(pages: &[JpegPage]) -> Result<Vec<u8>, PdfEditError> {
    if pages.is_empty() {
        return Err(PdfEditError::NoPagesSelected);
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        page_ids.push(add_page(&mut doc, pages_id, page)?);
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfEditError::DocumentAssembly(e.to_string()))?;
    debug!("Assembled {} image pages ({} bytes)", pages.len(), buffer.len());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_jpeg;
    use image::{DynamicImage, Rgb, RgbImage};

    fn jpeg_page(w: u32, h: u32, scale: f32) -> JpegPage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 40, 40])));
        JpegPage::from_render(encode_jpeg(&img, 70, 1).unwrap(), w, h, scale)
    }

    fn num(o: &Object) -> f32 {
        match o {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            other => panic!("not a number: {other:?}"),
        }
    }

    #[test]
    fn point_size_is_pixels_over_scale() {
        let p = jpeg_page(1224, 1584, 2.0);
        assert_eq!((p.width_pt, p.height_pt), (612.0, 792.0));
    }

    #[test]
    fn one_page_per_jpeg() {
        let bytes = assemble_jpeg_pdf(&[jpeg_page(20, 30, 2.0), jpeg_page(30, 20, 2.0)]).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn pages_carry_mediabox_and_dct_image() {
        let bytes = assemble_jpeg_pdf(&[jpeg_page(40, 60, 2.0)]).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();

        let media_box: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(num)
            .collect();
        assert_eq!(media_box, vec![0.0, 0.0, 20.0, 30.0]);

        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| {
                s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Image".as_slice())
            })
            .expect("image xobject");
        assert_eq!(
            image.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"DCTDecode"
        );
        assert_eq!(image.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 40);
        assert_eq!(&image.content[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            assemble_jpeg_pdf(&[]),
            Err(PdfEditError::NoPagesSelected)
        ));
    }
}
