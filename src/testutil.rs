//! Fixture builders shared by unit tests.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use lopdf::{Document, Object, Stream, dictionary};

/// A document with one empty page per entry of `sizes`.
pub fn pdf_document(sizes: &[(f32, f32)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = sizes
        .iter()
        .map(|&(w, h)| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
                "Resources" => dictionary! {},
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => sizes.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write [`pdf_document`] to `dir/name`.
pub fn write_pdf(dir: &Path, name: &str, sizes: &[(f32, f32)]) -> PathBuf {
    let path = dir.join(name);
    pdf_document(sizes).save(&path).unwrap();
    path
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a `width`x`height` RGB PNG to `dir/name`.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    gradient(width, height)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

/// Write a `width`x`height` RGB JPEG to `dir/name`.
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    gradient(width, height)
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();
    path
}

/// MediaBox width and height of every page, in page order.
pub fn page_sizes(doc: &Document) -> Vec<(f32, f32)> {
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).unwrap();
            let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
            (
                media_box[2].as_float().unwrap(),
                media_box[3].as_float().unwrap(),
            )
        })
        .collect()
}
