//! Conversion of raster images into single-page PDFs.
//!
//! The page is exactly as large as the image (one pixel per PDF unit) and
//! the image is drawn at the origin. JPEG data is embedded as-is; PNG data
//! is decoded and stored as Flate-compressed samples, with any alpha channel
//! split out into a soft mask.

use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::candidate::FileFormat;
use crate::error::{ArtifactError, Result};
use crate::lifecycle::discard;

/// Turns PNG and JPEG files into one-page PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer;

impl ImageNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Convert the image at `image_path` into a PDF written to `output_path`.
    ///
    /// The document is fully built and serialized in memory before anything
    /// is written, so a conversion failure never leaves a file behind. A
    /// failed write removes whatever part of the output made it to disk.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::UnsupportedFormat`] for extensions other than
    ///   png, jpg and jpeg
    /// - [`ArtifactError::Read`] if the image cannot be read
    /// - [`ArtifactError::Conversion`] if its bytes do not decode
    /// - [`ArtifactError::Write`] if the output cannot be written
    pub fn normalize(&self, image_path: &Path, output_path: &Path) -> Result<PathBuf> {
        let format = FileFormat::from_path(image_path);
        if !format.is_image() {
            return Err(ArtifactError::unsupported_format(image_path));
        }

        let bytes = std::fs::read(image_path).map_err(|e| ArtifactError::read(image_path, e))?;
        let mut doc = self.image_document(image_path, &bytes, format)?;

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ArtifactError::write(output_path, std::io::Error::other(e)))?;

        if let Err(e) = std::fs::write(output_path, &buffer) {
            discard(output_path);
            return Err(ArtifactError::write(output_path, e));
        }

        tracing::debug!(
            source = %image_path.display(),
            output = %output_path.display(),
            bytes = buffer.len(),
            "normalized image"
        );

        Ok(output_path.to_path_buf())
    }

    /// Build the one-page document for already-read image bytes.
    ///
    /// `path` is only used in error messages.
    pub fn image_document(&self, path: &Path, bytes: &[u8], format: FileFormat) -> Result<Document> {
        let image_format = match format {
            FileFormat::Png => ImageFormat::Png,
            FileFormat::Jpeg => ImageFormat::Jpeg,
            FileFormat::Pdf | FileFormat::Unsupported => {
                return Err(ArtifactError::unsupported_format(path));
            }
        };

        let image = image::load_from_memory_with_format(bytes, image_format)
            .map_err(|e| ArtifactError::conversion(path, e.to_string()))?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ArtifactError::conversion(path, "image has no pixels"));
        }

        let mut doc = Document::with_version("1.7");

        let image_id = match format {
            FileFormat::Jpeg => {
                let components = jpeg_components(bytes).ok_or_else(|| {
                    ArtifactError::conversion(path, "JPEG frame header not found")
                })?;
                add_jpeg_xobject(&mut doc, bytes, width, height, components)
                    .map_err(|reason| ArtifactError::conversion(path, reason))?
            }
            _ => add_raw_xobject(&mut doc, &image, width, height),
        };

        let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ\n");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), i64::from(width).into(), i64::from(height).into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
            "Contents" => content_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        // Flate-compresses the raw sample streams; the JPEG stream opts out.
        doc.compress();

        Ok(doc)
    }
}

fn add_jpeg_xobject(
    doc: &mut Document,
    bytes: &[u8],
    width: u32,
    height: u32,
    components: u8,
) -> std::result::Result<ObjectId, String> {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };

    match components {
        1 => dict.set("ColorSpace", "DeviceGray"),
        3 => dict.set("ColorSpace", "DeviceRGB"),
        4 => {
            dict.set("ColorSpace", "DeviceCMYK");
            // Adobe writes CMYK JPEGs inverted.
            dict.set(
                "Decode",
                vec![
                    1.into(),
                    0.into(),
                    1.into(),
                    0.into(),
                    1.into(),
                    0.into(),
                    1.into(),
                    0.into(),
                ],
            );
        }
        other => return Err(format!("unsupported JPEG component count {other}")),
    }

    let stream = Stream::new(dict, bytes.to_vec()).with_compression(false);
    Ok(doc.add_object(stream))
}

fn add_raw_xobject(doc: &mut Document, image: &DynamicImage, width: u32, height: u32) -> ObjectId {
    let grayscale = matches!(
        image.color(),
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
    );

    let (samples, color_space) = if grayscale {
        (image.to_luma8().into_raw(), "DeviceGray")
    } else {
        (image.to_rgb8().into_raw(), "DeviceRGB")
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
    };

    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        dict.set("SMask", mask_id);
    }

    doc.add_object(Stream::new(dict, samples))
}

/// Number of colour components declared in the JPEG frame header.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    if data.get(0..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];

        // Fill bytes and standalone markers carry no length.
        if marker == 0xFF {
            i += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }

        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            // length(2) precision(1) height(2) width(2) components(1)
            return data.get(i + 9).copied();
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + length;
    }

    None
}
