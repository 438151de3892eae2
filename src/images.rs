//! Image set → PDF packing.
//!
//! One page per image, in input order, each page sized to its image at
//! 96 dpi. Baseline/progressive JPEGs in gray or RGB are embedded as-is
//! (`DCTDecode`); everything else is decoded and stored as Flate-compressed
//! 8-bit samples, with transparency flattened onto white.

use crate::error::ConversionError;
use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;

/// Points per pixel at the assumed 96 dpi.
const POINTS_PER_PIXEL: f32 = 72.0 / 96.0;

/// Capability to turn an ordered list of encoded images into one PDF.
pub trait ImagePacker: Send + Sync {
    fn pack(&self, images: &[Bytes]) -> Result<Vec<u8>, ConversionError>;
}

/// Default packer backed by `image` for decoding and `lopdf` for output.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfImagePacker;

impl ImagePacker for PdfImagePacker {
    fn pack(&self, images: &[Bytes]) -> Result<Vec<u8>, ConversionError> {
        if images.is_empty() {
            return Err(ConversionError::NoImages);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(images.len());

        for (index, data) in images.iter().enumerate() {
            let raster = Raster::from_encoded(index, data)?;
            let width = raster.width as f32 * POINTS_PER_PIXEL;
            let height = raster.height as f32 * POINTS_PER_PIXEL;

            let image_id = doc.add_object(raster.into_stream());

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            width.into(),
                            Object::Integer(0),
                            Object::Integer(0),
                            height.into(),
                            Object::Integer(0),
                            Object::Integer(0),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content
                .encode()
                .map_err(|e| ConversionError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    width.into(),
                    height.into(),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => image_id,
                    },
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| ConversionError::Pdf(e.to_string()))?;

        tracing::debug!(pages = images.len(), bytes = out.len(), "Packed images into PDF");
        Ok(out)
    }
}

/// Image samples ready to be written as a PDF image XObject.
struct Raster {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
}

impl Raster {
    fn from_encoded(index: usize, data: &[u8]) -> Result<Self, ConversionError> {
        let decode_err = |message: String| ConversionError::Image { index, message };

        let format = image::guess_format(data).map_err(|e| decode_err(e.to_string()))?;

        if format == ImageFormat::Jpeg {
            if let Some(frame) = jpeg_frame(data) {
                let color_space = match frame.components {
                    1 => Some("DeviceGray"),
                    3 => Some("DeviceRGB"),
                    _ => None,
                };
                if let Some(color_space) = color_space {
                    return Ok(Self {
                        width: frame.width,
                        height: frame.height,
                        color_space,
                        filter: "DCTDecode",
                        data: data.to_vec(),
                    });
                }
            }
        }

        let decoded = image::load_from_memory_with_format(data, format)
            .map_err(|e| decode_err(e.to_string()))?;
        Self::from_decoded(decoded)
    }

    fn from_decoded(decoded: DynamicImage) -> Result<Self, ConversionError> {
        let (width, height) = (decoded.width(), decoded.height());
        let color = decoded.color();

        let (color_space, samples) = if color.has_alpha() {
            ("DeviceRGB", flatten_onto_white(&decoded))
        } else if color.has_color() {
            ("DeviceRGB", decoded.to_rgb8().into_raw())
        } else {
            ("DeviceGray", decoded.to_luma8().into_raw())
        };

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&samples)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data,
        })
    }

    fn into_stream(self) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => self.width as i64,
                "Height" => self.height as i64,
                "ColorSpace" => self.color_space,
                "BitsPerComponent" => 8_i64,
                "Filter" => self.filter,
            },
            self.data,
        )
    }
}

fn flatten_onto_white(image: &DynamicImage) -> Vec<u8> {
    let rgba = image.to_rgba8();
    let mut out = Vec::with_capacity(rgba.width() as usize * rgba.height() as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for channel in [r, g, b] {
            let blended = (channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            out.push(blended as u8);
        }
    }
    out
}

/// Geometry read from a JPEG start-of-frame segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    width: u32,
    height: u32,
    components: u8,
}

/// Walk the JPEG marker segments up to the first SOF.
///
/// `None` means the data must be decoded rather than embedded as-is.
fn jpeg_frame(data: &[u8]) -> Option<JpegFrame> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes.
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Standalone markers carry no length.
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }

        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 {
            return None;
        }

        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            // Only 8-bit Huffman DCT frames (baseline, extended, progressive)
            // can be handed to a PDF reader as DCTDecode.
            if !matches!(marker, 0xC0..=0xC2) {
                return None;
            }
            let seg = data.get(pos + 4..pos + 2 + len)?;
            if seg.len() < 6 || seg[0] != 8 {
                return None;
            }
            let height = u16::from_be_bytes([seg[1], seg[2]]) as u32;
            let width = u16::from_be_bytes([seg[3], seg[4]]) as u32;
            if width == 0 || height == 0 {
                return None;
            }
            return Some(JpegFrame {
                width,
                height,
                components: seg[5],
            });
        }

        pos += 2 + len;
    }
    None
}
