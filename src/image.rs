use crate::refs::{ObjectReferences, RefType};
use crate::LetterError;
use image::{ColorType, DynamicImage, GenericImageView};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use std::path::{Path, PathBuf};

/// How the pixel data reaches the PDF
pub enum ImageData {
    /// An RGB8 JPEG can be embedded as-is under a DCTDecode filter
    Jpeg(PathBuf),
    /// Everything else is re-encoded as zlib-flated RGB, with the alpha
    /// channel split off into a soft mask
    Raster(DynamicImage),
}

/// A letterhead or signature image, in source pixel dimensions. Where it
/// lands on the page is the layout's business, not the image's.
pub struct Image {
    pub data: ImageData,
    pub width: f32,
    pub height: f32,
}

struct EncodeOutput {
    filter: Filter,
    bytes: Vec<u8>,
    mask: Option<Vec<u8>>,
}

impl Image {
    /// Load an image asset from disk, sniffing the format from its content.
    pub fn from_disk<P: AsRef<Path>>(path: P) -> Result<Image, LetterError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let format = image::guess_format(&data)?;
        let image = image::load_from_memory_with_format(&data, format)?;

        match (format, image.color()) {
            (image::ImageFormat::Jpeg, ColorType::Rgb8) => {
                let width = image.width() as f32;
                let height = image.height() as f32;
                Ok(Image {
                    data: ImageData::Jpeg(path.to_owned()),
                    width,
                    height,
                })
            }
            _ => Ok(Self::from_raster(image)),
        }
    }

    /// Optional-asset check: `Ok(None)` when nothing exists at `path`. The
    /// letter tolerates absent logos and signatures, but a file that exists
    /// and fails to decode is still an error.
    pub fn from_disk_optional<P: AsRef<Path>>(path: P) -> Result<Option<Image>, LetterError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::from_disk(path).map(Some)
    }

    pub fn from_raster(image: DynamicImage) -> Image {
        let width = image.width() as f32;
        let height = image.height() as f32;
        Image {
            data: ImageData::Raster(image),
            width,
            height,
        }
    }

    fn encode(&self) -> Result<EncodeOutput, LetterError> {
        match &self.data {
            ImageData::Jpeg(path) => {
                let bytes = std::fs::read(path)?;
                Ok(EncodeOutput {
                    filter: Filter::DctDecode,
                    bytes,
                    mask: None,
                })
            }
            ImageData::Raster(image) => {
                let level = CompressionLevel::DefaultLevel as u8;

                let mask = image.color().has_alpha().then(|| {
                    let alphas: Vec<_> = image.pixels().map(|p| (p.2).0[3]).collect();
                    compress_to_vec_zlib(&alphas, level)
                });

                let bytes = compress_to_vec_zlib(image.to_rgb8().as_raw(), level);

                Ok(EncodeOutput {
                    filter: Filter::FlateDecode,
                    bytes,
                    mask,
                })
            }
        }
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        image_index: usize,
        writer: &mut Pdf,
    ) -> Result<(), LetterError> {
        let id = refs.gen(RefType::Image(image_index));

        let encoded = self.encode()?;

        let mut image = writer.image_xobject(id, encoded.bytes.as_slice());
        image.filter(encoded.filter);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);

        let mask_id = encoded
            .mask
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));
        if let Some(mask_id) = &mask_id {
            image.s_mask(*mask_id);
        }

        image.finish();

        if let Some(mask_id) = mask_id {
            let mut s_mask =
                writer.image_xobject(mask_id, encoded.mask.as_ref().expect("mask encoded").as_slice());
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }

        Ok(())
    }
}
