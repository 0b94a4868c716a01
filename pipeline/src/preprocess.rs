/// Image preprocessing: decode, orient, resize, pad, tensorize
///
/// Every stage is a pure function over an owned `RgbImage`, so each one can
/// be tested on its own. [`preprocess`] chains them in order.
use crate::error::{PipelineError, Result};
use crate::types::{ChannelOrder, PreprocessConfig};
use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use ndarray::Array4;
use std::io::Cursor;

fn invalid(e: image::ImageError) -> PipelineError {
    PipelineError::InvalidImage(e.to_string())
}

/// Decode raw bytes into a 3-channel 8-bit image
///
/// The EXIF orientation tag, when present, is applied so the raster is
/// upright as displayed. Grayscale is expanded and alpha is dropped.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(PipelineError::InvalidImage("empty buffer".to_string()));
    }

    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::InvalidImage(e.to_string()))?
        .into_decoder()
        .map_err(invalid)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder).map_err(invalid)?;
    img.apply_orientation(orientation);

    log::debug!(
        "Decoded image {}x{} ({:?}, {:?})",
        img.width(),
        img.height(),
        img.color(),
        orientation
    );
    Ok(img.to_rgb8())
}

/// Rotate portrait images 90° clockwise so that width >= height
pub fn make_landscape(img: RgbImage) -> RgbImage {
    if img.height() > img.width() {
        imageops::rotate90(&img)
    } else {
        img
    }
}

/// Output dimensions when the longest edge is scaled to `target`
pub fn scaled_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale_short = |short: u32, long: u32| -> u32 {
        let scaled = (f64::from(target) * f64::from(short) / f64::from(long)).round();
        (scaled as u32).max(1)
    };

    if width >= height {
        (target, scale_short(height, width))
    } else {
        (scale_short(width, height), target)
    }
}

/// Scale so the longest edge equals `target`, preserving aspect ratio
pub fn resize_longest_edge(img: &RgbImage, target: u32) -> RgbImage {
    let (width, height) = scaled_dimensions(img.width(), img.height(), target);
    if (width, height) == img.dimensions() {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Border added around an image to reach a square canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    /// Split the missing rows and columns; the odd pixel goes bottom/right
    pub fn for_size(width: u32, height: u32, target: u32) -> Self {
        let pad_h = target.saturating_sub(height);
        let pad_w = target.saturating_sub(width);
        let top = pad_h / 2;
        let left = pad_w / 2;

        Self {
            top,
            bottom: pad_h - top,
            left,
            right: pad_w - left,
        }
    }
}

/// Center the image on a zero-filled `target`×`target` canvas
pub fn pad_to_square(img: &RgbImage, target: u32) -> (RgbImage, Padding) {
    let padding = Padding::for_size(img.width(), img.height(), target);
    let mut canvas = RgbImage::new(target, target);
    imageops::replace(&mut canvas, img, i64::from(padding.left), i64::from(padding.top));
    (canvas, padding)
}

/// Map a pixel value from [0, 255] to [-1, 1]
#[inline]
pub fn normalize(value: u8) -> f32 {
    let x = f32::from(value) / 255.0;
    (x - 0.5) / 0.5
}

/// HWC u8 image to normalized NCHW f32 tensor with batch size 1
pub fn to_tensor(img: &RgbImage, order: ChannelOrder) -> Array4<f32> {
    let (width, height) = img.dimensions();
    let channels = order.source_indices();

    Array4::from_shape_fn((1, 3, height as usize, width as usize), |(_, c, y, x)| {
        normalize(img.get_pixel(x as u32, y as u32)[channels[c]])
    })
}

/// Full preprocessing chain for one encoded image
pub fn preprocess(bytes: &[u8], config: &PreprocessConfig) -> Result<Array4<f32>> {
    let img = make_landscape(decode(bytes)?);
    let resized = resize_longest_edge(&img, config.target_size);
    let (padded, padding) = pad_to_square(&resized, config.target_size);

    log::debug!(
        "Preprocessed {}x{} -> {}x{} with {:?}",
        img.width(),
        img.height(),
        resized.width(),
        resized.height(),
        padding
    );

    Ok(to_tensor(&padded, config.channel_order))
}
