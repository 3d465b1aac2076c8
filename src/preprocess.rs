use std::io::Cursor;

use image::{imageops::FilterType, ColorType, DynamicImage, ImageFormat, ImageOutputFormat};
use ndarray::Array4;

use crate::error::DecodeError;
use crate::models::INPUT_SIZE;

const OFFSET: f32 = 127.5;

/// Model input: `[1, 224, 224, 3]`, NHWC, values in [-1, 1].
#[derive(Debug, Clone)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    /// All-zero input, used to probe a freshly loaded model.
    pub fn zeros() -> Self {
        let side = INPUT_SIZE as usize;
        NormalizedTensor(Array4::zeros((1, side, side, 3)))
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Row-major view of the values, ready to hand to a tensor runtime.
    pub fn as_slice(&self) -> &[f32] {
        // from_shape_fn and zeros both produce standard layout
        self.0.as_slice().unwrap_or(&[])
    }
}

/// Decodes an arbitrary raster image, fills a 224x224 frame (scaled to cover, then
/// center-cropped) and re-encodes it as an RGB PNG.
pub fn normalize(raw: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(raw)?;
    let resized = img.resize_to_fill(INPUT_SIZE, INPUT_SIZE, FilterType::Lanczos3);
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
    Ok(png)
}

/// Decodes a normalized PNG and maps every channel byte from [0, 255] to [-1, 1].
pub fn to_tensor(png: &[u8]) -> Result<NormalizedTensor, DecodeError> {
    let img = image::load_from_memory_with_format(png, ImageFormat::Png)?;
    if img.color() != ColorType::Rgb8 {
        return Err(DecodeError::Layout(img.color()));
    }
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width != INPUT_SIZE || height != INPUT_SIZE {
        return Err(DecodeError::Dimensions {
            expected: INPUT_SIZE,
            width,
            height,
        });
    }
    let side = INPUT_SIZE as usize;
    let tensor = Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        let p = rgb.get_pixel(x as u32, y as u32);
        (p[c] as f32 - OFFSET) / OFFSET
    });
    Ok(NormalizedTensor(tensor))
}
