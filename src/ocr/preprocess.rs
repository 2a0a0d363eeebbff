use image::{GrayImage, ImageBuffer, Luma, RgbaImage};

/// Intensity above which a pixel counts as background after inversion.
pub const DEFAULT_THRESHOLD: u8 = 150;

/// Converts an RGBA capture to grayscale.
///
/// Uses the ITU-R BT.601 luma formula: Y = 0.299*R + 0.587*G + 0.114*B
pub fn to_grayscale(img: &RgbaImage) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let pixel = img.get_pixel(x, y);
        let r = pixel[0] as f32;
        let g = pixel[1] as f32;
        let b = pixel[2] as f32;
        let luminance = 0.299 * r + 0.587 * g + 0.114 * b;
        Luma([luminance.round().clamp(0.0, 255.0) as u8])
    })
}

/// Inverse binary threshold.
///
/// Pixels above the threshold become 0 (background), all others 255 (text).
pub fn threshold_inverse(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Applies a 2×2 rectangular kernel anchored at (1, 1).
///
/// Each output pixel combines the in-bounds pixels at offsets (-1..=0, -1..=0)
/// with `pick` (min for erosion, max for dilation).
fn apply_2x2(img: &GrayImage, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut value = img.get_pixel(x, y)[0];
            if x > 0 {
                value = pick(value, img.get_pixel(x - 1, y)[0]);
            }
            if y > 0 {
                value = pick(value, img.get_pixel(x, y - 1)[0]);
            }
            if x > 0 && y > 0 {
                value = pick(value, img.get_pixel(x - 1, y - 1)[0]);
            }
            output.put_pixel(x, y, Luma([value]));
        }
    }

    output
}

/// One erosion pass with a 2×2 kernel.
pub fn erode(img: &GrayImage) -> GrayImage {
    apply_2x2(img, u8::min)
}

/// One dilation pass with a 2×2 kernel.
pub fn dilate(img: &GrayImage) -> GrayImage {
    apply_2x2(img, u8::max)
}

/// Binarizes and cleans one half-row before OCR: threshold, erode, dilate.
pub fn preprocess_for_ocr(img: &GrayImage, threshold: u8) -> GrayImage {
    dilate(&erode(&threshold_inverse(img, threshold)))
}
