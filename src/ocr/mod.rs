pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::{CharWhitelist, Tesseract, TextRecognizer};
pub use extract::{extract_rows, ROW_COUNT};
pub use preprocess::{preprocess_for_ocr, to_grayscale, DEFAULT_THRESHOLD};
pub use setup::ensure_tesseract;

use image::RgbaImage;

use crate::market::{parse_rows, ParsedRows, RawRow};

/// High-level function: captured region → raw rows and parsed records.
///
/// Converts to grayscale, reads the six rows, and parses them. Never fails;
/// unreadable rows end up empty or dropped.
pub fn read_price_region(
    img: &RgbaImage,
    recognizer: &dyn TextRecognizer,
    threshold: u8,
) -> (Vec<RawRow>, ParsedRows) {
    let gray = to_grayscale(img);
    let rows = extract_rows(&gray, recognizer, threshold);
    let parsed = parse_rows(&rows);
    (rows, parsed)
}
