use image::imageops::crop_imm;
use image::GrayImage;

use super::engine::{CharWhitelist, TextRecognizer};
use super::preprocess::preprocess_for_ocr;
use crate::market::RawRow;

/// The price panel always lists six rows.
pub const ROW_COUNT: u32 = 6;

/// Splits a captured price region into rows and reads each half with OCR.
///
/// The region is cut into `ROW_COUNT` bands of `height / ROW_COUNT` pixels; any
/// remainder at the bottom is ignored. Each band is split at `width / 2` into the
/// ratio (left) and count (right) halves, which are preprocessed and recognized
/// separately.
///
/// Always returns `ROW_COUNT` rows. OCR failures become empty strings.
pub fn extract_rows(
    region: &GrayImage,
    recognizer: &dyn TextRecognizer,
    threshold: u8,
) -> Vec<RawRow> {
    let (width, height) = region.dimensions();
    let row_height = height / ROW_COUNT;
    let mid_point = width / 2;

    (0..ROW_COUNT)
        .map(|i| {
            let y_start = i * row_height;

            let left = crop_imm(region, 0, y_start, mid_point, row_height).to_image();
            let right =
                crop_imm(region, mid_point, y_start, width - mid_point, row_height).to_image();

            RawRow {
                ratio_text: read_half(&left, recognizer, CharWhitelist::Ratio, threshold, i),
                count_text: read_half(&right, recognizer, CharWhitelist::Count, threshold, i),
            }
        })
        .collect()
}

fn read_half(
    half: &GrayImage,
    recognizer: &dyn TextRecognizer,
    whitelist: CharWhitelist,
    threshold: u8,
    row: u32,
) -> String {
    if half.width() == 0 || half.height() == 0 {
        return String::new();
    }

    let processed = preprocess_for_ocr(half, threshold);
    match recognizer.recognize_line(&processed, whitelist) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            log::warn!("OCR failed for row {} ({:?}): {}", row + 1, whitelist, e);
            String::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays fixed OCR answers in call order and records what it was asked.
    pub struct ScriptedRecognizer {
        answers: RefCell<VecDeque<Result<String>>>,
        pub calls: RefCell<Vec<(CharWhitelist, (u32, u32))>>,
    }

    impl ScriptedRecognizer {
        /// Queues answers for rows given as (ratio, count) pairs.
        pub fn from_rows(rows: &[(&str, &str)]) -> Self {
            let answers = rows
                .iter()
                .flat_map(|(ratio, count)| [Ok(ratio.to_string()), Ok(count.to_string())])
                .collect();
            Self {
                answers: RefCell::new(answers),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn push_error(&self, msg: &str) {
            self.answers.borrow_mut().push_back(Err(anyhow!(msg.to_string())));
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize_line(&self, img: &GrayImage, whitelist: CharWhitelist) -> Result<String> {
            self.calls.borrow_mut().push((whitelist, img.dimensions()));
            self.answers
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    #[test]
    fn test_extract_six_rows_with_whitelists() {
        let region = GrayImage::new(100, 60);
        let recognizer = ScriptedRecognizer::from_rows(&[
            ("1:5", "10"),
            ("", ""),
            ("3:2", "4"),
            ("", ""),
            ("", ""),
            ("2:1", "7"),
        ]);

        let rows = extract_rows(&region, &recognizer, 150);

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], RawRow::new("1:5", "10"));
        assert_eq!(rows[1], RawRow::new("", ""));
        assert_eq!(rows[5], RawRow::new("2:1", "7"));

        let calls = recognizer.calls.borrow();
        assert_eq!(calls.len(), 12);
        assert_eq!(calls[0], (CharWhitelist::Ratio, (50, 10)));
        assert_eq!(calls[1], (CharWhitelist::Count, (50, 10)));
    }

    #[test]
    fn test_remainder_rows_excluded() {
        // 65 / 6 = 10, so the bottom 5 pixels are never read
        let region = GrayImage::new(51, 65);
        let recognizer = ScriptedRecognizer::from_rows(&[]);

        let rows = extract_rows(&region, &recognizer, 150);

        assert_eq!(rows.len(), 6);
        let calls = recognizer.calls.borrow();
        assert!(calls.iter().all(|(_, (_, h))| *h == 10));
        // Odd width: left half gets 25, right half the remaining 26
        assert_eq!(calls[0].1, (25, 10));
        assert_eq!(calls[1].1, (26, 10));
    }

    #[test]
    fn test_too_short_region_skips_ocr() {
        let region = GrayImage::new(40, 5);
        let recognizer = ScriptedRecognizer::from_rows(&[("1:5", "10")]);

        let rows = extract_rows(&region, &recognizer, 150);

        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(RawRow::is_empty));
        assert!(recognizer.calls.borrow().is_empty());
    }

    #[test]
    fn test_ocr_error_becomes_empty_text() {
        let region = GrayImage::new(20, 12);
        let recognizer = ScriptedRecognizer::from_rows(&[]);
        recognizer.push_error("tesseract crashed");

        let rows = extract_rows(&region, &recognizer, 150);

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].ratio_text, "");
    }
}
