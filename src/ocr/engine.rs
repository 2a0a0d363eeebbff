use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

/// Character sets accepted for each half of a price row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharWhitelist {
    /// Ratio column: digits, '.' and ':'
    Ratio,
    /// Count column: digits only
    Count,
}

impl CharWhitelist {
    pub fn chars(self) -> &'static str {
        match self {
            CharWhitelist::Ratio => ":0123456789.",
            CharWhitelist::Count => "0123456789",
        }
    }
}

/// Single-line text recognition over a preprocessed image.
pub trait TextRecognizer {
    /// Returns the recognized text, trimmed. An unreadable line is an empty string.
    fn recognize_line(&self, img: &GrayImage, whitelist: CharWhitelist) -> Result<String>;
}

/// Tesseract CLI backend.
#[derive(Debug, Clone)]
pub struct Tesseract {
    pub executable: PathBuf,
    pub tessdata: Option<PathBuf>,
}

impl Tesseract {
    pub fn new(executable: PathBuf, tessdata: Option<PathBuf>) -> Self {
        Self {
            executable,
            tessdata,
        }
    }

    fn command(&self, input: &std::path::Path, whitelist: CharWhitelist) -> Command {
        let mut command = Command::new(&self.executable);
        command.arg(input).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        command
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg("7") // Treat the image as a single text line
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", whitelist.chars()));
        command
    }
}

impl TextRecognizer for Tesseract {
    fn recognize_line(&self, img: &GrayImage, whitelist: CharWhitelist) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let output = self
            .command(temp_input.path(), whitelist)
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
