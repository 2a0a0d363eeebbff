use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::engine::Tesseract;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";
const TRAINED_DATA: &str = "eng.traineddata";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

/// Standard install locations checked after the local directory and PATH.
#[cfg(windows)]
const INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const INSTALL_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"];

#[cfg(windows)]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
];

/// Returns the per-user directory for downloaded Tesseract files.
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("price-sampler")
        .join("tesseract")
}

/// Locates Tesseract and its English trained data, downloading the data if needed.
///
/// `explicit` is an executable path from the config file and wins over every
/// other location.
pub fn ensure_tesseract(explicit: Option<&Path>) -> Result<Tesseract> {
    let executable = find_tesseract_executable(explicit)?;
    log::info!("Tesseract executable: {}", executable.display());

    let tessdata = match find_tessdata_dir() {
        Some(dir) => dir,
        None => {
            let local = get_tesseract_dir().join("tessdata");
            fs::create_dir_all(&local)
                .with_context(|| format!("Failed to create {}", local.display()))?;
            download_tessdata(&local)?;
            local
        }
    };
    log::info!("Tesseract data: {}", tessdata.display());

    Ok(Tesseract::new(executable, Some(tessdata)))
}

/// Finds the Tesseract executable: config path, local dir, PATH, install dirs.
pub fn find_tesseract_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log::warn!(
            "Configured Tesseract path {} does not exist, searching elsewhere",
            path.display()
        );
    }

    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in INSTALL_DIRS {
        let p = Path::new(dir).join(EXECUTABLE_NAME);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR, add it to PATH, \
         or set tesseract_path in config.json"
    ))
}

/// Finds a directory containing eng.traineddata.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];
    candidates.extend(SYSTEM_TESSDATA_DIRS.iter().map(PathBuf::from));

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    first_with_trained_data(&candidates)
}

fn first_with_trained_data(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| dir.join(TRAINED_DATA).exists())
        .cloned()
}

/// Downloads English trained data into `tessdata_dir`.
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let url = format!("{}/{}", TESSDATA_REPO, TRAINED_DATA);
    let target = tessdata_dir.join(TRAINED_DATA);

    log::info!("Downloading {}...", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "price-sampler")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            TRAINED_DATA,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;
    file.write_all(&bytes)?;

    log::info!("Downloaded {} ({} bytes)", TRAINED_DATA, bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join(EXECUTABLE_NAME);
        std::fs::write(&exe, b"").unwrap();

        let found = find_tesseract_executable(Some(&exe)).unwrap();
        assert_eq!(found, exe);
    }

    #[test]
    fn test_first_with_trained_data() {
        let empty = tempdir().unwrap();
        let with_data = tempdir().unwrap();
        std::fs::write(with_data.path().join(TRAINED_DATA), b"model").unwrap();

        let candidates = vec![
            empty.path().to_path_buf(),
            with_data.path().to_path_buf(),
        ];
        assert_eq!(
            first_with_trained_data(&candidates),
            Some(with_data.path().to_path_buf())
        );
        assert_eq!(first_with_trained_data(&candidates[..1]), None);
    }
}
