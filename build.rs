use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Copy config files to target directory so the executable finds them next to itself
    copy_to_target("config.json");
    copy_to_target("name_mapping.json");
}

/// Returns target/release (or target/debug) derived from OUT_DIR.
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    // OUT_DIR is something like target/release/build/price-sampler-xxx/out
    Path::new(&out_dir)
        .ancestors()
        .nth(3) // Go up 3 levels: out -> hash -> build -> release
        .map(Path::to_path_buf)
}

/// Copies a file from the crate root to the target directory.
fn copy_to_target(file_name: &str) {
    let src = Path::new(file_name);
    if !src.exists() {
        return;
    }

    if let Some(target_dir) = target_dir() {
        let _ = fs::copy(src, target_dir.join(file_name));
    }
    println!("cargo:rerun-if-changed={}", file_name);
}
