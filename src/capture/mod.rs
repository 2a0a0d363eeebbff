//! Screen capture of fixed desktop regions.
//!
//! This module provides:
//! - GDI screen-region capture (`capture_screen_region`, Windows only)
//! - BGRA to RGBA pixel conversion

pub mod screen;

#[cfg(windows)]
pub use screen::capture_screen_region;
