//! Screen-region capture using GDI `BitBlt` from the desktop DC.
//!
//! Capturing the desktop rather than a window keeps overlays such as the
//! Alt-triggered price tooltip in the image.

use image::RgbaImage;

/// Converts a top-down BGRA buffer into an RGBA image.
///
/// Returns `None` if the buffer is shorter than `width * height * 4` bytes.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn bgra_to_rgba(width: u32, height: u32, mut pixels: Vec<u8>) -> Option<RgbaImage> {
    let len = width as usize * height as usize * 4;
    if pixels.len() < len {
        return None;
    }
    pixels.truncate(len);
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
        // GDI leaves alpha at zero for BI_RGB bitmaps
        px[3] = 255;
    }
    RgbaImage::from_raw(width, height, pixels)
}

#[cfg(windows)]
pub use self::gdi::capture_screen_region;

#[cfg(windows)]
mod gdi {
    use std::mem::size_of;

    use image::RgbaImage;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CAPTUREBLT,
        DIB_RGB_COLORS, HGDIOBJ, SRCCOPY,
    };

    use super::bgra_to_rgba;
    use crate::automation::{DesktopError, ScreenRect};

    /// Copies `rect` from the primary desktop into an RGBA image.
    ///
    /// Returns `CaptureUnavailable` when no desktop DC can be obtained (locked
    /// session, no interactive desktop), `CaptureFailed` for anything else.
    pub fn capture_screen_region(rect: &ScreenRect) -> Result<RgbaImage, DesktopError> {
        if rect.width == 0 || rect.height == 0 {
            return Err(DesktopError::CaptureFailed(format!(
                "empty region {}x{}",
                rect.width, rect.height
            )));
        }
        let width = rect.width as i32;
        let height = rect.height as i32;

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(DesktopError::CaptureUnavailable(
                    "GetDC returned no desktop device context".to_string(),
                ));
            }

            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, HGDIOBJ(bitmap.0));

            let result = BitBlt(
                mem_dc,
                0,
                0,
                width,
                height,
                screen_dc,
                rect.x,
                rect.y,
                SRCCOPY | CAPTUREBLT,
            )
            .map_err(|e| DesktopError::CaptureFailed(format!("BitBlt: {}", e)))
            .and_then(|()| {
                let mut info = BITMAPINFO {
                    bmiHeader: BITMAPINFOHEADER {
                        biSize: size_of::<BITMAPINFOHEADER>() as u32,
                        biWidth: width,
                        // Negative height gives top-down rows
                        biHeight: -height,
                        biPlanes: 1,
                        biBitCount: 32,
                        biCompression: BI_RGB.0,
                        ..Default::default()
                    },
                    ..Default::default()
                };
                let mut pixels = vec![0u8; rect.width as usize * rect.height as usize * 4];
                let lines = GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    rect.height,
                    Some(pixels.as_mut_ptr().cast()),
                    &mut info,
                    DIB_RGB_COLORS,
                );
                if lines != height {
                    return Err(DesktopError::CaptureFailed(format!(
                        "GetDIBits copied {} of {} lines",
                        lines, height
                    )));
                }
                bgra_to_rgba(rect.width, rect.height, pixels).ok_or_else(|| {
                    DesktopError::CaptureFailed("pixel buffer too short".to_string())
                })
            });

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(HGDIOBJ(bitmap.0));
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_bgra_to_rgba_swaps_channels() {
        let pixels = vec![10, 20, 30, 0, 1, 2, 3, 0];
        let img = bgra_to_rgba(2, 1, pixels).unwrap();
        assert_eq!(*img.get_pixel(0, 0), Rgba([30, 20, 10, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([3, 2, 1, 255]));
    }

    #[test]
    fn test_bgra_to_rgba_short_buffer() {
        assert!(bgra_to_rgba(2, 2, vec![0; 12]).is_none());
    }
}
