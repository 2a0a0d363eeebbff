//! Windows implementation of the `Desktop` seam.
//!
//! Pointer and keyboard events go through `SendInput`, which simulates
//! hardware-level input the game's input layer accepts. Moves use absolute
//! coordinates normalized to the 0..65535 range.

use image::RgbaImage;
use std::mem::size_of;

use windows::Win32::Foundation::{HANDLE, HWND};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE};
use windows::Win32::System::Ole::CF_UNICODETEXT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MOVE, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY, VK_CONTROL, VK_MENU,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use super::config::{ScreenPoint, ScreenRect};
use super::desktop::{Desktop, DesktopError, Key};
use crate::capture::capture_screen_region;

/// Drives the real mouse, keyboard, clipboard, and screen.
#[derive(Debug, Default)]
pub struct WindowsDesktop;

impl WindowsDesktop {
    pub fn new() -> Self {
        Self
    }
}

fn virtual_key(key: Key) -> VIRTUAL_KEY {
    match key {
        Key::Alt => VK_MENU,
        Key::Control => VK_CONTROL,
        Key::F => VIRTUAL_KEY(0x46),
        Key::V => VIRTUAL_KEY(0x56),
    }
}

fn send(input: INPUT) -> Result<(), DesktopError> {
    let sent = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
    if sent == 1 {
        Ok(())
    } else {
        Err(DesktopError::Input(format!(
            "SendInput accepted {} of 1 events",
            sent
        )))
    }
}

fn mouse_input(at: (i32, i32), flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: at.0,
                dy: at.1,
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

fn key_input(key: Key, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: virtual_key(key),
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

/// Screen pixels to the normalized absolute range used by `MOUSEEVENTF_ABSOLUTE`.
fn normalize(point: ScreenPoint) -> Result<(i32, i32), DesktopError> {
    let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
    let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
    if screen_width <= 0 || screen_height <= 0 {
        return Err(DesktopError::Input("screen size unavailable".to_string()));
    }

    let norm_x = ((point.x as i64 * 65535) / screen_width as i64) as i32;
    let norm_y = ((point.y as i64 * 65535) / screen_height as i64) as i32;
    Ok((norm_x, norm_y))
}

impl Desktop for WindowsDesktop {
    fn move_cursor(&self, to: ScreenPoint) -> Result<(), DesktopError> {
        let at = normalize(to)?;
        send(mouse_input(at, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE))
    }

    fn click(&self) -> Result<(), DesktopError> {
        send(mouse_input((0, 0), MOUSEEVENTF_LEFTDOWN))?;
        std::thread::sleep(std::time::Duration::from_millis(50));
        send(mouse_input((0, 0), MOUSEEVENTF_LEFTUP))
    }

    fn key_down(&self, key: Key) -> Result<(), DesktopError> {
        send(key_input(key, KEYBD_EVENT_FLAGS(0)))
    }

    fn key_up(&self, key: Key) -> Result<(), DesktopError> {
        send(key_input(key, KEYEVENTF_KEYUP))
    }

    fn set_clipboard(&self, text: &str) -> Result<(), DesktopError> {
        set_clipboard_text(text)
    }

    fn capture_region(&self, rect: &ScreenRect) -> Result<RgbaImage, DesktopError> {
        capture_screen_region(rect)
    }
}

/// Replaces the clipboard contents with `text` as CF_UNICODETEXT.
fn set_clipboard_text(text: &str) -> Result<(), DesktopError> {
    let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
    let bytes = wide.len() * size_of::<u16>();
    let clip_err = |what: &str, e: windows::core::Error| {
        DesktopError::Clipboard(format!("{}: {}", what, e))
    };

    unsafe {
        OpenClipboard(HWND::default()).map_err(|e| clip_err("OpenClipboard", e))?;

        let result = (|| {
            EmptyClipboard().map_err(|e| clip_err("EmptyClipboard", e))?;

            let hglobal =
                GlobalAlloc(GMEM_MOVEABLE, bytes).map_err(|e| clip_err("GlobalAlloc", e))?;
            let dest = GlobalLock(hglobal) as *mut u16;
            if dest.is_null() {
                let _ = GlobalFree(hglobal);
                return Err(DesktopError::Clipboard("GlobalLock failed".to_string()));
            }
            std::ptr::copy_nonoverlapping(wide.as_ptr(), dest, wide.len());
            // Reports an error once the lock count reaches zero, which is expected
            let _ = GlobalUnlock(hglobal);

            // The system owns the memory once SetClipboardData succeeds
            if let Err(e) = SetClipboardData(CF_UNICODETEXT.0 as u32, HANDLE(hglobal.0)) {
                let _ = GlobalFree(hglobal);
                return Err(clip_err("SetClipboardData", e));
            }
            Ok(())
        })();

        let _ = CloseClipboard();
        result
    }
}
