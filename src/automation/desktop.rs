//! Desktop interaction seam: pointer, keyboard, clipboard, and screen capture.
//!
//! The capture session only talks to the `Desktop` trait, so the whole cycle can
//! be driven by a fake in tests. The Windows implementation lives in `input`.

use image::RgbaImage;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use super::config::{ScreenPoint, ScreenRect};

/// Keys the sampler presses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Alt,
    Control,
    F,
    V,
}

#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("input injection failed: {0}")]
    Input(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("screen capture failed: {0}")]
    CaptureFailed(String),
    /// No display can be captured at all; retrying is pointless.
    #[error("screen capture unavailable: {0}")]
    CaptureUnavailable(String),
}

impl DesktopError {
    /// Whether the scheduler should stop instead of moving on to the next cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DesktopError::CaptureUnavailable(_))
    }
}

pub trait Desktop {
    fn move_cursor(&self, to: ScreenPoint) -> Result<(), DesktopError>;
    /// Left click at the current cursor position.
    fn click(&self) -> Result<(), DesktopError>;
    fn key_down(&self, key: Key) -> Result<(), DesktopError>;
    fn key_up(&self, key: Key) -> Result<(), DesktopError>;
    fn set_clipboard(&self, text: &str) -> Result<(), DesktopError>;
    fn capture_region(&self, rect: &ScreenRect) -> Result<RgbaImage, DesktopError>;
}

/// Holds a key down until dropped.
pub struct KeyHold<'a> {
    desktop: &'a dyn Desktop,
    key: Key,
}

impl Drop for KeyHold<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.desktop.key_up(self.key) {
            log::error!("Failed to release {:?}: {}", self.key, e);
        }
    }
}

/// Presses `key` and returns a guard that releases it.
pub fn hold_key(desktop: &dyn Desktop, key: Key) -> Result<KeyHold<'_>, DesktopError> {
    desktop.key_down(key)?;
    Ok(KeyHold { desktop, key })
}

/// Presses `keys` in order and releases them in reverse order.
pub fn hotkey(desktop: &dyn Desktop, keys: &[Key]) -> Result<(), DesktopError> {
    let mut held = Vec::with_capacity(keys.len());
    for &key in keys {
        held.push(hold_key(desktop, key)?);
    }
    // Guards drop in declaration order, so release explicitly from the last key
    while let Some(guard) = held.pop() {
        drop(guard);
    }
    Ok(())
}

pub fn move_and_click(desktop: &dyn Desktop, at: ScreenPoint) -> Result<(), DesktopError> {
    desktop.move_cursor(at)?;
    desktop.click()
}

/// Sleeps unless `duration` is zero.
pub fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Event {
        Move(i32, i32),
        Click,
        KeyDown(Key),
        KeyUp(Key),
        Clipboard(String),
        Capture(ScreenRect),
    }

    /// Records every call and serves queued capture results.
    #[derive(Default)]
    pub struct RecordingDesktop {
        pub events: RefCell<Vec<Event>>,
        pub captures: RefCell<VecDeque<Result<RgbaImage, DesktopError>>>,
        pub fail_clicks: bool,
    }

    impl RecordingDesktop {
        pub fn push_capture(&self, result: Result<RgbaImage, DesktopError>) {
            self.captures.borrow_mut().push_back(result);
        }

        pub fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }

        /// Keys currently held down.
        pub fn held_keys(&self) -> Vec<Key> {
            let mut held = Vec::new();
            for event in self.events.borrow().iter() {
                match event {
                    Event::KeyDown(k) => held.push(*k),
                    Event::KeyUp(k) => held.retain(|h| h != k),
                    _ => {}
                }
            }
            held
        }
    }

    impl Desktop for RecordingDesktop {
        fn move_cursor(&self, to: ScreenPoint) -> Result<(), DesktopError> {
            self.events.borrow_mut().push(Event::Move(to.x, to.y));
            Ok(())
        }

        fn click(&self) -> Result<(), DesktopError> {
            if self.fail_clicks {
                return Err(DesktopError::Input("click rejected".to_string()));
            }
            self.events.borrow_mut().push(Event::Click);
            Ok(())
        }

        fn key_down(&self, key: Key) -> Result<(), DesktopError> {
            self.events.borrow_mut().push(Event::KeyDown(key));
            Ok(())
        }

        fn key_up(&self, key: Key) -> Result<(), DesktopError> {
            self.events.borrow_mut().push(Event::KeyUp(key));
            Ok(())
        }

        fn set_clipboard(&self, text: &str) -> Result<(), DesktopError> {
            self.events.borrow_mut().push(Event::Clipboard(text.to_string()));
            Ok(())
        }

        fn capture_region(&self, rect: &ScreenRect) -> Result<RgbaImage, DesktopError> {
            self.events.borrow_mut().push(Event::Capture(*rect));
            self.captures.borrow_mut().pop_front().unwrap_or_else(|| {
                Ok(RgbaImage::from_pixel(
                    rect.width,
                    rect.height,
                    Rgba([255, 255, 255, 255]),
                ))
            })
        }
    }

    #[test]
    fn test_hotkey_releases_in_reverse() {
        let desktop = RecordingDesktop::default();
        hotkey(&desktop, &[Key::Control, Key::F]).unwrap();
        assert_eq!(
            desktop.events(),
            vec![
                Event::KeyDown(Key::Control),
                Event::KeyDown(Key::F),
                Event::KeyUp(Key::F),
                Event::KeyUp(Key::Control),
            ]
        );
    }

    #[test]
    fn test_key_hold_releases_on_early_return() {
        fn capture_with_alt(desktop: &RecordingDesktop) -> Result<(), DesktopError> {
            let _alt = hold_key(desktop, Key::Alt)?;
            Err(DesktopError::CaptureFailed("boom".to_string()))
        }

        let desktop = RecordingDesktop::default();
        assert!(capture_with_alt(&desktop).is_err());
        assert!(desktop.held_keys().is_empty());
        assert_eq!(desktop.events().last(), Some(&Event::KeyUp(Key::Alt)));
    }

    #[test]
    fn test_move_and_click() {
        let desktop = RecordingDesktop::default();
        move_and_click(&desktop, ScreenPoint::new(10, 20)).unwrap();
        assert_eq!(desktop.events(), vec![Event::Move(10, 20), Event::Click]);
    }

    #[test]
    fn test_only_unavailable_capture_is_fatal() {
        assert!(DesktopError::CaptureUnavailable("no display".into()).is_fatal());
        assert!(!DesktopError::CaptureFailed("blt".into()).is_fatal());
        assert!(!DesktopError::Input("x".into()).is_fatal());
        assert!(!DesktopError::Clipboard("x".into()).is_fatal());
    }
}
