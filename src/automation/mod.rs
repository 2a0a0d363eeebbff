//! UI automation for sampling trade prices.
//!
//! This module provides:
//! - Sampler configuration (coordinates, worklist, timing)
//! - The `Desktop` seam for input, clipboard, and capture
//! - The per-cycle capture state machine
//! - The scheduler that loops over the worklist

pub mod config;
pub mod desktop;
#[cfg(windows)]
pub mod input;
pub mod runner;
pub mod session;

pub use config::{
    CurrencySearch, SamplerConfig, ScreenPoint, ScreenRect, TimingConfig, UiLayout, WorkItem,
};
pub use desktop::{hold_key, hotkey, Desktop, DesktopError, Key, KeyHold};
#[cfg(windows)]
pub use input::WindowsDesktop;
pub use runner::{is_fatal, PassReport, Scheduler};
pub use session::{CaptureSession, CaptureState, CycleReport};
