//! Price Sampler
//!
//! Periodically reads trade-ratio prices from fixed regions of the game's trade
//! window with OCR and appends them to per-item JSON time series.

pub mod analysis;
pub mod automation;
pub mod capture;
pub mod logging;
pub mod market;
pub mod ocr;
pub mod paths;
pub mod storage;
