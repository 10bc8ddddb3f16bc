//! Core business logic abstractions

pub mod config;
pub mod controller;
pub mod conversion;
pub mod currency;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use controller::{ConversionController, ConversionStatus, DebouncePhase, Snapshot};
pub use conversion::{ConversionError, ConversionRequest, ConversionResult};
pub use currency::{Catalog, CurrencyInfo};
pub use rate::{RateFetcher, RateTable};
