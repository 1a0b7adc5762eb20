//! Core conversion logic: rate stores, session state and the engine

pub mod convert;
pub mod provider;
pub mod rates;
pub mod session;

// Re-export main types for cleaner imports
pub use convert::{Conversion, ConvertError, convert, parse_amount};
pub use provider::{DataUnavailable, RateProvider};
pub use rates::{AssetClass, RateRecord, RateStore};
pub use session::{RateCache, Session, Slot};
