//! Data models for the dive log.

mod attribute;
mod dive;
mod field;

pub use attribute::*;
pub use dive::*;
pub use field::*;
