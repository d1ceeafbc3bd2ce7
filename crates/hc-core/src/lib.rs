//! hc-core: stable foundation for humictl.
//!
//! Contains:
//! - units (uom SI types + constructors for time, humidity, temperature)
//! - numeric (Real, time slack, range checks)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HcError, HcResult};
pub use numeric::*;
pub use units::*;
