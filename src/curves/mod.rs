//! Forward price and interest rate curves

mod forward;
mod interest;
pub mod loader;

pub use forward::ForwardCurve;
pub use interest::InterestRateCurve;
