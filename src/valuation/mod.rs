//! Intrinsic valuation by backward induction
//!
//! Each period's value function is sampled on an inventory grid spanning the
//! feasible inventory space. Working back from the terminal value, every grid
//! point takes the decision that maximises discounted cash flow plus the
//! interpolated continuation value. The optimal path is then replayed forward
//! from the starting inventory to produce the operating profile and NPV.

mod config;
mod engine;
mod grid;
mod interp;
mod optimizer;
mod results;
mod space;

pub use config::{DecisionSearch, ValuationConfig};
pub use engine::{valuate, IntrinsicValuation};
pub use grid::inventory_grid;
pub use interp::ValueFunction;
pub use results::{ProfileRow, ValuationResult, ValuationSummary};
