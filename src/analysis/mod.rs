//! Read-only computations over a snapshot of the store: the project-vs-project
//! price comparison and the per-product price trend.

pub mod compare;
pub mod trend;

pub use compare::{Comparison, compare};
pub use trend::{Trend, price_trend};
