//! `hll-estimator` is a Rust crate designed to estimate the number of distinct byte sequences in a stream
//! using bounded memory.
//!
//! This library uses HyperLogLog with linear counting for the small cardinality range, trading a small,
//! tunable relative error (`1.04 / sqrt(2^precision)`) for `2^precision` bytes of memory and constant time
//! updates and estimates.
//!
//! ```
//! use hll_estimator::HyperLogLog;
//!
//! # fn main() -> Result<(), hll_estimator::EstimatorError> {
//! let mut estimator = HyperLogLog::new(16)?;
//! for name in ["alice", "bob", "carol", "alice"] {
//!     estimator.add(name.as_bytes());
//! }
//! println!("distinct names = {}", estimator.count());
//! # Ok(())
//! # }
//! ```
pub mod bias;
pub mod estimator;

pub use bias::{BiasCorrection, BiasCorrectionTrait, DurandFlajolet, Fixed};
pub use estimator::{error_for_precision, precision_for_error, EstimatorError, HyperLogLog};
