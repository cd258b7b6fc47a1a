//! ## Bias correction
//! The raw HyperLogLog estimate `α * m^2 / Σ 2^-r` is scaled by a correction constant `α`
//! which compensates for the systematic bias of the harmonic mean over `m` registers.
//!
//! Two policies are supported:
//! - [`Fixed`] - single constant `α = 0.79402` regardless of register count. This is the default
//!   and keeps estimates identical to deployments which always used that constant.
//! - [`DurandFlajolet`] - `α` as a function of `m`: tabulated for `m` in `{16, 32, 64}` and
//!   `0.7213 / (1 + 1.079 / m)` otherwise.
//!
//! [Original HyperLogLog paper](https://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)

use enum_dispatch::enum_dispatch;

/// Constant used by [`Fixed`] bias correction.
pub const FIXED_ALPHA: f64 = 0.79402;

/// Bias correction trait which must be implemented by all correction policies.
#[enum_dispatch]
pub trait BiasCorrectionTrait {
    /// Return `α` for an estimator with `m` registers
    fn alpha(&self, m: usize) -> f64;
}

/// Bias correction policies supported by `HyperLogLog`
#[enum_dispatch(BiasCorrectionTrait)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BiasCorrection {
    Fixed(Fixed),
    DurandFlajolet(DurandFlajolet),
}

impl Default for BiasCorrection {
    fn default() -> Self {
        BiasCorrection::Fixed(Fixed)
    }
}

/// Constant `α` for every register count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fixed;

impl BiasCorrectionTrait for Fixed {
    #[inline]
    fn alpha(&self, _m: usize) -> f64 {
        FIXED_ALPHA
    }
}

/// `α` derived from the register count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DurandFlajolet;

impl BiasCorrectionTrait for DurandFlajolet {
    #[inline]
    fn alpha(&self, m: usize) -> f64 {
        match m {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
        }
    }
}
