//! HyperLogLog estimator allows to estimate number of distinct elements
//! in the stream or dataset and is defined with runtime `precision` parameter:
//! - `precision`: parameter in [4..18] range, which defines number of hash bits
//!   to use for register indices, giving `m = 2^precision` registers.
//!
//! # Data-structure design rationale
//!
//! ## Register layout
//! Every register occupies one byte. For `precision = p` the largest possible rank
//! is `64 - p + 1`, so a byte is always wide enough.
//!
//! ## Update rule
//! - Top `p` bits of the 64-bit hash select the register.
//! - Remaining `64 - p` bits (hash shifted left by `p`) produce the rank, which is
//!   1 + number of leading zeros.
//! - Register is replaced only by a larger rank, so registers never decrease.
//!
//! ## Constant time estimate
//! Number of zero registers and registers' harmonic sum are stored and updated
//! as more data being inserted, so `count` does not scan registers.
//! The harmonic sum is kept in `u128` fixed point scaled by `2^64`: every term `2^-r`
//! is an exact integer there, which makes the sum independent of insertion order.
//!
//! ## Accuracy
//! Expected error is `1.04 / sqrt(m)`:
//!   p = 10: 3.25%
//!   p = 12: 1.62%
//!   p = 14: 0.81%
//!   p = 16: 0.41%
//!
//! When the raw estimate is below `2.5 * m` and some registers are still empty,
//! linear counting `m * ln(m / zeros)` is used instead.

use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::mem::{size_of, size_of_val};

use tracing::{debug, trace, warn};
use wyhash::WyHash;

use crate::bias::{BiasCorrection, BiasCorrectionTrait};

/// Smallest supported precision
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision
pub const MAX_PRECISION: u8 = 18;
/// Precision used by `HyperLogLog::default()`
pub const DEFAULT_PRECISION: u8 = 12;

/// Width of the hash used for register index and rank
const HASH_BITS: u32 = 64;
/// Seed for hashing raw byte sequences
const HASH_SEED: u64 = 0;
/// Raw estimates up to `SMALL_RANGE_FACTOR * m` are candidates for linear counting
const SMALL_RANGE_FACTOR: f64 = 2.5;
/// Fixed point shift of the stored harmonic sum
const SUM_SHIFT: u32 = 64;

/// Estimator error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorError {
    /// Precision outside of `[MIN_PRECISION, MAX_PRECISION]` range
    InvalidPrecision(u8),
}

impl Display for EstimatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorError::InvalidPrecision(p) => write!(
                f,
                "invalid precision {p}: expected value in [{MIN_PRECISION}..{MAX_PRECISION}] range"
            ),
        }
    }
}

impl std::error::Error for EstimatorError {}

/// HyperLogLog cardinality estimator over byte sequences
#[derive(Clone, PartialEq)]
pub struct HyperLogLog {
    /// Number of hash bits used for register index
    precision: u8,
    /// Register ranks, `2^precision` of them
    registers: Vec<u8>,
    /// Number of registers set to 0
    zeros: usize,
    /// `Σ 2^-r` over all registers, scaled by `2^SUM_SHIFT`
    harmonic_sum: u128,
    bias_correction: BiasCorrection,
}

impl HyperLogLog {
    /// Creates new instance of `HyperLogLog` with `2^precision` registers and fixed bias correction
    #[inline]
    pub fn new(precision: u8) -> Result<Self, EstimatorError> {
        Self::with_bias_correction(precision, BiasCorrection::default())
    }

    /// Creates new instance of `HyperLogLog` with the given bias correction policy
    pub fn with_bias_correction(
        precision: u8,
        bias_correction: BiasCorrection,
    ) -> Result<Self, EstimatorError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            warn!(precision, "rejected estimator precision");
            return Err(EstimatorError::InvalidPrecision(precision));
        }
        Ok(Self::from_valid_precision(precision, bias_correction))
    }

    fn from_valid_precision(precision: u8, bias_correction: BiasCorrection) -> Self {
        let m = 1usize << precision;
        debug!(precision, registers = m, ?bias_correction, "created estimator");
        Self {
            precision,
            registers: vec![0; m],
            zeros: m,
            harmonic_sum: (m as u128) << SUM_SHIFT,
            bias_correction,
        }
    }

    /// Add a byte sequence into `HyperLogLog`
    #[inline]
    pub fn add(&mut self, element: &[u8]) {
        self.insert_hash(wyhash::wyhash(element, HASH_SEED));
    }

    /// Insert a hashable item into `HyperLogLog`.
    ///
    /// Items are fed through `WyHash` using their `Hash` implementation, which for `str` and
    /// slices includes a length prefix. Hence `insert("a")` and `add(b"a")` count as different elements.
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = WyHash::default();
        item.hash(&mut hasher);
        self.insert_hash(hasher.finish());
    }

    /// Insert hash into `HyperLogLog`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let (idx, rank) = split_hash(hash, self.precision);
        self.update_register(idx, rank);
    }

    /// Raise `idx` register to `new_rank` keeping zero count and harmonic sum in sync
    #[inline]
    fn update_register(&mut self, idx: usize, new_rank: u8) {
        let old_rank = self.registers[idx];
        if new_rank > old_rank {
            self.registers[idx] = new_rank;
            self.zeros -= usize::from(old_rank == 0);
            self.harmonic_sum = self.harmonic_sum - inverse_pow2(old_rank) + inverse_pow2(new_rank);
        }
    }

    /// Return cardinality estimate
    pub fn count(&self) -> u64 {
        let m = self.registers.len() as f64;
        let raw = self.raw_estimate();
        if raw > SMALL_RANGE_FACTOR * m {
            trace!(raw, "raw estimate");
            return raw as u64;
        }
        if self.zeros == 0 {
            trace!(raw, "raw estimate, no empty registers");
            return raw as u64;
        }
        let estimate = m * (m / self.zeros as f64).ln();
        trace!(raw, zeros = self.zeros, estimate, "linear counting estimate");
        estimate as u64
    }

    /// Return uncorrected HyperLogLog estimate `α * m^2 / Σ 2^-r`
    #[inline]
    pub fn raw_estimate(&self) -> f64 {
        let m = self.registers.len();
        let alpha = self.bias_correction.alpha(m);
        alpha * (m as f64) * (m as f64) / self.harmonic_sum()
    }

    /// Return `Σ 2^-r` over all registers
    #[inline]
    pub fn harmonic_sum(&self) -> f64 {
        self.harmonic_sum as f64 / (1u128 << SUM_SHIFT) as f64
    }

    /// Return precision of `HyperLogLog`
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Return number of registers (`2^precision`)
    #[inline]
    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Return register ranks
    #[inline]
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Return number of registers set to 0
    #[inline]
    pub fn zero_registers(&self) -> usize {
        self.zeros
    }

    #[inline]
    pub fn bias_correction(&self) -> BiasCorrection {
        self.bias_correction
    }

    /// Return expected relative standard error of the estimate
    #[inline]
    pub fn standard_error(&self) -> f64 {
        error_for_precision(self.precision)
    }

    /// Return memory size of `HyperLogLog`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.registers.as_slice())
    }
}

impl Default for HyperLogLog {
    fn default() -> Self {
        Self::from_valid_precision(DEFAULT_PRECISION, BiasCorrection::default())
    }
}

impl Debug for HyperLogLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, estimate: {}, size: {} }}",
            self.precision,
            self.count(),
            self.size_of()
        )
    }
}

/// Return register index from the top `precision` bits and rank from the remaining bits.
///
/// The bit just below the shifted-out index is forced to 1, so an all-zero rank field
/// yields the maximum rank `64 - precision + 1` rather than 65.
#[inline]
fn split_hash(hash: u64, precision: u8) -> (usize, u8) {
    let p = u32::from(precision);
    let idx = (hash >> (HASH_BITS - p)) as usize;
    let rank = ((hash << p) | (1 << (p - 1))).leading_zeros() + 1;
    (idx, rank as u8)
}

/// `2^-rank` scaled by `2^SUM_SHIFT`
#[inline]
fn inverse_pow2(rank: u8) -> u128 {
    1u128 << (SUM_SHIFT - u32::from(rank))
}

/// Compute the smallest precision whose expected error does not exceed `target_error`.
///
/// Result is clamped to `[MIN_PRECISION, MAX_PRECISION]`; non-positive targets give `MAX_PRECISION`.
pub fn precision_for_error(target_error: f64) -> u8 {
    if target_error.is_nan() || target_error <= 0.0 {
        return MAX_PRECISION;
    }
    // error = 1.04 / sqrt(m), m = 2^p
    let m = (1.04 / target_error).powi(2);
    let p = m.log2().ceil().clamp(f64::from(MIN_PRECISION), f64::from(MAX_PRECISION));
    p as u8
}

/// Compute the expected relative error for a given precision
pub fn error_for_precision(precision: u8) -> f64 {
    1.04 / 2f64.powi(i32::from(precision)).sqrt()
}
