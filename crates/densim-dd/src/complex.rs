//! Complex value canonicalization and scoped scratch values.
//!
//! Node keys hash the raw bits of their child weights, so two weights that
//! differ only by rounding noise must be snapped to one representative
//! before a node is looked up. [`ComplexTable`] does this per component with
//! buckets of width [`TOLERANCE`].

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::f64::consts::FRAC_1_SQRT_2;
use std::ops::Deref;
use std::rc::Rc;

use crate::TOLERANCE;

/// Check if a value is zero within [`TOLERANCE`].
#[inline]
pub fn approx_zero(value: Complex64) -> bool {
    value.re.abs() <= TOLERANCE && value.im.abs() <= TOLERANCE
}

/// Check if two values are equal within [`TOLERANCE`] per component.
#[inline]
pub fn approx_eq(a: Complex64, b: Complex64) -> bool {
    approx_zero(a - b)
}

/// Values every table starts with.
const SEEDS: [f64; 7] = [0.0, 1.0, -1.0, 0.5, -0.5, FRAC_1_SQRT_2, -FRAC_1_SQRT_2];

/// Tolerance-bucketed table of canonical real components.
#[derive(Debug, Clone)]
pub struct ComplexTable {
    buckets: FxHashMap<i64, Vec<f64>>,
    len: usize,
    hits: u64,
    lookups: u64,
}

impl Default for ComplexTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplexTable {
    /// Create a table holding only the seed values.
    pub fn new() -> Self {
        let mut table = Self {
            buckets: FxHashMap::default(),
            len: 0,
            hits: 0,
            lookups: 0,
        };
        table.seed();
        table
    }

    fn seed(&mut self) {
        for value in SEEDS {
            self.insert_exact(value);
        }
    }

    #[inline]
    fn bucket(value: f64) -> i64 {
        // `as` saturates, so huge values share the outermost buckets.
        (value / TOLERANCE).floor() as i64
    }

    fn find(&self, value: f64) -> Option<f64> {
        let b = Self::bucket(value);
        [b, b.saturating_sub(1), b.saturating_add(1)]
            .iter()
            .filter_map(|k| self.buckets.get(k))
            .flat_map(|values| values.iter().copied())
            .find(|x| (x - value).abs() <= TOLERANCE)
    }

    /// Insert a value without searching for a neighbour.
    fn insert_exact(&mut self, value: f64) {
        let slot = self.buckets.entry(Self::bucket(value)).or_default();
        if !slot.iter().any(|x| x.to_bits() == value.to_bits()) {
            slot.push(value);
            self.len += 1;
        }
    }

    /// Return the canonical representative of a real value.
    pub fn lookup_real(&mut self, value: f64) -> f64 {
        self.lookups += 1;
        if let Some(existing) = self.find(value) {
            self.hits += 1;
            return existing;
        }
        self.insert_exact(value);
        value
    }

    /// Return the canonical representative of a complex value.
    pub fn lookup(&mut self, value: Complex64) -> Complex64 {
        Complex64::new(self.lookup_real(value.re), self.lookup_real(value.im))
    }

    /// Drop every value and rebuild the table from the given survivors.
    pub fn rebuild(&mut self, survivors: impl IntoIterator<Item = Complex64>) {
        self.buckets.clear();
        self.len = 0;
        self.seed();
        for value in survivors {
            self.insert_exact(value.re);
            self.insert_exact(value.im);
        }
    }

    /// Number of distinct stored components.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the table is empty (never true after construction).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// (hits, lookups) since construction.
    pub fn hit_counts(&self) -> (u64, u64) {
        (self.hits, self.lookups)
    }
}

/// Hands out scoped temporaries and tracks how many are alive.
///
/// Every [`Scratch`] increments the shared occupancy when created and
/// decrements it on drop, so a balanced code path leaves the occupancy where
/// it found it no matter how it exits.
#[derive(Debug, Clone, Default)]
pub struct ComplexCache {
    occupancy: Rc<Cell<usize>>,
    peak: Rc<Cell<usize>>,
}

impl ComplexCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a scratch slot holding `value`.
    pub fn scratch(&self, value: Complex64) -> Scratch {
        let now = self.occupancy.get() + 1;
        self.occupancy.set(now);
        if now > self.peak.get() {
            self.peak.set(now);
        }
        Scratch {
            value,
            occupancy: Rc::clone(&self.occupancy),
        }
    }

    /// Number of scratch values currently alive.
    pub fn occupancy(&self) -> usize {
        self.occupancy.get()
    }

    /// Highest occupancy observed.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }
}

/// A temporary complex value checked out of a [`ComplexCache`].
#[derive(Debug)]
pub struct Scratch {
    value: Complex64,
    occupancy: Rc<Cell<usize>>,
}

impl Scratch {
    /// The held value.
    #[inline]
    pub fn get(&self) -> Complex64 {
        self.value
    }

    /// Overwrite the held value.
    #[inline]
    pub fn set(&mut self, value: Complex64) {
        self.value = value;
    }
}

impl Deref for Scratch {
    type Target = Complex64;

    fn deref(&self) -> &Complex64 {
        &self.value
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        self.occupancy.set(self.occupancy.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_snaps_close_values() {
        let mut table = ComplexTable::new();
        let a = table.lookup_real(0.3);
        let b = table.lookup_real(0.3 + TOLERANCE / 4.0);
        assert_eq!(a.to_bits(), b.to_bits());

        let c = table.lookup_real(0.3 + 1e-6);
        assert_ne!(a.to_bits(), c.to_bits());
    }

    #[test]
    fn test_lookup_seeds() {
        let mut table = ComplexTable::new();
        assert_eq!(table.lookup_real(1.0 - TOLERANCE / 2.0), 1.0);
        assert_eq!(table.lookup_real(-0.0).to_bits(), 0.0f64.to_bits());
        assert_eq!(table.lookup_real(1e-15), 0.0);
        let before = table.len();
        table.lookup(Complex64::new(0.5, -1.0));
        assert_eq!(table.len(), before);
    }

    #[test]
    fn test_rebuild_keeps_survivors() {
        let mut table = ComplexTable::new();
        let x = table.lookup_real(0.123_456);
        table.lookup_real(0.987_654);
        let before = table.len();
        table.rebuild([Complex64::new(x, 0.0)]);
        assert_eq!(table.len(), before - 1);
        assert_eq!(table.lookup_real(0.123_456).to_bits(), x.to_bits());
    }

    #[test]
    fn test_scratch_occupancy_balances() {
        let cache = ComplexCache::new();
        assert_eq!(cache.occupancy(), 0);
        {
            let a = cache.scratch(Complex64::new(1.0, 0.0));
            let mut b = cache.scratch(Complex64::new(2.0, 0.0));
            assert_eq!(cache.occupancy(), 2);
            b.set(*a + *b);
            assert_eq!(b.get(), Complex64::new(3.0, 0.0));
        }
        assert_eq!(cache.occupancy(), 0);
        assert_eq!(cache.peak(), 2);
    }

    #[test]
    fn test_scratch_released_on_early_return() {
        fn early(cache: &ComplexCache, bail: bool) -> Option<f64> {
            let s = cache.scratch(Complex64::new(0.25, 0.0));
            if bail {
                return None;
            }
            Some(s.re)
        }
        let cache = ComplexCache::new();
        assert_eq!(early(&cache, true), None);
        assert_eq!(early(&cache, false), Some(0.25));
        assert_eq!(cache.occupancy(), 0);
    }
}
