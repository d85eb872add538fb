//! Fixed-binning one-dimensional histogram.

use super::Nameable;
use crate::error::{PipeStoreError, Result};
use serde::{Deserialize, Serialize};

/// Histogram with `bins.len()` equal-width bins over `[low, high)`.
///
/// Values below `low` go to `underflow`, values at or above `high` (and NaN)
/// go to `overflow`. `entries` counts every fill, in range or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    name: String,
    title: String,
    low: f64,
    high: f64,
    bins: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
}

impl Histogram {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        nbins: usize,
        low: f64,
        high: f64,
    ) -> Result<Self> {
        let name = name.into();
        if nbins == 0 {
            return Err(PipeStoreError::Config(format!(
                "Histogram \"{}\" needs at least one bin",
                name
            )));
        }
        if !(low < high) {
            return Err(PipeStoreError::Config(format!(
                "Histogram \"{}\" has an empty range [{}, {})",
                name, low, high
            )));
        }
        Ok(Self {
            name,
            title: title.into(),
            low,
            high,
            bins: vec![0.0; nbins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        })
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        if x < self.low {
            self.underflow += weight;
            return;
        }
        match self.bin_index(x) {
            Some(i) => self.bins[i] += weight,
            None => self.overflow += weight,
        }
    }

    /// In-range bin for `x`, if any.
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if !(x >= self.low && x < self.high) {
            return None;
        }
        let width = (self.high - self.low) / self.bins.len() as f64;
        let idx = ((x - self.low) / width) as usize;
        // Rounding at the upper edge can land one past the end
        Some(idx.min(self.bins.len() - 1))
    }

    pub fn bin_content(&self, index: usize) -> Option<f64> {
        self.bins.get(index).copied()
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn nbins(&self) -> usize {
        self.bins.len()
    }

    pub fn range(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bins.iter().sum()
    }

    pub fn reset(&mut self) {
        self.bins.iter_mut().for_each(|b| *b = 0.0);
        self.underflow = 0.0;
        self.overflow = 0.0;
        self.entries = 0;
    }
}

impl Nameable for Histogram {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_bins() {
        let mut h = Histogram::new("h", "test", 4, 0.0, 4.0).unwrap();
        h.fill(0.5);
        h.fill(1.5);
        h.fill(1.7);
        h.fill(3.99);
        assert_eq!(h.bins(), &[1.0, 2.0, 0.0, 1.0]);
        assert_eq!(h.entries(), 4);
        assert_eq!(h.integral(), 4.0);
    }

    #[test]
    fn test_under_and_overflow() {
        let mut h = Histogram::new("h", "test", 2, 0.0, 1.0).unwrap();
        h.fill(-0.1);
        h.fill(1.0);
        h.fill(f64::NAN);
        assert_eq!(h.underflow(), 1.0);
        assert_eq!(h.overflow(), 2.0);
        assert_eq!(h.integral(), 0.0);
        assert_eq!(h.entries(), 3);
    }

    #[test]
    fn test_invalid_binning() {
        assert!(Histogram::new("h", "", 0, 0.0, 1.0).unwrap_err().is_config());
        assert!(Histogram::new("h", "", 3, 1.0, 1.0).unwrap_err().is_config());
    }

    #[test]
    fn test_reset() {
        let mut h = Histogram::new("h", "", 3, 0.0, 3.0).unwrap();
        h.fill_weighted(1.0, 2.5);
        h.reset();
        assert_eq!(h.entries(), 0);
        assert_eq!(h.bin_content(1), Some(0.0));
    }
}
