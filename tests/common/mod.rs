//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use builders::SegmentBuilder;
use std::path::{Path, PathBuf};

/// Stream name used by the segment helpers
pub const STREAM: &str = "events";

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Write one segment file per entry of `counts` into `dir`.
///
/// Records are numbered across segments: `id` counts from 0 and
/// `energy` is `id + 0.5`.
pub fn write_event_segments(dir: &Path, counts: &[usize]) -> Vec<PathBuf> {
    let mut next = 0i64;
    counts
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let mut builder = SegmentBuilder::events();
            for _ in 0..n {
                builder = builder.event(next, next as f64 + 0.5);
                next += 1;
            }
            let path = dir.join(format!("segment_{}.json", i));
            builder.write_to(&path);
            path
        })
        .collect()
}
