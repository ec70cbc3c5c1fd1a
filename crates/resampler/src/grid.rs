//! Uniform output grid.

/// Slack when testing lattice membership, absorbs float error in `x * rate`.
const LATTICE_EPS: f64 = 1e-9;

/// `len` points at `start + k / rate_hz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub start: f64,
    pub rate_hz: f64,
    pub len: usize,
}

impl Grid {
    /// Grid covering `[first, last]`.
    ///
    /// Without an anchor the grid starts at `first`. With one, it starts at
    /// the first point of the lattice `anchor + m / rate_hz` not before
    /// `first`. A span too short to hold a lattice point still yields one
    /// point so every device produces a series.
    ///
    /// Returns `None` when the point count is not representable.
    pub fn covering(first: f64, last: f64, rate_hz: f64, anchor: Option<f64>) -> Option<Self> {
        let start = match anchor {
            Some(anchor) => {
                let m = ((first - anchor) * rate_hz - LATTICE_EPS).ceil();
                anchor + m / rate_hz
            }
            None => first,
        };

        let span = (last - start) * rate_hz;
        let len = if span < 0.0 {
            1
        } else {
            let steps = (span + LATTICE_EPS).floor();
            // `as` saturates, so range-check before converting
            if !steps.is_finite() || steps >= usize::MAX as f64 {
                return None;
            }
            (steps as usize).checked_add(1)?
        };

        Some(Self {
            start,
            rate_hz,
            len,
        })
    }

    /// Timestamp of point `k`
    #[inline]
    pub fn at(&self, k: usize) -> f64 {
        self.start + k as f64 / self.rate_hz
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(|k| self.at(k))
    }
}
