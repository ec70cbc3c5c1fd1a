//! Interpolation kernels shared by the resampler and the synchronizer.

use contracts::BoundaryPolicy;

/// Linear interpolation between `(t0, v0)` and `(t1, v1)`, clamped to the
/// pair's `[min, max]` so rounding can never overshoot.
#[inline]
pub fn lerp_clamped(t: f64, t0: f64, v0: f64, t1: f64, v1: f64) -> f64 {
    if t1 == t0 {
        return v0;
    }
    let alpha = (t - t0) / (t1 - t0);
    let v = v0 + alpha * (v1 - v0);
    v.clamp(v0.min(v1), v0.max(v1))
}

/// Unclamped linear extension of the line through `(t0, v0)`, `(t1, v1)`.
#[inline]
pub fn extend_linear(t: f64, t0: f64, v0: f64, t1: f64, v1: f64) -> f64 {
    if t1 == t0 {
        return v0;
    }
    v0 + (t - t0) / (t1 - t0) * (v1 - v0)
}

/// Interpolate every channel of a bracketing pair.
pub fn lerp_row(t: f64, t0: f64, a: &[f64], t1: f64, b: &[f64]) -> Vec<f64> {
    a.iter()
        .zip(b)
        .map(|(&v0, &v1)| lerp_clamped(t, t0, v0, t1, v1))
        .collect()
}

/// Value of a sorted sampled signal at a time outside its span.
///
/// `edge` is the sample nearest `t`, `inner` its neighbour (absent for a
/// single-sample signal, in which case both policies repeat the edge).
pub fn outside_span(
    t: f64,
    edge: (f64, &[f64]),
    inner: Option<(f64, &[f64])>,
    policy: BoundaryPolicy,
) -> Vec<f64> {
    match (policy, inner) {
        (BoundaryPolicy::Extrapolate, Some((ti, vi))) => edge
            .1
            .iter()
            .zip(vi)
            .map(|(&ve, &vi)| extend_linear(t, edge.0, ve, ti, vi))
            .collect(),
        _ => edge.1.to_vec(),
    }
}

/// Forward-only sampler over sorted, unique timestamps.
///
/// Queries must be non-decreasing; each call advances a cursor so a full
/// pass over the grid is linear in input plus output.
pub struct Cursor<'a> {
    times: &'a [f64],
    values: &'a [Vec<f64>],
    policy: BoundaryPolicy,
    j: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(times: &'a [f64], values: &'a [Vec<f64>], policy: BoundaryPolicy) -> Self {
        Self {
            times,
            values,
            policy,
            j: 0,
        }
    }

    /// Sample the signal at `t`. The signal must be non-empty.
    pub fn sample(&mut self, t: f64) -> Vec<f64> {
        let n = self.times.len();
        let last = n - 1;

        if t < self.times[0] {
            let inner = (n > 1).then(|| (self.times[1], self.values[1].as_slice()));
            return outside_span(t, (self.times[0], self.values[0].as_slice()), inner, self.policy);
        }
        if t > self.times[last] {
            let inner = (n > 1).then(|| (self.times[last - 1], self.values[last - 1].as_slice()));
            return outside_span(
                t,
                (self.times[last], self.values[last].as_slice()),
                inner,
                self.policy,
            );
        }

        while self.j + 1 < n && self.times[self.j + 1] <= t {
            self.j += 1;
        }
        let j = self.j;
        if self.times[j] == t || j == last {
            return self.values[j].clone();
        }
        lerp_row(
            t,
            self.times[j],
            &self.values[j],
            self.times[j + 1],
            &self.values[j + 1],
        )
    }
}
