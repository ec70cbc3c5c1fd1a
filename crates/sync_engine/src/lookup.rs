//! Per-device lookup of a uniform series at a frame time.

use contracts::{BoundaryPolicy, ResampledSeries};
use resampler::interp::{lerp_row, outside_span};

/// Where a frame time falls relative to a series span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    Inside,
    After,
}

/// Locate `t` against `[start, end]` of a non-empty series.
pub fn placement(series: &ResampledSeries, t: f64) -> Placement {
    let end = series.timestamp(series.len() - 1);
    if t < series.start {
        Placement::Before
    } else if t > end {
        Placement::After
    } else {
        Placement::Inside
    }
}

/// `round((t - start) * rate)` clamped to `[0, len - 1]`.
#[inline]
pub fn nearest_index(series: &ResampledSeries, t: f64) -> usize {
    let last = series.len().saturating_sub(1);
    let pos = ((t - series.start) * series.rate_hz).round();
    if pos <= 0.0 {
        0
    } else {
        (pos as usize).min(last)
    }
}

/// Edge value for a time outside the span.
fn edge_value(series: &ResampledSeries, t: f64, side: Placement, policy: BoundaryPolicy) -> Vec<f64> {
    let n = series.len();
    let (edge, inner) = match side {
        Placement::Before => (0, 1),
        _ => (n - 1, n.wrapping_sub(2)),
    };
    let inner = (n > 1).then(|| (series.timestamp(inner), series.samples[inner].as_slice()));
    outside_span(
        t,
        (series.timestamp(edge), series.samples[edge].as_slice()),
        inner,
        policy,
    )
}

/// Sample at the nearest grid index.
pub fn sample_nearest(series: &ResampledSeries, t: f64, policy: BoundaryPolicy) -> Vec<f64> {
    match (policy, placement(series, t)) {
        (BoundaryPolicy::Extrapolate, side @ (Placement::Before | Placement::After)) => {
            edge_value(series, t, side, policy)
        }
        _ => series.samples[nearest_index(series, t)].clone(),
    }
}

/// Interpolate between the two grid samples bracketing `t`.
pub fn sample_linear(series: &ResampledSeries, t: f64, policy: BoundaryPolicy) -> Vec<f64> {
    let side = placement(series, t);
    if side != Placement::Inside {
        return edge_value(series, t, side, policy);
    }
    let n = series.len();
    if n == 1 {
        return series.samples[0].clone();
    }
    let pos = (t - series.start) * series.rate_hz;
    let k = (pos.floor().max(0.0) as usize).min(n - 2);
    lerp_row(
        t,
        series.timestamp(k),
        &series.samples[k],
        series.timestamp(k + 1),
        &series.samples[k + 1],
    )
}
