//! Ordering and duplicate handling of raw readings.

use contracts::{DuplicatePolicy, SensorReading};

/// Readings sorted by time with unique timestamps.
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub times: Vec<f64>,
    pub values: Vec<Vec<f64>>,
    /// Number of readings that arrived before their predecessor
    pub out_of_order: usize,
    /// Number of readings merged away by the duplicate policy
    pub duplicates: usize,
}

impl Prepared {
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Stable-sort `readings` by timestamp and collapse equal timestamps.
pub fn prepare(mut readings: Vec<SensorReading>, policy: DuplicatePolicy) -> Prepared {
    let out_of_order = readings
        .windows(2)
        .filter(|w| w[1].timestamp < w[0].timestamp)
        .count();

    // sort_by is stable: equal timestamps keep file order
    readings.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut prepared = Prepared {
        times: Vec::with_capacity(readings.len()),
        values: Vec::with_capacity(readings.len()),
        out_of_order,
        duplicates: 0,
    };

    let mut iter = readings.into_iter().peekable();
    while let Some(first) = iter.next() {
        let mut group = vec![first.values];
        while let Some(next) = iter.next_if(|r| r.timestamp == first.timestamp) {
            group.push(next.values);
        }
        prepared.duplicates += group.len() - 1;
        prepared.times.push(first.timestamp);
        prepared.values.push(collapse(group, policy));
    }

    prepared
}

fn collapse(mut group: Vec<Vec<f64>>, policy: DuplicatePolicy) -> Vec<f64> {
    if group.len() == 1 {
        return group.swap_remove(0);
    }
    match policy {
        DuplicatePolicy::KeepFirst => group.swap_remove(0),
        DuplicatePolicy::KeepLast => group.pop().unwrap_or_default(),
        DuplicatePolicy::Average => {
            let n = group.len() as f64;
            let width = group[0].len();
            (0..width)
                .map(|c| group.iter().map(|v| v[c]).sum::<f64>() / n)
                .collect()
        }
    }
}
