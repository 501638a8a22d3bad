//! moving averages and peaks over recent samples.

use std::{collections::VecDeque, time::Duration};

/// a bounded window of recent values, and the largest value ever observed.
#[derive(Clone, Debug)]
pub struct RollingSeries {
    /// the most recent values, oldest first.
    window: VecDeque<f64>,
    /// the most values the window may hold.
    capacity: usize,
    /// the largest value observed since the last reset.
    peak: f64,
}

/// the state of a series after an observation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub average: f64,
    pub peak: f64,
}

/// the quantities that are averaged and tracked for peaks.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Metric {
    PackagePower,
    CpuPower,
    GpuPower,
    DiskReadIops,
    DiskWriteIops,
    DiskReadBytes,
    DiskWriteBytes,
    NetworkIn,
    NetworkOut,
}

/// one [`RollingSeries`] per [`Metric`].
#[derive(Clone, Debug)]
pub struct Aggregator {
    series: [RollingSeries; Metric::ALL.len()],
}

// === impl RollingSeries ===

impl RollingSeries {
    /// creates an empty series holding at most `capacity` values.
    ///
    /// a capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            peak: 0.0,
        }
    }

    /// the window length for averaging over `avg` when sampling every `interval`.
    pub fn window_len(avg: Duration, interval: Duration) -> usize {
        let interval = interval.as_secs().max(1);
        (avg.as_secs() / interval).max(1) as usize
    }

    /// records a value, returning the updated average and peak.
    pub fn observe(&mut self, value: f64) -> Reading {
        let Self {
            window,
            capacity,
            peak,
        } = self;

        if window.len() == *capacity {
            window.pop_front();
        }
        window.push_back(value);
        debug_assert!(window.len() <= *capacity);

        if value > *peak {
            *peak = value;
        }

        self.reading()
    }

    /// the current average and peak.
    pub fn reading(&self) -> Reading {
        Reading {
            average: self.average(),
            peak: self.peak,
        }
    }

    /// the arithmetic mean of the values in the window, or zero when it is empty.
    pub fn average(&self) -> f64 {
        let Self { window, .. } = self;
        match window.len() {
            0 => 0.0,
            n => window.iter().sum::<f64>() / n as f64,
        }
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// the number of values in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// forgets every value and the peak.
    pub fn reset(&mut self) {
        let Self { window, peak, .. } = self;
        window.clear();
        *peak = 0.0;
    }
}

// === impl Metric ===

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::PackagePower,
        Metric::CpuPower,
        Metric::GpuPower,
        Metric::DiskReadIops,
        Metric::DiskWriteIops,
        Metric::DiskReadBytes,
        Metric::DiskWriteBytes,
        Metric::NetworkIn,
        Metric::NetworkOut,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

// === impl Aggregator ===

impl Aggregator {
    /// creates an aggregator whose series each hold `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            series: std::array::from_fn(|_| RollingSeries::new(capacity)),
        }
    }

    pub fn observe(&mut self, metric: Metric, value: f64) -> Reading {
        self.series[metric.index()].observe(value)
    }

    pub fn series(&self, metric: Metric) -> &RollingSeries {
        &self.series[metric.index()]
    }

    pub fn reading(&self, metric: Metric) -> Reading {
        self.series(metric).reading()
    }

    /// resets every series.
    pub fn reset(&mut self) {
        self.series.iter_mut().for_each(RollingSeries::reset);
    }
}
