use {
    crate::{
        frame::{Framer, RawFrame},
        sample::{DeriveError, Sample, report::Report},
        source::{Poll, Powermetrics, SampleSource},
        topology::Topology,
    },
    std::{
        io,
        time::{Duration, SystemTime},
    },
    thiserror::Error,
};

/// observes the sampler's output.
pub struct Sentinel<S = Powermetrics> {
    /// the underlying source of sampler output.
    source: S,
    /// assembles lines of output into records.
    framer: Framer,
    /// the host topology, needed to derive samples.
    topology: Topology,
    /// the interval the sampler accumulates each record over.
    interval: Duration,
    inner: Inner,
}

enum Inner {
    /// no sample has been accepted yet.
    Waiting,
    Running {
        /// the timestamp of the last accepted sample.
        last: SystemTime,
        /// how many samples have been accepted.
        accepted: u64,
    },
}

/// the result of one observation.
#[derive(Debug)]
pub enum Observation {
    /// complete samples, in arrival order.
    Samples(Vec<Sample>),
    /// output arrived, but it completed no sample.
    Partial,
    /// no output arrived before the timeout.
    Idle,
    /// the sampler has exited.
    Closed,
}

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("failed to read sampler output: {0}")]
    Io(#[from] io::Error),
}

// === impl Sentinel ===

impl<S: SampleSource> Sentinel<S> {
    /// creates a new [`Sentinel`].
    pub fn new(source: S, topology: Topology, interval: Duration) -> Self {
        Self {
            source,
            framer: Framer::new(),
            topology,
            interval,
            inner: Inner::Waiting,
        }
    }

    /// waits at most `timeout` for output, returning every sample it completed.
    ///
    /// records that fail to decode or derive are skipped; they are never an error.
    pub fn observe(&mut self, timeout: Duration) -> Result<Observation, SentinelError> {
        let lines = match self.source.poll(timeout)? {
            Poll::Lines(lines) => lines,
            Poll::Idle => return Ok(Observation::Idle),
            Poll::Closed => return Ok(Observation::Closed),
        };

        let mut samples = Vec::new();
        for line in lines {
            if let Some(frame) = self.framer.feed(&line) {
                samples.extend(self.accept(&frame));
            }
        }

        Ok(if samples.is_empty() {
            Observation::Partial
        } else {
            Observation::Samples(samples)
        })
    }

    /// returns true until the first sample has been accepted.
    pub fn is_waiting(&self) -> bool {
        matches!(self.inner, Inner::Waiting)
    }

    fn accept(&mut self, frame: &RawFrame) -> Option<Sample> {
        let report = match Report::decode(frame) {
            Ok(report) => report,
            Err(error) => {
                log::warn!("skipping cycle: {error}");
                return None;
            }
        };

        let sample = match Sample::derive(&report, &self.topology, self.interval) {
            Ok(sample) => sample,
            Err(DeriveError::NoTimestamp) => {
                log::debug!("skipping a record without a timestamp");
                return None;
            }
            Err(error) => {
                log::warn!("skipping cycle: {error}");
                return None;
            }
        };

        match &mut self.inner {
            Inner::Waiting => {
                log::info!("received first sample");
                self.inner = Inner::Running {
                    last: sample.timestamp,
                    accepted: 1,
                };
            }
            Inner::Running { last, accepted } => {
                if sample.timestamp <= *last {
                    log::debug!("sample timestamp did not advance");
                }
                *last = sample.timestamp;
                *accepted += 1;
                log::trace!("accepted sample #{accepted}");
            }
        }

        Some(sample)
    }
}
