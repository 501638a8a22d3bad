//! normalized per-cycle telemetry.
//!
//! a [`Report`] is the raw record as the sampler emitted it. [`Sample::derive()`] turns it into
//! a [`Sample`], resolving the differences between hardware generations once so that nothing
//! downstream needs to care about cluster names or optional keys.

use {
    self::report::{ClusterEntry, CpuEntry, Report},
    crate::topology::Topology,
    std::{fmt, time::{Duration, SystemTime}},
    thiserror::Error,
};

pub mod report;


/// a snapshot of one sampling interval.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: SystemTime,
    /// true unless the thermal pressure is nominal.
    pub thermal_throttled: bool,
    /// one entry per performance tier, efficiency first.
    pub clusters: Vec<Cluster>,
    pub cores: Vec<Core>,
    pub gpu: Gpu,
    pub power: Power,
    pub disk: Disk,
    pub network: Network,
}

/// a performance tier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Tier {
    /// efficiency cores.
    E,
    /// performance cores.
    P,
}

/// the headline figures for a tier.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub tier: Tier,
    pub frequency_mhz: u32,
    /// utilization computed from the tier's cores.
    pub active_percent: u8,
    pub layout: TierLayout,
}

/// how the sampler reported a tier.
#[derive(Clone, Debug, PartialEq)]
pub enum TierLayout {
    /// a single cluster entry covers the whole tier.
    Combined(ClusterReading),
    /// the tier is split across dies, with no entry for the whole.
    Split(Vec<ClusterReading>),
}

/// the figures reported for one cluster entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterReading {
    pub frequency_mhz: u32,
    pub active_percent: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Core {
    pub tier: Tier,
    /// the cpu number assigned by the kernel.
    pub index: u32,
    pub frequency_mhz: u32,
    pub active_percent: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gpu {
    pub frequency_mhz: u32,
    pub active_percent: u8,
}

/// instantaneous power, in watts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Power {
    pub package_watts: f64,
    pub cpu_watts: f64,
    pub gpu_watts: f64,
    pub ane_watts: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Disk {
    pub read_iops: f64,
    pub write_iops: f64,
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Network {
    pub in_bytes_per_sec: f64,
    pub out_bytes_per_sec: f64,
}

/// a record could not be decoded.
#[derive(Debug, Error)]
#[error("malformed record: {0}")]
pub struct DecodeError(#[source] pub plist::Error);

/// a decoded record could not be turned into a [`Sample`].
#[derive(Debug, Error, PartialEq)]
pub enum DeriveError {
    /// the record has no timestamp, or a zero one.
    #[error("record has no timestamp")]
    NoTimestamp,
    #[error("unrecognized cluster: {name:?}")]
    UnknownCluster { name: String },
}

// === impl Sample ===

impl Sample {
    /// the thermal pressure reported when the package is not throttled.
    const NOMINAL: &str = "Nominal";

    /// derives a sample from a decoded record.
    ///
    /// `interval` is the sampling interval the energy counters were accumulated over.
    pub fn derive(
        report: &Report,
        topology: &Topology,
        interval: Duration,
    ) -> Result<Self, DeriveError> {
        let timestamp = report.time().ok_or(DeriveError::NoTimestamp)?;

        let (clusters, cores) = Self::clusters(&report.processor.clusters)?;
        if cores.len() != topology.cores() {
            log::debug!(
                "record reports {} cores, topology has {}",
                cores.len(),
                topology.cores()
            );
        }

        let gpu = Gpu {
            frequency_mhz: report.gpu.freq_hz.max(0.0).round() as u32,
            active_percent: active_percent(report.gpu.idle_ratio),
        };

        let processor = &report.processor;
        let power = Power {
            package_watts: watts(processor.combined_power, interval),
            cpu_watts: watts(processor.cpu_energy, interval),
            gpu_watts: watts(processor.gpu_energy, interval),
            ane_watts: watts(processor.ane_energy, interval),
        };

        let disk = report
            .disk
            .as_ref()
            .map(|disk| Disk {
                read_iops: disk.rops_per_s.max(0.0),
                write_iops: disk.wops_per_s.max(0.0),
                read_bytes_per_sec: disk.rbytes_per_s.max(0.0),
                write_bytes_per_sec: disk.wbytes_per_s.max(0.0),
            })
            .unwrap_or_default();

        let network = report
            .network
            .as_ref()
            .map(|network| Network {
                in_bytes_per_sec: network.ibyte_rate.max(0.0),
                out_bytes_per_sec: network.obyte_rate.max(0.0),
            })
            .unwrap_or_default();

        Ok(Self {
            timestamp,
            thermal_throttled: report.thermal_pressure != Self::NOMINAL,
            clusters,
            cores,
            gpu,
            power,
            disk,
            network,
        })
    }

    /// the headline figures for a tier, if the record included it.
    pub fn cluster(&self, tier: Tier) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.tier == tier)
    }

    /// the cores belonging to a tier, in the order they were reported.
    pub fn cores_of(&self, tier: Tier) -> impl Iterator<Item = &Core> {
        self.cores.iter().filter(move |core| core.tier == tier)
    }

    fn clusters(entries: &[ClusterEntry]) -> Result<(Vec<Cluster>, Vec<Core>), DeriveError> {
        let mut cores = Vec::new();
        // combined idle ratios of each tier's cores.
        let mut idle: [Vec<f64>; 2] = Default::default();
        let mut combined: [Option<ClusterReading>; 2] = Default::default();
        let mut split: [Vec<ClusterReading>; 2] = Default::default();

        for entry in entries {
            let (tier, whole) = Tier::classify(&entry.name)?;
            let reading = ClusterReading::from(entry);

            for cpu in &entry.cpus {
                let ratio = core_idle(entry.down_ratio, cpu);
                idle[tier.index()].push(ratio);
                cores.push(Core {
                    tier,
                    index: cpu.cpu,
                    frequency_mhz: mhz(cpu.freq_hz),
                    active_percent: percent(1.0 - ratio),
                });
            }

            if whole {
                combined[tier.index()].get_or_insert(reading);
            } else {
                split[tier.index()].push(reading);
            }
        }

        let clusters = Tier::ALL
            .into_iter()
            .filter_map(|tier| {
                let i = tier.index();
                let layout = match (combined[i].take(), std::mem::take(&mut split[i])) {
                    (Some(reading), _) => TierLayout::Combined(reading),
                    (None, subs) if !subs.is_empty() => TierLayout::Split(subs),
                    (None, _) => return None,
                };
                let active_percent = match idle[i].as_slice() {
                    [] => layout.reported_active(),
                    ratios => percent(1.0 - ratios.iter().sum::<f64>() / ratios.len() as f64),
                };
                Some(Cluster {
                    tier,
                    frequency_mhz: layout.frequency_mhz(),
                    active_percent,
                    layout,
                })
            })
            .collect();

        Ok((clusters, cores))
    }
}

/// the fraction of the interval a core spent idle or powered down.
///
/// when the cluster reports a down ratio, time the whole cluster spent down counts as idle, and
/// the core's own idle and down time is scaled to the remainder. without one, the core's idle
/// ratio stands alone.
fn core_idle(cluster_down: Option<f64>, cpu: &CpuEntry) -> f64 {
    let idle = match cluster_down {
        Some(down) => down + (1.0 - down) * (cpu.idle_ratio + cpu.down_ratio.unwrap_or(0.0)),
        None => cpu.idle_ratio,
    };
    idle.clamp(0.0, 1.0)
}

fn active_percent(idle_ratio: f64) -> u8 {
    percent(1.0 - idle_ratio.clamp(0.0, 1.0))
}

/// a ratio in `[0, 1]` as a rounded percentage.
fn percent(ratio: f64) -> u8 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn mhz(hz: f64) -> u32 {
    (hz.max(0.0) / 1e6).round() as u32
}

/// converts milliwatt-seconds accumulated over `interval` into watts.
fn watts(energy: f64, interval: Duration) -> f64 {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (energy / 1000.0 / secs).max(0.0)
}

// === impl Tier ===

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::E, Tier::P];

    /// classifies a cluster name, returning its tier and whether it covers the whole tier.
    ///
    /// `E-Cluster` covers a whole tier, `E0-Cluster` is one die's share of it.
    fn classify(name: &str) -> Result<(Self, bool), DeriveError> {
        let unknown = || DeriveError::UnknownCluster {
            name: name.to_owned(),
        };

        let tier = match name.chars().next() {
            Some('E') => Tier::E,
            Some('P') => Tier::P,
            _ => return Err(unknown()),
        };
        let whole = !name[1..].starts_with(|c: char| c.is_ascii_digit());

        Ok((tier, whole))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::E => f.write_str("E"),
            Self::P => f.write_str("P"),
        }
    }
}

// === impl TierLayout ===

impl TierLayout {
    /// the representative clock rate: the tier's own, or the fastest of its sub-clusters.
    pub fn frequency_mhz(&self) -> u32 {
        match self {
            Self::Combined(reading) => reading.frequency_mhz,
            Self::Split(subs) => subs.iter().map(|r| r.frequency_mhz).max().unwrap_or(0),
        }
    }

    /// the utilization the sampler reported for the tier as a whole.
    ///
    /// for split tiers this is the unweighted mean of the sub-clusters.
    pub fn reported_active(&self) -> u8 {
        match self {
            Self::Combined(reading) => reading.active_percent,
            Self::Split(subs) if subs.is_empty() => 0,
            Self::Split(subs) => {
                let sum: f64 = subs.iter().map(|r| r.active_percent as f64).sum();
                (sum / subs.len() as f64).round() as u8
            }
        }
    }
}

// === impl ClusterReading ===

impl From<&ClusterEntry> for ClusterReading {
    fn from(entry: &ClusterEntry) -> Self {
        Self {
            frequency_mhz: mhz(entry.freq_hz),
            active_percent: active_percent(entry.idle_ratio),
        }
    }
}
