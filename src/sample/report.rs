//! the decoded shape of one sampler record.
//!
//! these mirror the keys emitted by `powermetrics -f plist`. required keys that are missing
//! fail the whole record; the disk and network sections are optional.

use {
    super::DecodeError,
    crate::frame::RawFrame,
    serde::Deserialize,
    std::{io::Cursor, time::SystemTime},
};

#[derive(Clone, Debug, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub timestamp: Option<plist::Date>,
    pub thermal_pressure: String,
    pub processor: Processor,
    pub gpu: Gpu,
    #[serde(default)]
    pub disk: Option<Disk>,
    #[serde(default)]
    pub network: Option<Network>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Processor {
    pub clusters: Vec<ClusterEntry>,
    /// package energy over the interval, in milliwatt-seconds.
    pub combined_power: f64,
    pub cpu_energy: f64,
    pub gpu_energy: f64,
    pub ane_energy: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClusterEntry {
    pub name: String,
    pub freq_hz: f64,
    pub idle_ratio: f64,
    /// absent on hardware generations without a reported down state.
    #[serde(default)]
    pub down_ratio: Option<f64>,
    #[serde(default)]
    pub cpus: Vec<CpuEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CpuEntry {
    pub cpu: u32,
    pub freq_hz: f64,
    pub idle_ratio: f64,
    #[serde(default)]
    pub down_ratio: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Gpu {
    /// NB: despite the name, the sampler reports this in MHz.
    pub freq_hz: f64,
    pub idle_ratio: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Disk {
    pub rops_per_s: f64,
    pub wops_per_s: f64,
    pub rbytes_per_s: f64,
    pub wbytes_per_s: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Network {
    pub ibyte_rate: f64,
    pub obyte_rate: f64,
}

// === impl Report ===

impl Report {
    /// decodes a property list record.
    pub fn decode(frame: &RawFrame) -> Result<Self, DecodeError> {
        plist::from_reader(Cursor::new(&**frame)).map_err(DecodeError)
    }

    /// the record's timestamp, unless it is absent or zero.
    pub fn time(&self) -> Option<SystemTime> {
        self.timestamp
            .map(SystemTime::from)
            .filter(|time| *time > SystemTime::UNIX_EPOCH)
    }
}
