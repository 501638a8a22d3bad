//! static facts about the host: core counts, model name, and power ceilings.

use {
    std::{fmt, io, process::Command},
    thiserror::Error,
};

/// the host's processor topology, resolved once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    pub model_name: String,
    /// efficiency cores.
    pub e_cores: usize,
    /// performance cores.
    pub p_cores: usize,
    pub gpu_cores: GpuCores,
    /// the soft cpu power ceiling, in watts.
    pub cpu_max_power_watts: f64,
    /// the soft gpu power ceiling, in watts.
    pub gpu_max_power_watts: f64,
}

/// the number of gpu cores, when the system profiler reports one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GpuCores {
    Known(u32),
    Unknown,
}

/// a maximum used to express a value as a percentage.
///
/// ceilings are modeling defaults, not verified hardware limits. an observation above the
/// ceiling raises it, so percentages never exceed 100.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoftCeiling(f64);

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("`{key}` is missing from sysctl output")]
    Missing { key: &'static str },
    #[error("invalid value for `{key}`: {value:?}")]
    Invalid { key: &'static str, value: String },
}

// === impl Topology ===

impl Topology {
    const BRAND: &str = "machdep.cpu.brand_string";
    const P_CORES: &str = "hw.perflevel0.logicalcpu";
    const E_CORES: &str = "hw.perflevel1.logicalcpu";

    /// cpu and gpu ceilings, in watts, for models that are not in the table.
    const DEFAULT_CEILINGS: (f64, f64) = (20.0, 20.0);

    /// resolves the topology of this machine.
    pub fn resolve() -> Result<Self, TopologyError> {
        let model_name = Self::sysctl(Self::BRAND)?;
        let p_cores = Self::sysctl(Self::P_CORES).and_then(|v| Self::count(Self::P_CORES, &v))?;
        let e_cores = Self::sysctl(Self::E_CORES).and_then(|v| Self::count(Self::E_CORES, &v))?;
        let gpu_cores = Self::gpu_cores();

        Ok(Self::new(model_name, e_cores, p_cores, gpu_cores))
    }

    /// builds a topology, looking up the power ceilings for the given model.
    pub fn new(model_name: String, e_cores: usize, p_cores: usize, gpu_cores: GpuCores) -> Self {
        let (cpu_max_power_watts, gpu_max_power_watts) = Self::ceilings(&model_name);
        Self {
            model_name,
            e_cores,
            p_cores,
            gpu_cores,
            cpu_max_power_watts,
            gpu_max_power_watts,
        }
    }

    /// returns the (cpu, gpu) power ceilings for a model, in watts.
    pub fn ceilings(model_name: &str) -> (f64, f64) {
        match model_name.trim() {
            "Apple M1 Max" => (30.0, 60.0),
            "Apple M1 Pro" => (30.0, 30.0),
            "Apple M1" => (20.0, 20.0),
            "Apple M1 Ultra" => (60.0, 120.0),
            "Apple M2" => (25.0, 15.0),
            other => {
                log::info!("no power ceilings known for {other:?}, using defaults");
                Self::DEFAULT_CEILINGS
            }
        }
    }

    /// the total number of physical cpu cores.
    pub fn cores(&self) -> usize {
        self.e_cores + self.p_cores
    }

    fn sysctl(key: &'static str) -> Result<String, TopologyError> {
        const COMMAND: &str = "sysctl";
        let output = Command::new(COMMAND)
            .args(["-n", key])
            .output()
            .map_err(|source| TopologyError::Spawn { command: COMMAND, source })?;
        if !output.status.success() {
            return Err(TopologyError::Missing { key });
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if value.is_empty() {
            return Err(TopologyError::Missing { key });
        }

        Ok(value)
    }

    fn count(key: &'static str, value: &str) -> Result<usize, TopologyError> {
        value.trim().parse().map_err(|_| TopologyError::Invalid {
            key,
            value: value.to_owned(),
        })
    }

    fn gpu_cores() -> GpuCores {
        const COMMAND: &str = "system_profiler";
        let output = Command::new(COMMAND)
            .args(["-detailLevel", "basic", "SPDisplaysDataType"])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                GpuCores::from_profile(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(_) => {
                log::warn!("{COMMAND} exited unsuccessfully, gpu core count is unknown");
                GpuCores::Unknown
            }
            Err(error) => {
                log::warn!("could not run {COMMAND}: {error}");
                GpuCores::Unknown
            }
        }
    }
}

// === impl GpuCores ===

impl GpuCores {
    /// finds the "Total Number of Cores" line in a system profiler report.
    pub fn from_profile(profile: &str) -> Self {
        profile
            .lines()
            .filter_map(|line| line.trim().strip_prefix("Total Number of Cores:"))
            .find_map(|count| count.trim().parse().ok())
            .map(Self::Known)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for GpuCores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{n}"),
            Self::Unknown => f.write_str("?"),
        }
    }
}

// === impl SoftCeiling ===

impl SoftCeiling {
    /// the ceiling used for the neural engine, which no model table covers.
    pub const ANE_WATTS: f64 = 16.0;

    pub fn new(max: f64) -> Self {
        Self(max.max(0.0))
    }

    /// returns `value` as a percentage of the ceiling, raising the ceiling first if needed.
    pub fn percent(&mut self, value: f64) -> u8 {
        let Self(max) = self;

        if !value.is_finite() {
            log::warn!("ignoring a non-finite reading: {value}");
            return 0;
        }

        if value > *max {
            log::debug!("raising soft ceiling from {max:.2} to {value:.2}");
            *max = value;
        }

        if *max <= 0.0 {
            return 0;
        }

        let percent = (value.max(0.0) / *max * 100.0).round();
        assert!(percent <= 100.0);
        percent as u8
    }

    pub fn get(&self) -> f64 {
        let Self(max) = self;
        *max
    }
}
