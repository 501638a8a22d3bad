//! records and topologies shared by tests.

use {
    crate::topology::{GpuCores, Topology},
    std::fmt::Write,
};

/// a complete record from a ten core machine with a split performance tier.
pub const M1_PRO: &str = include_str!("../testdata/m1_pro.plist");

pub fn m1_pro() -> Topology {
    Topology::new("Apple M1 Pro".to_owned(), 2, 8, GpuCores::Known(16))
}

/// a cpu entry: (cpu number, frequency in hz, idle ratio, down ratio).
pub type Cpu = (u32, f64, f64, Option<f64>);

/// builds a minimal record, for exercising particular shapes of the processor section.
#[derive(Clone, Debug)]
pub struct Record {
    pub timestamp: Option<&'static str>,
    pub thermal_pressure: &'static str,
    pub clusters: Vec<String>,
    pub combined_power: f64,
    pub cpu_energy: f64,
    pub gpu_energy: f64,
    pub ane_energy: f64,
    pub disk: bool,
    pub network: bool,
}

/// renders one cluster entry.
pub fn cluster(name: &str, freq_hz: f64, idle: f64, down: Option<f64>, cpus: &[Cpu]) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<dict><key>name</key><string>{name}</string>\
         <key>freq_hz</key><real>{freq_hz}</real>\
         <key>idle_ratio</key><real>{idle}</real>"
    );
    if let Some(down) = down {
        let _ = write!(out, "<key>down_ratio</key><real>{down}</real>");
    }
    out.push_str("<key>cpus</key><array>");
    for (cpu, freq_hz, idle, down) in cpus {
        let _ = write!(
            out,
            "<dict><key>cpu</key><integer>{cpu}</integer>\
             <key>freq_hz</key><real>{freq_hz}</real>\
             <key>idle_ratio</key><real>{idle}</real>"
        );
        if let Some(down) = down {
            let _ = write!(out, "<key>down_ratio</key><real>{down}</real>");
        }
        out.push_str("</dict>");
    }
    out.push_str("</array></dict>");
    out
}

impl Default for Record {
    fn default() -> Self {
        Self {
            timestamp: Some("2023-10-19T06:00:00Z"),
            thermal_pressure: "Nominal",
            clusters: vec![
                cluster("E-Cluster", 1e9, 0.5, None, &[(0, 1e9, 0.5, None)]),
                cluster("P-Cluster", 3e9, 0.5, None, &[(1, 3e9, 0.5, None)]),
            ],
            combined_power: 1000.0,
            cpu_energy: 1000.0,
            gpu_energy: 0.0,
            ane_energy: 0.0,
            disk: true,
            network: true,
        }
    }
}

impl Record {
    pub fn to_xml(&self) -> String {
        let Self {
            timestamp,
            thermal_pressure,
            clusters,
            combined_power,
            cpu_energy,
            gpu_energy,
            ane_energy,
            disk,
            network,
        } = self;

        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict>\n",
        );
        if let Some(timestamp) = timestamp {
            let _ = writeln!(out, "<key>timestamp</key><date>{timestamp}</date>");
        }
        let _ = writeln!(
            out,
            "<key>thermal_pressure</key><string>{thermal_pressure}</string>"
        );
        let _ = writeln!(
            out,
            "<key>processor</key><dict><key>clusters</key><array>{}</array>\
             <key>combined_power</key><real>{combined_power}</real>\
             <key>cpu_energy</key><real>{cpu_energy}</real>\
             <key>gpu_energy</key><real>{gpu_energy}</real>\
             <key>ane_energy</key><real>{ane_energy}</real></dict>",
            clusters.concat()
        );
        out.push_str(
            "<key>gpu</key><dict><key>freq_hz</key><real>500</real>\
             <key>idle_ratio</key><real>0.25</real></dict>\n",
        );
        if *disk {
            out.push_str(
                "<key>disk</key><dict><key>rops_per_s</key><real>3</real>\
                 <key>wops_per_s</key><real>4</real><key>rbytes_per_s</key><real>5</real>\
                 <key>wbytes_per_s</key><real>6</real></dict>\n",
            );
        }
        if *network {
            out.push_str(
                "<key>network</key><dict><key>ibyte_rate</key><real>7</real>\
                 <key>obyte_rate</key><real>8</real></dict>\n",
            );
        }
        out.push_str("</dict>\n</plist>\n");
        out
    }
}
