//! the dashboard: view and theme state, and the widgets that show each sample.
//!
//! a [`Dashboard`] is a small state machine over a [`ViewMode`] and a [`Theme`]. keys are
//! applied with [`Dashboard::apply()`], which reports the [`Transition`] taken so that the
//! caller can clear or redraw its surface. samples are fed in with [`Dashboard::ingest()`].

use {
    crate::{
        humanize,
        memory::MemoryReading,
        rolling::{Aggregator, Metric, Reading},
        sample::{Sample, Tier},
        topology::{SoftCeiling, Topology},
        widget::{Axis, Builder, Node, Slot, WidgetTree},
    },
    std::fmt,
};

#[cfg(test)]
mod tests;

/// how much detail the dashboard shows.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ViewMode {
    /// tier gauges only.
    #[default]
    Compact,
    /// tier gauges, and a column for every core.
    Detailed,
}

/// a color theme, numbered from 1 to 8.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Theme(u8);

/// the state that user input changes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DashboardState {
    pub view: ViewMode,
    pub theme: Theme,
}

/// an input the dashboard responds to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    /// the previous theme.
    Left,
    /// the next theme.
    Right,
    /// the compact view.
    Digit1,
    /// the detailed view.
    Digit2,
    /// forget every average and peak.
    Reset,
    Quit,
}

/// the outcome of applying a [`Key`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    /// nothing changed.
    None,
    /// the widget tree was rebuilt. the surface should be cleared.
    Relayout,
    /// every widget was recolored in place.
    Recolor,
    /// every rolling series was reset.
    Reset,
    Quit,
}

pub struct Dashboard {
    state: DashboardState,
    topology: Topology,
    tree: WidgetTree,
    /// incremented every time the tree is rebuilt.
    generation: u64,
    aggregator: Aggregator,
    ceilings: Ceilings,
    /// the most recent sample.
    last: Option<Sample>,
    /// the most recent memory reading.
    memory: Option<MemoryReading>,
}

/// the soft ceilings that power readings are shown against.
struct Ceilings {
    cpu: SoftCeiling,
    gpu: SoftCeiling,
    ane: SoftCeiling,
}

// === impl Dashboard ===

impl Dashboard {
    /// creates a dashboard for `topology`, averaging over `window` samples.
    pub fn new(topology: Topology, state: DashboardState, window: usize) -> Self {
        let tree = layout(state, &topology);
        let ceilings = Ceilings {
            cpu: SoftCeiling::new(topology.cpu_max_power_watts),
            gpu: SoftCeiling::new(topology.gpu_max_power_watts),
            ane: SoftCeiling::new(SoftCeiling::ANE_WATTS),
        };

        let mut dashboard = Self {
            state,
            topology,
            tree,
            generation: 0,
            aggregator: Aggregator::new(window),
            ceilings,
            last: None,
            memory: None,
        };
        dashboard.refresh();
        dashboard
    }

    /// applies a key, returning the transition taken.
    pub fn apply(&mut self, key: Key) -> Transition {
        let DashboardState { theme, .. } = self.state;

        match key {
            Key::Left => self.recolor(theme.prev()),
            Key::Right => self.recolor(theme.next()),
            Key::Digit1 => self.switch(ViewMode::Compact),
            Key::Digit2 => self.switch(ViewMode::Detailed),
            Key::Reset => {
                log::info!("resetting averages and peaks");
                self.aggregator.reset();
                self.refresh();
                Transition::Reset
            }
            Key::Quit => Transition::Quit,
        }
    }

    /// feeds a sample into the rolling series and charts, then refreshes every widget.
    ///
    /// a `memory` of `None` keeps the previous memory reading.
    pub fn ingest(&mut self, sample: Sample, memory: Option<MemoryReading>) {
        let Self {
            tree,
            aggregator,
            ceilings,
            ..
        } = self;

        for metric in Metric::ALL {
            let value = measure(&sample, metric);
            let Reading { peak, .. } = aggregator.observe(metric, value);
            let point = match metric {
                Metric::PackagePower => continue,
                Metric::CpuPower => ceilings.cpu.percent(value),
                Metric::GpuPower => ceilings.gpu.percent(value),
                _ => share_of_peak(value, peak),
            };
            if let Some(chart) = tree.widget_mut(Slot::Chart(metric)) {
                chart.append_point(point);
            }
        }

        self.last = Some(sample);
        if memory.is_some() {
            self.memory = memory;
        }
        self.refresh();
    }

    /// recomputes every title and value from the last sample and the rolling series.
    pub fn refresh(&mut self) {
        let Self {
            topology,
            tree,
            aggregator,
            ceilings,
            last,
            memory,
            ..
        } = self;

        title(tree, Slot::ProcessorPanel, processor_title(topology));

        if let Some(memory) = memory {
            gauge(tree, Slot::Ram, ram_title(memory), memory.used_percent);
        }

        let Some(sample) = last else {
            return;
        };

        for tier in Tier::ALL {
            let (active, mhz) = sample
                .cluster(tier)
                .map_or((0, 0), |c| (c.active_percent, c.frequency_mhz));
            gauge(
                tree,
                Slot::Tier(tier),
                format!("{tier}-CPU Usage: {active}% @ {mhz} MHz"),
                active,
            );

            let label = match tier {
                Tier::P if topology.p_cores >= 6 => "C-",
                _ => "Core-",
            };
            for (i, core) in sample.cores_of(tier).enumerate() {
                gauge(
                    tree,
                    Slot::Core(tier, i),
                    format!("{label}{} {}%", core.index + 1, core.active_percent),
                    core.active_percent,
                );
            }
        }

        let gpu = &sample.gpu;
        gauge(
            tree,
            Slot::Gpu,
            format!("GPU Usage: {}% @ {} MHz", gpu.active_percent, gpu.frequency_mhz),
            gpu.active_percent,
        );

        let ane_watts = sample.power.ane_watts;
        let ane = ceilings.ane.percent(ane_watts);
        gauge(tree, Slot::Ane, format!("ANE Usage: {ane}% @ {ane_watts:.1} W"), ane);

        let throttle = if sample.thermal_throttled { "yes" } else { "no" };
        title(
            tree,
            Slot::PowerPanel,
            format!(
                "CPU+GPU+ANE Power: {} throttle: {throttle}",
                Watts(sample.power.package_watts, aggregator.reading(Metric::PackagePower))
            ),
        );

        for metric in Metric::ALL {
            let value = measure(sample, metric);
            let Reading { peak, .. } = aggregator.reading(metric);
            let text = match metric {
                Metric::PackagePower => continue,
                Metric::CpuPower => format!("CPU: {}", Watts(value, aggregator.reading(metric))),
                Metric::GpuPower => format!("GPU: {}", Watts(value, aggregator.reading(metric))),
                Metric::DiskReadIops => format!("Read iops: {value:.1} (peak: {peak:.1})"),
                Metric::DiskWriteIops => format!("Write iops: {value:.1} (peak: {peak:.1})"),
                Metric::DiskReadBytes => format!("Read: {}", Rate(value, peak)),
                Metric::DiskWriteBytes => format!("Write: {}", Rate(value, peak)),
                Metric::NetworkIn => format!("In: {}", Rate(value, peak)),
                Metric::NetworkOut => format!("Out: {}", Rate(value, peak)),
            };
            title(tree, Slot::Chart(metric), text);
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    /// the number of times the widget tree has been rebuilt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    fn recolor(&mut self, theme: Theme) -> Transition {
        log::debug!("switching to theme {}", theme.get());
        self.state.theme = theme;
        self.tree.recolor(theme);
        Transition::Recolor
    }

    fn switch(&mut self, view: ViewMode) -> Transition {
        if self.state.view == view {
            return Transition::None;
        }

        log::debug!("switching to the {view:?} view");
        self.state.view = view;
        self.tree = layout(self.state, &self.topology);
        self.generation += 1;
        self.refresh();
        Transition::Relayout
    }
}

/// the number of core columns placed in each row, for a tier of `count` cores.
///
/// this is the largest of 4 through 8 that divides `count`, or 8 when none does.
pub fn cores_per_row(count: usize) -> usize {
    const DEFAULT: usize = 8;
    (4..=8)
        .rev()
        .find(|n| count % n == 0)
        .unwrap_or(DEFAULT)
}

/// builds the widget tree for a view of `topology`.
fn layout(DashboardState { view, theme }: DashboardState, topology: &Topology) -> WidgetTree {
    use Axis::{Horizontal, Vertical};

    let mut b = Builder::new(theme);

    let root = match view {
        ViewMode::Compact => {
            let tiers = Builder::split(
                Horizontal,
                vec![b.gauge(Slot::Tier(Tier::E)), b.gauge(Slot::Tier(Tier::P))],
            );
            let accelerators = Builder::split(Horizontal, vec![b.gauge(Slot::Gpu), b.gauge(Slot::Ane)]);
            let processor = b.panel(
                Slot::ProcessorPanel,
                "Processor",
                Builder::split(Vertical, vec![tiers, accelerators]),
            );
            Builder::split(
                Vertical,
                vec![
                    processor,
                    memory_panel(&mut b),
                    power_panel(&mut b, Horizontal),
                    disk_panel(&mut b),
                    network_panel(&mut b),
                ],
            )
        }
        ViewMode::Detailed => {
            let mut rows = vec![b.gauge(Slot::Tier(Tier::E))];
            rows.extend(core_rows(&mut b, Tier::E, topology.e_cores));
            rows.push(b.gauge(Slot::Tier(Tier::P)));
            rows.extend(core_rows(&mut b, Tier::P, topology.p_cores));
            rows.push(b.gauge(Slot::Gpu));
            rows.push(b.gauge(Slot::Ane));
            let processor = b.panel(
                Slot::ProcessorPanel,
                "Processor",
                Builder::split(Vertical, rows),
            );

            let side = Builder::split(
                Vertical,
                vec![
                    memory_panel(&mut b),
                    power_panel(&mut b, Vertical),
                    disk_panel(&mut b),
                    network_panel(&mut b),
                ],
            );
            Builder::split(Horizontal, vec![processor, side])
        }
    };

    b.finish(root)
}

fn core_rows(b: &mut Builder, tier: Tier, count: usize) -> Vec<Node> {
    let per_row = cores_per_row(count);
    let indices = (0..count).collect::<Vec<_>>();

    let mut rows = Vec::new();
    for chunk in indices.chunks(per_row) {
        let mut columns = Vec::with_capacity(chunk.len());
        for i in chunk {
            columns.push(b.column(Slot::Core(tier, *i)));
        }
        rows.push(Builder::split(Axis::Horizontal, columns));
    }
    rows
}

fn memory_panel(b: &mut Builder) -> Node {
    let ram = b.gauge(Slot::Ram);
    b.panel(Slot::MemoryPanel, "Memory", ram)
}

fn power_panel(b: &mut Builder, axis: Axis) -> Node {
    let charts = vec![
        b.chart(Slot::Chart(Metric::CpuPower)),
        b.chart(Slot::Chart(Metric::GpuPower)),
    ];
    b.panel(Slot::PowerPanel, "Power", Builder::split(axis, charts))
}

fn disk_panel(b: &mut Builder) -> Node {
    let iops = Builder::split(
        Axis::Vertical,
        vec![
            b.chart(Slot::Chart(Metric::DiskReadIops)),
            b.chart(Slot::Chart(Metric::DiskWriteIops)),
        ],
    );
    let bytes = Builder::split(
        Axis::Vertical,
        vec![
            b.chart(Slot::Chart(Metric::DiskReadBytes)),
            b.chart(Slot::Chart(Metric::DiskWriteBytes)),
        ],
    );
    b.panel(
        Slot::DiskPanel,
        "Disk IO",
        Builder::split(Axis::Horizontal, vec![iops, bytes]),
    )
}

fn network_panel(b: &mut Builder) -> Node {
    let charts = vec![
        b.chart(Slot::Chart(Metric::NetworkIn)),
        b.chart(Slot::Chart(Metric::NetworkOut)),
    ];
    b.panel(
        Slot::NetworkPanel,
        "Network IO",
        Builder::split(Axis::Horizontal, charts),
    )
}

/// the value of `metric` in a sample.
fn measure(sample: &Sample, metric: Metric) -> f64 {
    let Sample {
        power,
        disk,
        network,
        ..
    } = sample;

    match metric {
        Metric::PackagePower => power.package_watts,
        Metric::CpuPower => power.cpu_watts,
        Metric::GpuPower => power.gpu_watts,
        Metric::DiskReadIops => disk.read_iops,
        Metric::DiskWriteIops => disk.write_iops,
        Metric::DiskReadBytes => disk.read_bytes_per_sec,
        Metric::DiskWriteBytes => disk.write_bytes_per_sec,
        Metric::NetworkIn => network.in_bytes_per_sec,
        Metric::NetworkOut => network.out_bytes_per_sec,
    }
}

/// `value` as a whole percentage of `peak`, or zero before anything has been seen.
fn share_of_peak(value: f64, peak: f64) -> u8 {
    if peak <= 0.0 {
        return 0;
    }
    (value / peak * 100.0).clamp(0.0, 100.0) as u8
}

fn processor_title(topology: &Topology) -> String {
    let Topology {
        model_name,
        e_cores,
        p_cores,
        gpu_cores,
        ..
    } = topology;
    format!("{model_name} (cores: {e_cores}E+{p_cores}P+{gpu_cores}GPU)")
}

fn ram_title(memory: &MemoryReading) -> String {
    let MemoryReading {
        total_gb,
        used_gb,
        swap_total_gb,
        swap_used_gb,
        ..
    } = memory;

    if memory.swap_active() {
        format!("RAM Usage: {used_gb:.1}/{total_gb:.1}GB - swap: {swap_used_gb:.1}/{swap_total_gb:.1}GB")
    } else {
        format!("RAM Usage: {used_gb:.1}/{total_gb:.1}GB - swap inactive")
    }
}

fn title(tree: &mut WidgetTree, slot: Slot, text: String) {
    if let Some(widget) = tree.widget_mut(slot) {
        widget.set_title(text);
    }
}

fn gauge(tree: &mut WidgetTree, slot: Slot, text: String, value: u8) {
    if let Some(widget) = tree.widget_mut(slot) {
        widget.set_title(text);
        widget.set_value(value);
    }
}

/// a power figure with its rolling average and peak.
struct Watts(f64, Reading);

impl fmt::Display for Watts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(now, Reading { average, peak }) = self;
        write!(f, "{now:.2}W (avg: {average:.2}W peak: {peak:.2}W)")
    }
}

/// a byte rate with its peak.
struct Rate(f64, f64);

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(now, peak) = self;
        write!(
            f,
            "{}/s (peak: {}/s)",
            humanize::bytes(*now),
            humanize::bytes(*peak)
        )
    }
}

// === impl Theme ===

impl Theme {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    /// returns a theme, if `n` is between [`Theme::MIN`] and [`Theme::MAX`].
    pub fn new(n: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u8 {
        let Self(n) = self;
        n
    }

    /// the next theme, wrapping around after the last.
    pub fn next(self) -> Self {
        match self.get() {
            Self::MAX => Self(Self::MIN),
            n => Self(n + 1),
        }
    }

    /// the previous theme, wrapping around before the first.
    pub fn prev(self) -> Self {
        match self.get() {
            Self::MIN => Self(Self::MAX),
            n => Self(n - 1),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self(2)
    }
}
