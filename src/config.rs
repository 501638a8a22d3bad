//! command-line configuration.

use {
    crate::{
        dashboard::{DashboardState, Theme, ViewMode},
        rolling::RollingSeries,
    },
    clap::Parser,
    std::time::Duration,
};

/// a compact apple silicon performance monitor.
///
/// reads `powermetrics`, which needs root. key bindings: left and right arrows change the
/// color theme, 1 and 2 switch between the compact and detailed views, ctrl+r resets
/// averages and peaks, q or escape quits.
#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(version, about)]
pub struct Config {
    /// seconds between samples.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// color theme, from 1 to 8.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub color: u8,

    /// seconds of history averaged for power and throughput.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub avg: u64,

    /// start in the detailed view, with a gauge for every core.
    #[arg(long)]
    pub show_cores: bool,
}

// === impl Config ===

impl Config {
    /// the sampling interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// the number of samples each rolling series holds.
    pub fn window_len(&self) -> usize {
        RollingSeries::window_len(Duration::from_secs(self.avg), self.interval())
    }

    /// the dashboard's initial state.
    pub fn state(&self) -> DashboardState {
        let Self {
            color, show_cores, ..
        } = self;

        DashboardState {
            view: if *show_cores {
                ViewMode::Detailed
            } else {
                ViewMode::Compact
            },
            theme: Theme::new(*color).unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: 1,
            color: 2,
            avg: 30,
            show_cores: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("siltop").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.window_len(), 30);
        assert_eq!(config.state(), DashboardState::default());
    }

    #[test]
    fn all_options() {
        let config = parse(&["--interval", "4", "--color", "8", "--avg", "10", "--show-cores"]).unwrap();
        assert_eq!(config.window_len(), 2);
        assert_eq!(config.state().view, ViewMode::Detailed);
        assert_eq!(config.state().theme.get(), 8);
    }

    #[test]
    fn short_average_keeps_one_sample() {
        let config = parse(&["--interval", "5", "--avg", "2"]).unwrap();
        assert_eq!(config.window_len(), 1);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(parse(&["--color", "0"]).is_err());
        assert!(parse(&["--color", "9"]).is_err());
        assert!(parse(&["--interval", "0"]).is_err());
        assert!(parse(&["--avg", "0"]).is_err());
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
