use {
    super::*,
    crate::{
        frame::RawFrame,
        sample::report::Report,
        testdata::{self, Record},
        topology::GpuCores,
        widget::Kind,
    },
    std::time::Duration,
};

fn theme(n: u8) -> Theme {
    Theme::new(n).unwrap()
}

fn dashboard(view: ViewMode) -> Dashboard {
    let state = DashboardState {
        view,
        theme: Theme::default(),
    };
    Dashboard::new(testdata::m1_pro(), state, 30)
}

fn sample(xml: &str) -> Sample {
    let report = Report::decode(&RawFrame::from(xml.as_bytes().to_vec())).unwrap();
    Sample::derive(&report, &testdata::m1_pro(), Duration::from_secs(1)).unwrap()
}

fn title(dashboard: &Dashboard, slot: Slot) -> &str {
    dashboard.tree().widget(slot).unwrap().title()
}

mod theme_tests {
    use super::*;

    #[test]
    fn right_cycles_with_wraparound() {
        let mut dashboard = dashboard(ViewMode::Compact);
        assert_eq!(dashboard.state().theme, theme(2));

        let mut seen = Vec::new();
        for _ in 0..8 {
            assert_eq!(dashboard.apply(Key::Right), Transition::Recolor);
            seen.push(dashboard.state().theme.get());
        }
        assert_eq!(seen, [3, 4, 5, 6, 7, 8, 1, 2]);
    }

    #[test]
    fn left_wraps_below_the_first() {
        let mut dashboard = dashboard(ViewMode::Compact);
        dashboard.apply(Key::Left);
        assert_eq!(dashboard.state().theme, theme(1));
        dashboard.apply(Key::Left);
        assert_eq!(dashboard.state().theme, theme(8));
    }

    #[test]
    fn theme_bounds() {
        assert!(Theme::new(0).is_none());
        assert!(Theme::new(9).is_none());
        assert_eq!(theme(8).next(), theme(1));
        assert_eq!(theme(1).prev(), theme(8));
    }

    #[test]
    fn recolor_does_not_rebuild() {
        let mut dashboard = dashboard(ViewMode::Detailed);
        dashboard.ingest(sample(testdata::M1_PRO), None);
        let root = dashboard.tree().root().clone();
        let ane = title(&dashboard, Slot::Ane).to_owned();

        assert_eq!(dashboard.apply(Key::Right), Transition::Recolor);

        assert_eq!(dashboard.generation(), 0);
        assert_eq!(dashboard.tree().root(), &root);
        assert_eq!(title(&dashboard, Slot::Ane), ane);
        assert!(dashboard.tree().widgets().all(|(_, w)| w.color() == theme(3)));
        // chart history survives a recolor.
        let cpu = dashboard.tree().widget(Slot::Chart(Metric::CpuPower)).unwrap();
        assert_eq!(cpu.points().len(), 1);
    }
}

mod view_tests {
    use super::*;

    #[test]
    fn switching_view_rebuilds() {
        let mut dashboard = dashboard(ViewMode::Compact);
        assert_eq!(dashboard.tree().len(), 18);
        assert!(dashboard.tree().widget(Slot::Core(Tier::P, 0)).is_none());

        assert_eq!(dashboard.apply(Key::Digit2), Transition::Relayout);
        assert_eq!(dashboard.state().view, ViewMode::Detailed);
        assert_eq!(dashboard.generation(), 1);
        // two efficiency and eight performance core columns.
        assert_eq!(dashboard.tree().len(), 28);
        let core = dashboard.tree().widget(Slot::Core(Tier::P, 7)).unwrap();
        assert_eq!(core.kind(), Kind::Column);
        assert!(dashboard.tree().widget(Slot::Core(Tier::P, 8)).is_none());

        assert_eq!(dashboard.apply(Key::Digit1), Transition::Relayout);
        assert_eq!(dashboard.generation(), 2);
        assert_eq!(dashboard.tree().len(), 18);
    }

    #[test]
    fn selecting_current_view_is_a_no_op() {
        let mut dashboard = dashboard(ViewMode::Compact);
        assert_eq!(dashboard.apply(Key::Digit1), Transition::None);
        assert_eq!(dashboard.generation(), 0);
    }

    #[test]
    fn rebuild_keeps_theme() {
        let mut dashboard = dashboard(ViewMode::Compact);
        dashboard.apply(Key::Left);
        dashboard.apply(Key::Digit2);
        assert_eq!(dashboard.state().theme, theme(1));
        assert!(dashboard.tree().widgets().all(|(_, w)| w.color() == theme(1)));
    }

    #[test]
    fn rebuild_shows_the_last_sample() {
        let mut dashboard = dashboard(ViewMode::Compact);
        dashboard.ingest(sample(testdata::M1_PRO), None);
        dashboard.apply(Key::Digit2);

        assert_eq!(title(&dashboard, Slot::Core(Tier::E, 0)), "Core-1 45%");
        assert_eq!(title(&dashboard, Slot::Core(Tier::E, 1)), "Core-2 27%");
        // six or more performance cores get a shorter label.
        assert_eq!(title(&dashboard, Slot::Core(Tier::P, 0)), "C-3 80%");
        assert_eq!(title(&dashboard, Slot::Core(Tier::P, 7)), "C-10 20%");
        assert_eq!(
            title(&dashboard, Slot::Tier(Tier::P)),
            "P-CPU Usage: 50% @ 3228 MHz"
        );
    }

    #[test]
    fn cores_per_row() {
        assert_eq!(super::cores_per_row(10), 5);
        assert_eq!(super::cores_per_row(12), 6);
        assert_eq!(super::cores_per_row(16), 8);
        assert_eq!(super::cores_per_row(4), 4);
        assert_eq!(super::cores_per_row(20), 5);
        assert_eq!(super::cores_per_row(2), 8);
        assert_eq!(super::cores_per_row(3), 8);
    }

    #[test]
    fn detailed_rows_follow_core_counts() {
        let ultra = Topology::new("Apple M1 Ultra".to_owned(), 4, 16, GpuCores::Known(64));
        let state = DashboardState {
            view: ViewMode::Detailed,
            theme: Theme::default(),
        };
        let dashboard = Dashboard::new(ultra, state, 30);

        let Node::Split { children, .. } = dashboard.tree().root() else {
            panic!("expected a split at the root");
        };
        let Node::Panel { child, .. } = &children[0] else {
            panic!("expected the processor panel first");
        };
        let Node::Split { children: rows, .. } = child.as_ref() else {
            panic!("expected processor rows");
        };

        let widths = rows
            .iter()
            .map(|row| match row {
                Node::Split { children, .. } => children.len(),
                Node::Leaf(_) => 1,
                Node::Panel { .. } => panic!("unexpected panel"),
            })
            .collect::<Vec<_>>();
        // e gauge, one row of four, p gauge, two rows of eight, gpu, ane.
        assert_eq!(widths, [1, 4, 1, 8, 8, 1, 1]);
    }
}

mod ingest_tests {
    use super::*;

    #[test]
    fn titles_from_a_sample() {
        let mut dashboard = dashboard(ViewMode::Compact);
        dashboard.ingest(sample(testdata::M1_PRO), None);

        assert_eq!(
            title(&dashboard, Slot::ProcessorPanel),
            "Apple M1 Pro (cores: 2E+8P+16GPU)"
        );
        assert_eq!(
            title(&dashboard, Slot::Tier(Tier::E)),
            "E-CPU Usage: 36% @ 972 MHz"
        );
        assert_eq!(title(&dashboard, Slot::Gpu), "GPU Usage: 10% @ 389 MHz");
        assert_eq!(title(&dashboard, Slot::Ane), "ANE Usage: 3% @ 0.5 W");
        assert_eq!(
            title(&dashboard, Slot::PowerPanel),
            "CPU+GPU+ANE Power: 5.50W (avg: 5.50W peak: 5.50W) throttle: no"
        );
        assert_eq!(
            title(&dashboard, Slot::Chart(Metric::CpuPower)),
            "CPU: 3.00W (avg: 3.00W peak: 3.00W)"
        );
        assert_eq!(
            title(&dashboard, Slot::Chart(Metric::DiskReadIops)),
            "Read iops: 12.5 (peak: 12.5)"
        );
        assert_eq!(
            title(&dashboard, Slot::Chart(Metric::DiskReadBytes)),
            "Read: 204.8 kB/s (peak: 204.8 kB/s)"
        );
        assert_eq!(
            title(&dashboard, Slot::Chart(Metric::DiskWriteBytes)),
            "Write: 1.0 MB/s (peak: 1.0 MB/s)"
        );
        assert_eq!(
            title(&dashboard, Slot::Chart(Metric::NetworkIn)),
            "In: 2.0 kB/s (peak: 2.0 kB/s)"
        );
        let e = dashboard.tree().widget(Slot::Tier(Tier::E)).unwrap();
        assert_eq!(e.value(), 36);
    }

    #[test]
    fn chart_points() {
        let mut dashboard = dashboard(ViewMode::Compact);
        dashboard.ingest(sample(testdata::M1_PRO), None);
        dashboard.ingest(sample(&Record::default().to_xml()), None);

        let points = |metric| {
            let chart = dashboard.tree().widget(Slot::Chart(metric)).unwrap();
            chart.points().iter().copied().collect::<Vec<_>>()
        };
        // power is shown against the soft ceiling, 30W for this model.
        assert_eq!(points(Metric::CpuPower), [10, 3]);
        assert_eq!(points(Metric::GpuPower), [7, 0]);
        // throughput is shown against its peak.
        assert_eq!(points(Metric::DiskWriteIops), [100, 10]);
        assert_eq!(points(Metric::NetworkOut), [100, 0]);
    }

    #[test]
    fn averages_span_samples() {
        let mut dashboard = dashboard(ViewMode::Compact);
        dashboard.ingest(sample(testdata::M1_PRO), None);
        dashboard.ingest(sample(&Record::default().to_xml()), None);

        assert_eq!(
            title(&dashboard, Slot::PowerPanel),
            "CPU+GPU+ANE Power: 1.00W (avg: 3.25W peak: 5.50W) throttle: no"
        );
    }

    #[test]
    fn ceiling_ratchets() {
        let mut dashboard = dashboard(ViewMode::Compact);
        let hot = Record {
            cpu_energy: 60_000.0,
            thermal_pressure: "Heavy",
            ..Record::default()
        };
        dashboard.ingest(sample(&hot.to_xml()), None);
        dashboard.ingest(sample(testdata::M1_PRO), None);

        let chart = dashboard.tree().widget(Slot::Chart(Metric::CpuPower)).unwrap();
        // 60W raised the 30W ceiling, so 3W is now five percent of it.
        assert_eq!(chart.points().iter().copied().collect::<Vec<_>>(), [100, 5]);
    }

    #[test]
    fn throttle_flag() {
        let mut dashboard = dashboard(ViewMode::Compact);
        let hot = Record {
            thermal_pressure: "Heavy",
            ..Record::default()
        };
        dashboard.ingest(sample(&hot.to_xml()), None);
        assert!(title(&dashboard, Slot::PowerPanel).ends_with("throttle: yes"));
    }

    #[test]
    fn memory_gauge() {
        const GIB: u64 = 1024 * 1024 * 1024;
        let mut dashboard = dashboard(ViewMode::Compact);

        let memory = MemoryReading::from_bytes(16 * GIB, 4 * GIB, 0, 0);
        dashboard.ingest(sample(testdata::M1_PRO), Some(memory));
        assert_eq!(
            title(&dashboard, Slot::Ram),
            "RAM Usage: 12.0/16.0GB - swap inactive"
        );
        assert_eq!(dashboard.tree().widget(Slot::Ram).unwrap().value(), 75);

        let memory = MemoryReading::from_bytes(16 * GIB, 8 * GIB, 2 * GIB, GIB);
        dashboard.ingest(sample(testdata::M1_PRO), Some(memory));
        assert_eq!(
            title(&dashboard, Slot::Ram),
            "RAM Usage: 8.0/16.0GB - swap: 1.0/2.0GB"
        );

        // a missing reading keeps the last one.
        dashboard.ingest(sample(testdata::M1_PRO), None);
        assert_eq!(dashboard.tree().widget(Slot::Ram).unwrap().value(), 50);
    }

    #[test]
    fn unknown_gpu_cores() {
        let topology = Topology::new("Apple M3".to_owned(), 4, 4, GpuCores::Unknown);
        let dashboard = Dashboard::new(topology, DashboardState::default(), 30);
        assert_eq!(
            title(&dashboard, Slot::ProcessorPanel),
            "Apple M3 (cores: 4E+4P+?GPU)"
        );
    }
}

mod control_tests {
    use super::*;

    #[test]
    fn reset_clears_series_only() {
        let mut dashboard = dashboard(ViewMode::Detailed);
        dashboard.apply(Key::Right);
        dashboard.ingest(sample(testdata::M1_PRO), None);
        let before = dashboard.state();

        assert_eq!(dashboard.apply(Key::Reset), Transition::Reset);

        assert_eq!(dashboard.state(), before);
        assert_eq!(dashboard.generation(), 0);
        for metric in Metric::ALL {
            assert!(dashboard.aggregator().series(metric).is_empty());
            assert_eq!(dashboard.aggregator().reading(metric).peak, 0.0);
        }
        assert_eq!(
            title(&dashboard, Slot::PowerPanel),
            "CPU+GPU+ANE Power: 5.50W (avg: 0.00W peak: 0.00W) throttle: no"
        );
    }

    #[test]
    fn quit() {
        let mut dashboard = dashboard(ViewMode::Compact);
        assert_eq!(dashboard.apply(Key::Quit), Transition::Quit);
        assert_eq!(dashboard.state(), DashboardState::default());
    }
}
