//! a compact apple silicon performance monitor.

use {
    anyhow::Context,
    clap::Parser,
    siltop::{
        App, Exit,
        config::Config,
        dashboard::Dashboard,
        input::Console,
        memory::MemoryProbe,
        sentinel::Sentinel,
        source::Powermetrics,
        topology::Topology,
        window::Window,
    },
    std::sync::atomic::Ordering,
};

fn main() -> anyhow::Result<()> {
    // logs go to stderr; redirect it to keep the dashboard clean.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let config = Config::parse();
    log::debug!("{config:?}");

    println!("[1/3] resolving processor topology");
    let topology = Topology::resolve().context("could not determine the processor topology")?;
    log::info!("{topology:?}");

    println!("[2/3] starting powermetrics");
    Powermetrics::authorize().context("powermetrics needs root, and sudo was refused")?;
    let source = Powermetrics::spawn(config.interval()).context("could not start powermetrics")?;

    println!("[3/3] waiting for first reading...");
    let sentinel = Sentinel::new(source, topology.clone(), config.interval());
    let dashboard = Dashboard::new(topology, config.state(), config.window_len());
    let window = Window::open().context("could not set up the terminal")?;

    let mut app = App::new(sentinel, dashboard, Console, window).with_memory(MemoryProbe::new());
    let stop = app.stop_handle();
    ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
        .context("could not install a signal handler")?;

    let exit = app.run();
    // restores the terminal, and stops powermetrics.
    drop(app);

    match exit.context("the dashboard failed")? {
        Exit::Closed => println!("powermetrics exited"),
        Exit::Quit | Exit::Interrupted => println!("stopped"),
    }

    Ok(())
}
