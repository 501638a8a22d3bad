//! a compact apple silicon performance monitor.

use {
    self::{
        dashboard::{Dashboard, Transition},
        input::{Console, Keyboard},
        memory::MemoryProbe,
        sentinel::{Observation, Sentinel, SentinelError},
        source::{Powermetrics, SampleSource},
        widget::Surface,
        window::Window,
    },
    std::{
        io,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    },
    thiserror::Error,
};

pub mod config;
pub mod dashboard;
pub mod frame;
pub mod humanize;
pub mod input;
pub mod memory;
pub mod meter;
pub mod rolling;
pub mod sample;
pub mod sentinel;
pub mod source;
pub mod topology;
pub mod widget;
pub mod window;

#[cfg(test)]
pub(crate) mod testdata;

/// the dashboard, wired to its inputs and its surface.
pub struct App<S = Powermetrics, K = Console, W = Window> {
    surface: W,
    keyboard: K,
    dashboard: Dashboard,
    sentinel: Sentinel<S>,
    memory: Option<MemoryProbe>,
    /// set from outside to stop the loop.
    stop: Arc<AtomicBool>,
}

/// why [`App::run()`] returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Exit {
    /// the user asked to quit.
    Quit,
    /// the sampler exited.
    Closed,
    /// the stop flag was set, by a signal.
    Interrupted,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sentinel(#[from] SentinelError),
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

// === impl App ===

impl<S: SampleSource, K: Keyboard, W: Surface> App<S, K, W> {
    /// how long to wait for sampler output in each iteration.
    const POLL_TIMEOUT: Duration = Duration::from_millis(100);
    /// how long to sleep after an iteration without output.
    const IDLE_SLEEP: Duration = Duration::from_millis(50);

    /// initializes a new application.
    pub fn new(sentinel: Sentinel<S>, dashboard: Dashboard, keyboard: K, surface: W) -> Self {
        Self {
            surface,
            keyboard,
            dashboard,
            sentinel,
            memory: None,
            stop: Arc::default(),
        }
    }

    /// reads memory usage alongside every batch of samples.
    pub fn with_memory(self, probe: MemoryProbe) -> Self {
        Self {
            memory: Some(probe),
            ..self
        }
    }

    /// a flag that stops the application once set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// runs the application, until the user quits or the sampler exits.
    pub fn run(&mut self) -> Result<Exit, Error> {
        let Self {
            surface,
            keyboard,
            dashboard,
            sentinel,
            memory,
            stop,
        } = self;

        surface.clear()?;
        surface.draw(dashboard.tree())?;

        loop {
            if stop.load(Ordering::Relaxed) {
                log::info!("interrupted");
                return Ok(Exit::Interrupted);
            }

            let mut dirty = false;

            match sentinel.observe(Self::POLL_TIMEOUT)? {
                Observation::Samples(samples) => {
                    let reading = memory.as_mut().map(MemoryProbe::read);
                    for sample in samples {
                        dashboard.ingest(sample, reading.clone());
                    }
                    dirty = true;
                }
                Observation::Partial => {}
                Observation::Idle => {
                    if sentinel.is_waiting() {
                        log::trace!("waiting for the first sample");
                    }
                    std::thread::sleep(Self::IDLE_SLEEP);
                }
                Observation::Closed => {
                    log::info!("powermetrics closed its output");
                    return Ok(Exit::Closed);
                }
            }

            if let Some(key) = keyboard.poll_key()? {
                match dashboard.apply(key) {
                    Transition::Quit => return Ok(Exit::Quit),
                    Transition::Relayout => {
                        surface.clear()?;
                        dirty = true;
                    }
                    Transition::Recolor | Transition::Reset => dirty = true,
                    Transition::None => {}
                }
            }

            if dirty {
                surface.draw(dashboard.tree())?;
            }
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn surface(&self) -> &W {
        &self.surface
    }
}
