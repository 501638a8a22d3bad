use std::{
    collections::VecDeque,
    io::{self, Read},
    os::fd::AsRawFd,
    process::{Child, ChildStdout, Command, Stdio},
    time::Duration,
};

pub use self::{lines::*, powermetrics::*};

/// abstracts over providers of sampler output.
pub trait SampleSource {
    /// waits at most `timeout` for output, returning any complete lines.
    fn poll(&mut self, timeout: Duration) -> io::Result<Poll>;
}

/// the outcome of waiting on a [`SampleSource`].
#[derive(Debug, Eq, PartialEq)]
pub enum Poll {
    /// complete lines, in the order they were written, each including its newline.
    Lines(Vec<Vec<u8>>),
    /// nothing arrived before the timeout, or only part of a line did.
    Idle,
    /// the sampler has exited.
    Closed,
}

// === impl Poll ===

impl Poll {
    fn from_lines(lines: Vec<Vec<u8>>) -> Self {
        if lines.is_empty() {
            Self::Idle
        } else {
            Self::Lines(lines)
        }
    }
}

/// splits a byte stream into lines.
mod lines {
    use {super::*, crate::frame::Framer};

    #[derive(Debug, Default)]
    pub struct LineBuffer {
        /// a line that has not been terminated yet.
        partial: Vec<u8>,
        /// set once the unterminated line has outgrown a frame; cleared by its newline.
        overflowed: bool,
    }

    // === impl LineBuffer ===

    impl LineBuffer {
        /// appends a chunk, returning the lines it completed.
        ///
        /// a line longer than [`Framer::MAX_FRAME`] is discarded.
        pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
            let Self {
                partial,
                overflowed,
            } = self;

            let mut lines = Vec::new();
            let mut rest = chunk;
            while let Some(end) = rest.iter().position(|b| *b == b'\n') {
                let (line, tail) = rest.split_at(end + 1);
                rest = tail;
                if std::mem::take(overflowed) {
                    continue;
                }
                let mut complete = std::mem::take(partial);
                complete.extend_from_slice(line);
                lines.push(complete);
            }

            if !*overflowed {
                if partial.len() + rest.len() > Framer::MAX_FRAME {
                    log::warn!("discarding a line longer than {} bytes", Framer::MAX_FRAME);
                    *partial = Vec::new();
                    *overflowed = true;
                } else {
                    partial.extend_from_slice(rest);
                }
            }

            lines
        }

        /// returns whatever is left over, once the stream has ended.
        pub fn finish(&mut self) -> Option<Vec<u8>> {
            let partial = std::mem::take(&mut self.partial);
            let overflowed = std::mem::take(&mut self.overflowed);
            (!partial.is_empty() && !overflowed).then_some(partial)
        }

        /// the length of the unterminated line held so far.
        pub fn pending(&self) -> usize {
            self.partial.len()
        }
    }
}

/// the `powermetrics` subprocess.
mod powermetrics {
    use super::*;

    /// a running `powermetrics` process, terminated when dropped.
    #[derive(Debug)]
    pub struct Powermetrics {
        child: Child,
        stdout: ChildStdout,
        lines: LineBuffer,
        /// set once the pipe has reached end-of-file.
        closed: bool,
    }

    // === impl Powermetrics ===

    impl Powermetrics {
        /// the samplers whose output is consumed.
        pub const SAMPLERS: &str = "cpu_power,gpu_power,thermal,network,disk";

        const READ_SIZE: usize = 64 * 1024;

        /// the command line used to start the sampler.
        pub fn command(interval: Duration) -> Command {
            let mut command = Command::new("sudo");
            // never prompt once the dashboard owns the terminal; see [`Powermetrics::authorize()`].
            command.arg("-n")
                .args(["nice", "-n", "10", "powermetrics", "--samplers", Self::SAMPLERS])
                .args(["-f", "plist", "-i"])
                .arg(interval.as_millis().to_string());
            command
        }

        /// makes sure `sudo` can start the sampler without asking for a password.
        ///
        /// this prompts on the terminal if needed, so it must run before the terminal is taken
        /// over.
        pub fn authorize() -> io::Result<()> {
            // SAFETY: `geteuid` has no preconditions and cannot fail.
            if unsafe { libc::geteuid() } == 0 {
                return Ok(());
            }

            let mut command = Command::new("sudo");
            command.arg("-v");
            Self::check(command)
        }

        /// runs `command` to completion, failing if it does not succeed.
        pub(super) fn check(mut command: Command) -> io::Result<()> {
            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(io::Error::other(format!("{command:?} failed: {status}")))
            }
        }

        /// starts sampling every `interval`.
        pub fn spawn(interval: Duration) -> io::Result<Self> {
            Self::from_command(Self::command(interval))
        }

        /// starts `command`, reading samples from its standard output.
        pub fn from_command(mut command: Command) -> io::Result<Self> {
            let mut child = command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .spawn()?;
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| io::Error::other("sampler stdout was not captured"))?;

            log::info!("started {:?} (pid {})", command.get_program(), child.id());
            Ok(Self {
                child,
                stdout,
                lines: LineBuffer::default(),
                closed: false,
            })
        }

        /// the process id of the sampler.
        pub fn id(&self) -> u32 {
            self.child.id()
        }

        /// asks the sampler to stop, and waits for it to exit.
        pub fn terminate(&mut self) -> io::Result<()> {
            let Self { child, .. } = self;

            if child.try_wait()?.is_some() {
                return Ok(());
            }

            // NB: `sudo` relays SIGTERM to the sampler, but would not relay SIGKILL.
            let pid = libc::pid_t::try_from(child.id()).map_err(io::Error::other)?;
            // SAFETY: the pid belongs to a child that has not been reaped yet.
            if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
                let error = io::Error::last_os_error();
                log::warn!("could not signal powermetrics: {error}");
                child.kill()?;
            }

            let status = child.wait()?;
            log::info!("powermetrics exited: {status}");
            Ok(())
        }

        /// waits for the pipe to become readable. returns false on timeout.
        fn readable(&self, timeout: Duration) -> io::Result<bool> {
            let mut fds = libc::pollfd {
                fd: self.stdout.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            let timeout = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

            // SAFETY: `fds` is a single, valid pollfd that outlives the call.
            match unsafe { libc::poll(&mut fds, 1, timeout) } {
                0 => Ok(false),
                n if n > 0 => Ok(true),
                _ => match io::Error::last_os_error() {
                    error if error.kind() == io::ErrorKind::Interrupted => Ok(false),
                    error => Err(error),
                },
            }
        }
    }

    impl SampleSource for Powermetrics {
        fn poll(&mut self, timeout: Duration) -> io::Result<Poll> {
            if self.closed {
                return Ok(Poll::Closed);
            }

            if !self.readable(timeout)? {
                return match self.child.try_wait()? {
                    Some(status) => {
                        log::info!("powermetrics exited: {status}");
                        self.closed = true;
                        Ok(Poll::Closed)
                    }
                    None => Ok(Poll::Idle),
                };
            }

            let mut chunk = vec![0; Self::READ_SIZE];
            let n = match self.stdout.read(&mut chunk) {
                Ok(n) => n,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => return Ok(Poll::Idle),
                Err(error) => return Err(error),
            };

            if n == 0 {
                // hand over a trailing line without a newline, the sampler may not write one.
                self.closed = true;
                return Ok(match self.lines.finish() {
                    Some(line) => Poll::Lines(vec![line]),
                    None => Poll::Closed,
                });
            }

            Ok(Poll::from_lines(self.lines.push(&chunk[..n])))
        }
    }

    impl Drop for Powermetrics {
        fn drop(&mut self) {
            if let Err(error) = self.terminate() {
                log::error!("failed to stop powermetrics: {error}");
            }
        }
    }
}

/// a scripted source of sampler output.
#[derive(Debug, Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockSource {
    /// chunks of output, delivered one per poll. `None` is an idle poll.
    chunks: VecDeque<Option<Vec<u8>>>,
    lines: LineBuffer,
}

// === impl MockSource ===

#[allow(dead_code, reason = "this is a testing utility.")]
impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// queues a chunk of output.
    pub fn chunk(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.chunks.push_back(Some(bytes.as_ref().to_vec()));
        self
    }

    /// queues a poll that times out.
    pub fn idle(mut self) -> Self {
        self.chunks.push_back(None);
        self
    }
}

impl SampleSource for MockSource {
    fn poll(&mut self, _: Duration) -> io::Result<Poll> {
        let Self { chunks, lines } = self;

        match chunks.pop_front() {
            Some(Some(chunk)) => Ok(Poll::from_lines(lines.push(&chunk))),
            Some(None) => Ok(Poll::Idle),
            None => Ok(lines.finish().map_or(Poll::Closed, |line| Poll::Lines(vec![line]))),
        }
    }
}
