//! splits the sampler's output into complete property-list records.

use std::ops::Deref;


/// a complete record, with every NUL byte removed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawFrame(Vec<u8>);

/// accumulates lines of sampler output until a record is closed.
#[derive(Debug, Default)]
pub struct Framer {
    /// the lines of the record being assembled.
    buf: Vec<u8>,
    /// set once the current record has overflowed; cleared by the next closing tag.
    overflowed: bool,
}

// === impl Framer ===

impl Framer {
    /// the line that closes a record.
    pub const CLOSING_TAG: &[u8] = b"</plist>";

    /// records larger than this are assumed to come from a stalled sampler.
    pub const MAX_FRAME: usize = 8 * 1024 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// feeds one line of output, returning a frame if it closed a record.
    pub fn feed(&mut self, line: &[u8]) -> Option<RawFrame> {
        let Self { buf, overflowed } = self;

        let closes = Self::is_closing(line);

        if !*overflowed {
            buf.extend_from_slice(line);
            if buf.len() > Self::MAX_FRAME {
                log::warn!(
                    "discarding a {} byte record that never closed",
                    buf.len()
                );
                buf.clear();
                buf.shrink_to_fit();
                *overflowed = true;
            }
        }

        if !closes {
            return None;
        }

        if std::mem::take(overflowed) {
            // the tail of a discarded record; start over on the next line.
            return None;
        }

        let mut frame = std::mem::take(buf);
        frame.retain(|b| *b != 0);
        Some(RawFrame(frame))
    }

    /// the number of bytes buffered for the current record.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn is_closing(line: &[u8]) -> bool {
        let start = line.iter().position(|b| *b != 0).unwrap_or(line.len());
        line[start..].starts_with(Self::CLOSING_TAG)
    }
}

// === impl RawFrame ===

impl Deref for RawFrame {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        let Self(bytes) = self;
        bytes
    }
}

impl From<Vec<u8>> for RawFrame {
    fn from(mut bytes: Vec<u8>) -> Self {
        bytes.retain(|b| *b != 0);
        Self(bytes)
    }
}
