//! Routes `tracing` output into the Debug Log window.
//!
//! The subscriber is installed before the terminal enters raw mode, so any
//! event emitted before the log window exists goes to stderr instead.
use std::io::{self, Write};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::uptime;

use crate::components::debug_log::{DebugLogWriter, global_debug_log};

/// Where one formatted event ends up.
pub enum SinkWriter {
    Window(DebugLogWriter),
    Stderr(io::Stderr),
}

impl SinkWriter {
    fn current() -> Self {
        global_debug_log()
            .map(|handle| Self::Window(handle.writer()))
            .unwrap_or_else(|| Self::Stderr(io::stderr()))
    }

    fn inner(&mut self) -> &mut dyn Write {
        match self {
            Self::Window(w) => w,
            Self::Stderr(s) => s,
        }
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner().flush()
    }
}

/// `MakeWriter` that looks up the log window for every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeskLogSink;

impl<'a> MakeWriter<'a> for DeskLogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter::current()
    }
}

/// Install the global subscriber at `level`. Returns `false` when one was
/// already installed.
pub fn init_default(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(DeskLogSink)
        .with_timer(uptime())
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
