use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::trace::trace::TraceEvent;

/// Decision trace sink for picker runs.
///
/// Every pick phase becomes one JSON line. A file that cannot be opened
/// disables the sink with a warning, and a failed write drops that event;
/// a pick never fails because of its trace.
pub struct TraceLogger {
    sink: Option<Sink>,
}

struct Sink {
    path: String,
    writer: Mutex<BufWriter<File>>,
    written: AtomicU64,
}

impl TraceLogger {
    /// Append to `path`, or discard events when no path is configured.
    pub fn open(path: Option<&str>) -> Self {
        match path {
            Some(path) => Self::new(path),
            None => Self::disabled(),
        }
    }

    pub fn new(path: &str) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                sink: Some(Sink {
                    path: path.to_string(),
                    writer: Mutex::new(BufWriter::new(file)),
                    written: AtomicU64::new(0),
                }),
            },
            Err(e) => {
                warn!(path, error = %e, "could not open trace file, trace disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Events written so far.
    pub fn written(&self) -> u64 {
        self.sink
            .as_ref()
            .map_or(0, |sink| sink.written.load(Ordering::Relaxed))
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        let Ok(mut writer) = sink.writer.lock() else {
            warn!(path = %sink.path, "trace writer lock poisoned");
            return;
        };

        // Flushed per line so a crashed run still leaves a readable trace.
        let result = serde_json::to_writer(&mut *writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());

        match result {
            Ok(()) => {
                sink.written.fetch_add(1, Ordering::Relaxed);
                debug!(step = event.step, phase = %event.phase, "trace event written");
            }
            Err(e) => warn!(path = %sink.path, error = %e, "failed to write trace event"),
        }
    }
}
