use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// The live, append-only text mirror of a message log.
///
/// Every line is flushed as soon as it is written. The first failed write is
/// reported as a warning and switches the journal off.
pub struct Journal {
    sink: Option<Box<dyn Write>>,
}

impl Journal {
    pub fn new(writer: impl Write + 'static) -> Self {
        Self {
            sink: Some(Box::new(writer)),
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn write_line(&mut self, line: &str) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(sink, "{line}").and_then(|_| sink.flush()) {
            warn!(error = %e, "journal write failed; disabling the journal");
            self.sink = None;
        }
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
