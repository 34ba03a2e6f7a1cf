//! Logger setup
//!
//! `env_logger` with an `info` default (overridable through `RUST_LOG`),
//! optionally mirrored into the session log file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::error::{Error, Result};

/// Session log file name inside the output directory
pub const SESSION_LOG_FILE: &str = "experiment_log.txt";

/// Writes every log line to stderr and to a file
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Install the global logger; with `log_path`, lines are also appended to that file
pub fn init(log_path: Option<&Path>) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();

    if let Some(path) = log_path {
        let file = File::create(path).map_err(|source| Error::Export {
            path: path.to_path_buf(),
            source,
        })?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
    }

    builder.try_init()?;
    Ok(())
}
