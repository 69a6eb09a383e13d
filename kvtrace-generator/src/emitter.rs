//! Writing trace records to an output sink.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::record::Record;

/// Writes records to a sink, one line each, in emission order.
#[derive(Debug)]
pub struct Emitter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> Emitter<W> {
    /// Creates an emitter writing to `writer`.
    ///
    /// The writer is used as is. Wrap files in a [`BufWriter`] or use [`TraceFile`].
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Appends one record as a newline-terminated line.
    pub fn emit(&mut self, record: &Record) -> io::Result<()> {
        writeln!(self.writer, "{record}")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records emitted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes the sink and returns it.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// A trace file that only appears under its final name once it is complete.
///
/// Records are written to a temporary file next to the destination. [`commit`](Self::commit)
/// flushes it and renames it into place. Dropping an uncommitted `TraceFile`, for example when
/// generation fails or is cancelled, deletes the temporary file, so consumers never observe a
/// truncated trace.
#[derive(Debug)]
pub struct TraceFile {
    path: PathBuf,
    emitter: Emitter<BufWriter<NamedTempFile>>,
}

impl TraceFile {
    /// Prepares a trace file at `path`, creating parent directories as needed.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let temp = NamedTempFile::new_in(dir)?;
        tracing::trace!(path = %path.display(), temp = %temp.path().display(), "opened trace file");

        Ok(Self {
            path,
            emitter: Emitter::new(BufWriter::new(temp)),
        })
    }

    /// The final path of the trace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The emitter writing into this file.
    pub fn emitter(&mut self) -> &mut Emitter<BufWriter<NamedTempFile>> {
        &mut self.emitter
    }

    /// Flushes all records to disk and moves the file to its final path.
    ///
    /// An existing file at the destination is replaced.
    pub fn commit(self) -> io::Result<File> {
        let temp = self.emitter.finish()?.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_data()?;

        let file = temp.persist(&self.path).map_err(|e| e.error)?;
        tracing::debug!(path = %self.path.display(), "committed trace file");
        Ok(file)
    }
}
