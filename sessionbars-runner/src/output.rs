//! Session file naming, versioning and the CSV file sink.
//!
//! Layout: `<root>/<SYMBOL>/<SYMBOL>_<YYYYMMDD>_v<NNN>.csv`.
//!
//! The version tags the output format. When a session file with the current
//! version exists the session is skipped; files with older versions are
//! replaced once the new file is complete. A newer version on disk is never
//! downgraded.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sessionbars_core::{OutputRow, RowSink};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sink already finished")]
    Finished,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SinkError + '_ {
    move |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn file_stem_prefix(symbol: &str, date: NaiveDate) -> String {
    format!("{symbol}_{}_v", date.format("%Y%m%d"))
}

/// `SYMBOL_YYYYMMDD_vNNN.csv`
pub fn session_file_name(symbol: &str, date: NaiveDate, version: u32) -> String {
    format!("{}{version:03}.csv", file_stem_prefix(symbol, date))
}

pub fn session_path(root: &Path, symbol: &str, date: NaiveDate, version: u32) -> PathBuf {
    root.join(symbol).join(session_file_name(symbol, date, version))
}

/// Every existing file for this session, with its version, sorted by version.
pub fn existing_versions(
    root: &Path,
    symbol: &str,
    date: NaiveDate,
) -> Result<Vec<(u32, PathBuf)>, SinkError> {
    let dir = root.join(symbol);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let prefix = file_stem_prefix(symbol, date);
    let mut found = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(io_err(&dir))? {
        let entry = entry.map_err(io_err(&dir))?;
        let name = entry.file_name();
        let Some(version) = name
            .to_str()
            .and_then(|n| n.strip_prefix(&prefix))
            .and_then(|rest| rest.strip_suffix(".csv"))
            .filter(|digits| digits.len() == 3)
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            continue;
        };
        found.push((version, entry.path()));
    }
    found.sort();
    Ok(found)
}

/// What to do with one session's output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    /// Write `path`, then remove `stale` (older versions).
    Write { path: PathBuf, stale: Vec<PathBuf> },
    /// A file at the current or a newer version exists.
    Skip { existing: PathBuf },
}

pub fn plan_output(
    root: &Path,
    symbol: &str,
    date: NaiveDate,
    version: u32,
) -> Result<OutputPlan, SinkError> {
    let existing = existing_versions(root, symbol, date)?;
    if let Some((_, path)) = existing.iter().rev().find(|(v, _)| *v >= version) {
        return Ok(OutputPlan::Skip {
            existing: path.clone(),
        });
    }
    Ok(OutputPlan::Write {
        path: session_path(root, symbol, date, version),
        stale: existing.into_iter().map(|(_, p)| p).collect(),
    })
}

/// CSV sink that only makes its file visible once complete.
///
/// Rows go to `<path>.tmp`; `finish` flushes and renames it into place.
/// Dropping the sink without finishing deletes the temporary file.
#[derive(Debug)]
pub struct CsvFileSink {
    path: PathBuf,
    tmp_path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows: usize,
}

impl CsvFileSink {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        let file = File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            writer: Some(csv::Writer::from_writer(file)),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<File>, SinkError> {
        self.writer.as_mut().ok_or(SinkError::Finished)
    }
}

impl RowSink for CsvFileSink {
    type Error = SinkError;

    fn write_header(&mut self, header: &[String]) -> Result<(), SinkError> {
        self.writer()?.write_record(header)?;
        Ok(())
    }

    fn write_row(&mut self, row: &OutputRow) -> Result<(), SinkError> {
        self.writer()?.write_record(row.fields())?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<(), SinkError> {
        let mut writer = self.writer.take().ok_or(SinkError::Finished)?;
        writer.flush().map_err(io_err(&self.tmp_path))?;
        drop(writer);
        std::fs::rename(&self.tmp_path, &self.path).map_err(io_err(&self.path))?;
        debug!(path = %self.path.display(), rows = self.rows, "session file written");
        Ok(())
    }
}

impl Drop for CsvFileSink {
    fn drop(&mut self) {
        // Still holding the writer means finish never ran or failed part way.
        if self.writer.take().is_some() || self.tmp_path.exists() {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}
