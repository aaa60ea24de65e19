use anyhow::anyhow;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// Destination for the files a run writes, keyed by location (e.g. "results", "summary").
pub trait OutputWriter: Debug + Sync + Send {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write>;
    /// Whether nothing written is kept, so that callers can skip producing output.
    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FileOutputWriter {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutputWriter {
    /// `file_template` takes the location key and file extension, e.g. "{}.{}" or
    /// "project_a__{}.{}".
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    fn file_path(&self, location_key: &str, file_extension: &str) -> anyhow::Result<PathBuf> {
        let file_name = formatx!(&self.file_template, location_key, file_extension)
            .map_err(|err| anyhow!("output file template could not be applied: {err:?}"))?;
        Ok(self.directory_path.join(file_name))
    }
}

impl OutputWriter for FileOutputWriter {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let path = self.file_path(location_key, file_extension)?;
        debug!("opening output file {path:?}");
        Ok(BufWriter::new(File::create(path)?))
    }
}

/// Discards everything written to it.
#[derive(Debug, Default)]
pub struct SinkOutputWriter;

impl OutputWriter for SinkOutputWriter {
    fn writer_for_location_key(
        &self,
        _location_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}
