use std::{
    fs, io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;

/// Destination of emitted artifacts. Paths are relative to the sink's root.
pub trait OutputSink {
    fn create_dir(&mut self, path: &Path) -> io::Result<()>;

    fn write(&mut self, path: &Path, text: &str) -> io::Result<()>;
}

/// Writes artifacts below a root directory and records every written path.
#[derive(Clone, Debug)]
pub struct FileSink {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full paths of the files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for FileSink {
    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.root.join(path))
    }

    fn write(&mut self, path: &Path, text: &str) -> io::Result<()> {
        let path = self.root.join(path);
        fs::write(&path, text)?;
        tracing::debug!(path = %path.display(), "written");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps artifacts in memory, in write order.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    files: IndexMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &IndexMap<PathBuf, String> {
        &self.files
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn into_files(self) -> IndexMap<PathBuf, String> {
        self.files
    }
}

impl OutputSink for MemorySink {
    fn create_dir(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn write(&mut self, path: &Path, text: &str) -> io::Result<()> {
        self.files.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}

/// Records the paths that would be written and discards the text.
#[derive(Clone, Debug, Default)]
pub struct DryRunSink {
    paths: Vec<PathBuf>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl OutputSink for DryRunSink {
    fn create_dir(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn write(&mut self, path: &Path, _text: &str) -> io::Result<()> {
        self.paths.push(path.to_path_buf());
        Ok(())
    }
}
