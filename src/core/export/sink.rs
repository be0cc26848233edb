//! Artifact sinks
//!
//! [`FileSink`] stores each artifact under the output directory; [`DiscardSink`] reads
//! the stream and only counts bytes. File writes go to `<name>.part` and are renamed on
//! commit, so a final name only ever holds a complete artifact.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a committed artifact amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReceipt {
    pub bytes: u64,
    /// Final path when stored; `None` in discard mode
    pub path: Option<PathBuf>,
}

/// Destination for artifact bytes
#[async_trait]
pub trait Sink: Send + Sync {
    /// Open a writer for one artifact
    async fn begin(&self, name: &str) -> Result<Box<dyn SinkWriter>, SinkError>;

    /// Whether committed artifacts end up on disk
    fn stores(&self) -> bool;
}

#[async_trait]
pub trait SinkWriter: Send {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError>;

    /// Finish the artifact
    async fn commit(&mut self) -> Result<ArtifactReceipt, SinkError>;

    /// Drop everything written so far
    async fn abort(&mut self);
}

/// Stores artifacts in a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn begin(&self, name: &str) -> Result<Box<dyn SinkWriter>, SinkError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SinkError::io(&self.dir, e))?;

        let final_path = self.dir.join(name);
        let part_path = self.dir.join(format!("{name}.part"));
        let file = File::create(&part_path)
            .await
            .map_err(|e| SinkError::io(&part_path, e))?;

        Ok(Box::new(FileWriter {
            file: Some(BufWriter::new(file)),
            part_path,
            final_path,
            bytes: 0,
        }))
    }

    fn stores(&self) -> bool {
        true
    }
}

struct FileWriter {
    file: Option<BufWriter<File>>,
    part_path: PathBuf,
    final_path: PathBuf,
    bytes: u64,
}

#[async_trait]
impl SinkWriter for FileWriter {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        let file = self.file.as_mut().ok_or_else(|| {
            SinkError::io(
                &self.part_path,
                std::io::Error::new(std::io::ErrorKind::Other, "writer already closed"),
            )
        })?;
        file.write_all(chunk)
            .await
            .map_err(|e| SinkError::io(&self.part_path, e))?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    async fn commit(&mut self) -> Result<ArtifactReceipt, SinkError> {
        let mut file = self.file.take().ok_or_else(|| {
            SinkError::io(
                &self.part_path,
                std::io::Error::new(std::io::ErrorKind::Other, "writer already closed"),
            )
        })?;

        let finished = async {
            file.flush().await?;
            file.get_mut().sync_all().await?;
            drop(file);
            tokio::fs::rename(&self.part_path, &self.final_path).await
        }
        .await;

        if let Err(e) = finished {
            let _ = tokio::fs::remove_file(&self.part_path).await;
            return Err(SinkError::io(&self.final_path, e));
        }

        Ok(ArtifactReceipt {
            bytes: self.bytes,
            path: Some(self.final_path.clone()),
        })
    }

    async fn abort(&mut self) {
        if self.file.take().is_some() {
            if let Err(e) = tokio::fs::remove_file(&self.part_path).await {
                tracing::debug!(
                    path = %self.part_path.display(),
                    error = %e,
                    "Failed to remove partial artifact"
                );
            }
        }
        self.bytes = 0;
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        // Dropped mid-write, e.g. a cancelled task
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.part_path);
        }
    }
}

/// Reads artifacts without persisting them
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

#[async_trait]
impl Sink for DiscardSink {
    async fn begin(&self, _name: &str) -> Result<Box<dyn SinkWriter>, SinkError> {
        Ok(Box::new(DiscardWriter { bytes: 0 }))
    }

    fn stores(&self) -> bool {
        false
    }
}

struct DiscardWriter {
    bytes: u64,
}

#[async_trait]
impl SinkWriter for DiscardWriter {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    async fn commit(&mut self) -> Result<ArtifactReceipt, SinkError> {
        Ok(ArtifactReceipt {
            bytes: self.bytes,
            path: None,
        })
    }

    async fn abort(&mut self) {
        self.bytes = 0;
    }
}
