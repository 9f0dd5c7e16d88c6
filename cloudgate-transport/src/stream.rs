//! Chunked body reading and download-to-file

use std::path::Path;

use bytes::{Bytes, BytesMut};
use futures::Stream;
use log::{debug, warn};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Default chunk size for streamed bodies.
pub const CHUNK_SIZE: usize = 8096;

enum Source {
    Http(reqwest::Response),
    Buffered(Option<Bytes>),
}

impl Source {
    async fn pull(&mut self) -> Result<Option<Bytes>> {
        match self {
            Self::Http(response) => response.chunk().await.map_err(|e| {
                let host = response
                    .url()
                    .host_str()
                    .unwrap_or_default()
                    .to_string();
                if e.is_timeout() {
                    Error::Timeout {
                        host,
                        detail: e.to_string(),
                    }
                } else {
                    Error::Connection {
                        host,
                        detail: format!("Failed to read response body: {e}"),
                    }
                }
            }),
            Self::Buffered(bytes) => Ok(bytes.take()),
        }
    }
}

/// Pull-based, single-pass reader over a response body.
///
/// Yields chunks of exactly `chunk_size` bytes except for the last one, then
/// `Ok(None)` once the body is exhausted. Dropping the reader releases the
/// underlying connection.
pub struct ChunkStream {
    source: Source,
    chunk_size: usize,
    buffer: BytesMut,
    exhausted: bool,
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("chunk_size", &self.chunk_size)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl ChunkStream {
    pub(crate) fn from_response(response: reqwest::Response, chunk_size: usize) -> Self {
        Self::with_source(Source::Http(response), chunk_size)
    }

    /// Chunk an in-memory body.
    pub fn from_bytes(body: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self::with_source(Source::Buffered(Some(body.into())), chunk_size)
    }

    fn with_source(source: Source, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
        Self {
            source,
            chunk_size,
            buffer: BytesMut::with_capacity(chunk_size),
            exhausted: false,
        }
    }

    /// Chunk size this reader yields.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Next chunk, or `None` at end of body.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            if self.buffer.len() >= self.chunk_size {
                return Ok(Some(self.buffer.split_to(self.chunk_size).freeze()));
            }
            if self.exhausted {
                return Ok((!self.buffer.is_empty()).then(|| self.buffer.split().freeze()));
            }
            match self.source.pull().await? {
                Some(bytes) => self.buffer.extend_from_slice(&bytes),
                None => self.exhausted = true,
            }
        }
    }

    /// Adapt into a `futures` stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> {
        futures::stream::try_unfold(self, |mut reader| async move {
            let chunk = reader.next_chunk().await?;
            Ok::<_, Error>(chunk.map(|chunk| (chunk, reader)))
        })
    }
}

/// Options for [`save_to_file`].
#[derive(Debug, Clone, Copy)]
pub struct DownloadOptions {
    /// Replace an existing file at the destination.
    pub overwrite_existing: bool,
    /// Remove the partial file when the transfer fails.
    pub delete_on_failure: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            overwrite_existing: false,
            delete_on_failure: true,
        }
    }
}

/// Drain `chunks` into `file_path`.
///
/// When `expected_size` is given and the written byte count differs, the call
/// fails with [`Error::IncompleteTransfer`]; the partial file is removed unless
/// `delete_on_failure` is off. Returns the number of bytes written.
pub async fn save_to_file(
    mut chunks: ChunkStream,
    file_path: &Path,
    expected_size: Option<u64>,
    options: DownloadOptions,
) -> Result<u64> {
    if !options.overwrite_existing && tokio::fs::try_exists(file_path).await? {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "{} already exists and overwrite_existing is off",
                file_path.display()
            ),
        )));
    }

    let mut file = tokio::fs::File::create(file_path).await?;
    let mut written: u64 = 0;

    let copied: Result<()> = async {
        while let Some(chunk) = chunks.next_chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(())
    }
    .await;
    drop(file);

    let outcome = match (copied, expected_size) {
        (Err(e), _) => Err(e),
        (Ok(()), Some(expected)) if expected != written => {
            Err(Error::IncompleteTransfer { expected, written })
        }
        (Ok(()), _) => Ok(written),
    };

    if let Err(e) = &outcome {
        warn!("Download to {} failed: {e}", file_path.display());
        if options.delete_on_failure {
            if let Err(remove_err) = tokio::fs::remove_file(file_path).await {
                warn!(
                    "Failed to remove partial file {}: {remove_err}",
                    file_path.display()
                );
            }
        }
    } else {
        debug!("Saved {written} bytes to {}", file_path.display());
    }

    outcome
}
