//! Chunked file transfer to `print/docpart` and `print/attpart`.
//!
//! A file goes out as consecutive parts of at most `chunk_size` bytes. The
//! body of each part is the raw chunk; position, total size and file identity
//! travel in `hpod-*` headers so the service can check completeness no matter
//! how many parts it sees.

use std::path::Path;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::error::TransferError;
use crate::hpod::{ApiCall, ApiExecutor, TransportError};
use crate::progress::ProgressSink;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;

const PART_HEADER: &str = "hpod-part";
const TOTAL_SIZE_HEADER: &str = "hpod-totalsize";
const FILE_TYPE_HEADER: &str = "hpod-filetype";
const FILE_INDEX_HEADER: &str = "hpod-fileindex";
const FILE_NAME_HEADER: &str = "hpod-filename";

/// One chunk of a file plus the metadata the service needs to place it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_index: u32,
    pub part_index: u32,
    pub payload: Vec<u8>,
    pub total_size: u64,
    pub extension: String,
    pub file_name: String,
}

impl FilePart {
    /// Session headers plus the part's metadata headers.
    pub fn headers(&self, session_headers: &HeaderMap) -> Result<HeaderMap, TransportError> {
        let mut headers = session_headers.clone();
        let fields = [
            (PART_HEADER, self.part_index.to_string()),
            (TOTAL_SIZE_HEADER, self.total_size.to_string()),
            (FILE_TYPE_HEADER, self.extension.clone()),
            (FILE_INDEX_HEADER, self.file_index.to_string()),
            (FILE_NAME_HEADER, self.file_name.clone()),
        ];
        for (name, value) in fields {
            let value = HeaderValue::from_str(&value).map_err(|e| TransportError::InvalidHeader {
                name,
                reason: e.to_string(),
            })?;
            headers.insert(HeaderName::from_static(name), value);
        }
        Ok(headers)
    }

    fn into_call(self, endpoint: &str, session_headers: &HeaderMap) -> Result<ApiCall, TransportError> {
        let headers = self.headers(session_headers)?;
        Ok(ApiCall::post_bytes(endpoint, headers, self.payload))
    }
}

/// Streams files part by part through an [`ApiExecutor`].
#[derive(Debug, Clone)]
pub struct ChunkedFileSender {
    chunk_size: usize,
}

impl Default for ChunkedFileSender {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedFileSender {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Sends the whole of `path` to `endpoint` as file number `file_index`.
    ///
    /// Stops at the first part the service does not accept. Returns the number
    /// of bytes sent, which always equals the file's size on success.
    pub async fn send_file(
        &self,
        executor: &impl ApiExecutor,
        session_headers: &HeaderMap,
        endpoint: &str,
        path: &Path,
        file_index: u32,
        progress: &dyn ProgressSink,
    ) -> Result<u64, TransferError> {
        let io_error = |source| TransferError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut file = File::open(path).await.map_err(io_error)?;
        let total_size = file.metadata().await.map_err(io_error)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        progress.file_started(file_index, path, total_size);
        debug!(path = %path.display(), endpoint, file_index, total_size, "starting transfer");

        let mut buffer = vec![0u8; self.chunk_size];
        let mut sent: u64 = 0;
        let mut part_index: u32 = 0;

        while sent < total_size {
            // Never read past the size announced in the headers.
            let remaining = usize::try_from(total_size - sent).unwrap_or(usize::MAX);
            let want = remaining.min(self.chunk_size);
            let read = fill_chunk(&mut file, &mut buffer[..want])
                .await
                .map_err(io_error)?;
            if read == 0 {
                return Err(TransferError::Truncated {
                    path: path.display().to_string(),
                    read: sent,
                    expected: total_size,
                });
            }

            let part = FilePart {
                file_index,
                part_index,
                payload: buffer[..read].to_vec(),
                total_size,
                extension: extension.clone(),
                file_name: file_name.clone(),
            };
            let result = executor
                .execute(part.into_call(endpoint, session_headers)?)
                .await?;
            if !result.is_success() {
                return Err(TransferError::PartRejected {
                    endpoint: endpoint.to_string(),
                    part_index,
                    status: result.code(),
                    body: result.body,
                });
            }

            sent += read as u64;
            debug!(file_index, part_index, bytes = read, sent, total_size, "part accepted");
            progress.part_sent(file_index, sent, total_size);
            part_index += 1;
        }

        Ok(sent)
    }
}

/// Reads until `buf` is full or the source is exhausted.
async fn fill_chunk<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
