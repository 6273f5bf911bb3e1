//! Bounded, lazy file bodies.
//!
//! A [`FileStream`] reads one byte window of a file in fixed-size chunks.
//! It owns the file handle, so dropping the stream (body finished, client
//! gone, or send error) closes the file.

use std::io::SeekFrom;
use std::path::Path;

use rv_core::{Error, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use crate::range::ByteRange;

/// Chunked stream over `[start, end]` of a file.
pub type FileStream = ReaderStream<Take<File>>;

/// Open a stream over the whole file of `size` bytes.
pub async fn open_full(path: &Path, size: u64, read_buffer: usize) -> Result<FileStream> {
    let file = open(path).await?;
    Ok(ReaderStream::with_capacity(file.take(size), read_buffer.max(1)))
}

/// Open a stream over exactly the bytes of `range`.
pub async fn open_range(path: &Path, range: &ByteRange, read_buffer: usize) -> Result<FileStream> {
    let mut file = open(path).await?;
    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(|e| Error::Internal(format!("Seek failed: {e}")))?;
    Ok(ReaderStream::with_capacity(
        file.take(range.len()),
        read_buffer.max(1),
    ))
}

async fn open(path: &Path) -> Result<File> {
    File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found("file", path.display())
        } else {
            Error::from(e)
        }
    })
}
