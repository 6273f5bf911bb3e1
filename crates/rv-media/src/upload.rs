//! The streaming upload sink.
//!
//! Every upload walks `Idle -> DirectoryEnsured -> Writing -> Verifying ->
//! Done`. The [`UploadSession`] carries the one destination path through
//! those states, and its `Drop` is the single cleanup step: if the session
//! ends anywhere short of `Done` (error, panic, or the request future being
//! dropped mid-stream) the file at the destination is removed.
//!
//! Destinations are claimed with `create_new`, so a cleanup can only ever
//! remove a file this session created.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use rv_core::config::UploadConfig;
use rv_core::{mime_for_extension, mime_for_path, Error, MediaKind, Result};
use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::image::reencode_to_webp;
use crate::storage::{self, Storage};
use crate::transcode::Ffmpeg;

/// How many successive timestamps to try before giving up on a free name.
const MAX_NAME_ATTEMPTS: i64 = 16;

/// An incoming file body plus the name the client gave it.
pub struct IncomingFile<S> {
    pub file_name: Option<String>,
    pub stream: S,
}

impl<S> IncomingFile<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            file_name: None,
            stream,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// A fully written and verified media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaReference {
    /// Percent-encoded path relative to the storage root.
    pub path: String,
    pub kind: MediaKind,
    pub mime: &'static str,
    pub size: u64,
}

#[derive(Debug)]
enum UploadState {
    Idle,
    DirectoryEnsured { dir: PathBuf },
    Writing { dest: PathBuf },
    Verifying { dest: PathBuf },
    Done,
}

impl UploadState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DirectoryEnsured { .. } => "directory_ensured",
            Self::Writing { .. } => "writing",
            Self::Verifying { .. } => "verifying",
            Self::Done => "done",
        }
    }

    /// The directory or file this state refers to, if any.
    fn path(&self) -> Option<&Path> {
        match self {
            Self::DirectoryEnsured { dir } => Some(dir),
            Self::Writing { dest } | Self::Verifying { dest } => Some(dest),
            Self::Idle | Self::Done => None,
        }
    }
}

/// Per-call upload state.
#[derive(Debug)]
struct UploadSession {
    state: UploadState,
    bytes_written: u64,
}

impl UploadSession {
    fn new() -> Self {
        Self {
            state: UploadState::Idle,
            bytes_written: 0,
        }
    }

    fn advance(&mut self, next: UploadState) {
        tracing::trace!(
            from = self.state.name(),
            to = next.name(),
            path = ?next.path(),
            "Upload state"
        );
        self.state = next;
    }

    /// The file to remove if the session ends early. A bare directory is
    /// left in place; other uploads may share it.
    fn destination(&self) -> Option<&Path> {
        match &self.state {
            UploadState::Writing { dest } | UploadState::Verifying { dest } => Some(dest),
            _ => None,
        }
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        let Some(dest) = self.destination() else {
            return;
        };
        match std::fs::remove_file(dest) {
            Ok(()) => tracing::info!(
                "Removed incomplete upload {} ({} bytes written)",
                dest.display(),
                self.bytes_written
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove incomplete upload {}: {e}",
                dest.display()
            ),
        }
    }
}

/// Writes uploads under the storage root.
#[derive(Debug, Clone)]
pub struct UploadSink {
    storage: Storage,
    settings: UploadConfig,
    ffmpeg: Option<Ffmpeg>,
}

impl UploadSink {
    pub fn new(storage: Storage, settings: UploadConfig) -> Self {
        Self {
            storage,
            settings,
            ffmpeg: None,
        }
    }

    /// Enable transcoding of non-MP4 video through `ffmpeg`.
    pub fn with_ffmpeg(mut self, ffmpeg: Option<Ffmpeg>) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Stream `incoming` into `folder` as a new `kind` file.
    ///
    /// Video is piped chunk by chunk with a fixed-size write buffer; photos
    /// are buffered, decoded, and re-encoded as lossy WebP. The returned
    /// reference points at a file that exists and is non-empty.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyWrite`] when the written file has zero bytes.
    /// - [`Error::WriteVerification`] when the file is gone after writing.
    /// - [`Error::Image`] for undecodable photos, [`Error::Tool`] when
    ///   transcoding fails, [`Error::Io`] for stream or disk failures.
    ///
    /// On every error the partially written file has been removed.
    pub async fn upload<S>(
        &self,
        folder: &str,
        incoming: IncomingFile<S>,
        kind: MediaKind,
    ) -> Result<MediaReference>
    where
        S: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let result = self.run(folder, incoming, kind).await;
        if let Err(e) = &result {
            tracing::warn!(folder, %kind, "Upload failed: {e}");
        }
        result
    }

    async fn run<S>(
        &self,
        folder: &str,
        incoming: IncomingFile<S>,
        kind: MediaKind,
    ) -> Result<MediaReference>
    where
        S: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let mut session = UploadSession::new();

        let dir = self.storage.album_dir(folder)?;
        tokio::fs::create_dir_all(&dir).await?;
        session.advance(UploadState::DirectoryEnsured { dir: dir.clone() });

        let (dest, file) = claim_destination(&dir, kind).await?;
        session.advance(UploadState::Writing { dest: dest.clone() });

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let reference = Storage::reference_for(folder, &file_name);

        match kind {
            MediaKind::Video => self.write_video(&mut session, &dir, &dest, file, incoming).await?,
            MediaKind::Photo => self.write_photo(&mut session, file, incoming).await?,
        }

        session.advance(UploadState::Verifying { dest: dest.clone() });
        let size = verify(&dest, &reference).await?;

        session.advance(UploadState::Done);
        tracing::info!(
            "Stored {kind} upload {} ({size} bytes)",
            dest.display()
        );

        Ok(MediaReference {
            path: reference,
            kind,
            mime: mime_for_path(&dest),
            size,
        })
    }

    async fn write_video<S>(
        &self,
        session: &mut UploadSession,
        dir: &Path,
        dest: &Path,
        file: File,
        incoming: IncomingFile<S>,
    ) -> Result<()>
    where
        S: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let source_ext = incoming
            .file_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let ffmpeg = match (&self.ffmpeg, source_ext.as_deref()) {
            (Some(ffmpeg), Some(ext)) if self.settings.transcode_video && needs_transcode(ext) => {
                ffmpeg
            }
            _ => {
                session.bytes_written =
                    pipe(incoming.stream, file, self.settings.write_buffer_bytes).await?;
                return Ok(());
            }
        };

        // the staging file removes itself when dropped
        let staging = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(&format!(".{}", source_ext.as_deref().unwrap_or("bin")))
            .tempfile_in(dir)?;
        let staging_file = File::from_std(staging.reopen()?);

        session.bytes_written =
            pipe(incoming.stream, staging_file, self.settings.write_buffer_bytes).await?;
        drop(file);

        if session.bytes_written == 0 {
            return Ok(());
        }
        ffmpeg.transcode_to_mp4(staging.path(), dest).await
    }

    async fn write_photo<S>(
        &self,
        session: &mut UploadSession,
        mut file: File,
        mut incoming: IncomingFile<S>,
    ) -> Result<()>
    where
        S: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        let mut buffer = Vec::new();
        while let Some(chunk) = incoming.stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        if buffer.is_empty() {
            return Ok(());
        }

        let quality = self.settings.effective_photo_quality();
        let encoded = tokio::task::spawn_blocking(move || reencode_to_webp(&buffer, quality))
            .await
            .map_err(|e| Error::Internal(format!("image encode task failed: {e}")))??;

        file.write_all(&encoded).await?;
        file.flush().await?;
        file.sync_all().await?;
        session.bytes_written = encoded.len() as u64;
        Ok(())
    }

    /// Copy an existing image into `folder` as the album thumbnail and
    /// return its stored reference.
    pub async fn import_thumbnail(&self, folder: &str, source: &Path) -> Result<String> {
        let dir = self.storage.album_dir(folder)?;
        tokio::fs::create_dir_all(&dir).await?;

        let original = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = storage::thumbnail_file_name(&original, storage::now_millis());

        tokio::fs::copy(source, dir.join(&name)).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::not_found("file", source.display())
            } else {
                Error::from(e)
            }
        })?;

        Ok(Storage::reference_for(folder, &name))
    }
}

/// Whether a video with extension `ext` must be converted to be served as MP4.
pub fn needs_transcode(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    rv_core::is_video_mime(mime_for_extension(&ext)) && ext != "mp4" && ext != "m4v"
}

/// Create a fresh `<prefix>_<millis>.<ext>` file in `dir`, stepping the
/// timestamp forward if a name is already taken.
async fn claim_destination(dir: &Path, kind: MediaKind) -> Result<(PathBuf, File)> {
    let base = storage::now_millis();
    for offset in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(storage::media_file_name(kind, base + offset));
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::Internal(format!(
        "no free {kind} file name in {} after {MAX_NAME_ATTEMPTS} attempts",
        dir.display()
    )))
}

/// Copy `stream` into `file` through a buffer of `buffer_bytes`, then sync.
async fn pipe<S>(mut stream: S, file: File, buffer_bytes: usize) -> Result<u64>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let mut writer = BufWriter::with_capacity(buffer_bytes.max(8 * 1024), file);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(written)
}

async fn verify(dest: &Path, reference: &str) -> Result<u64> {
    match tokio::fs::metadata(dest).await {
        Ok(meta) if meta.len() == 0 => Err(Error::EmptyWrite {
            path: reference.to_string(),
        }),
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::write_verification(
            reference,
            "file missing after write",
        )),
        Err(e) => Err(e.into()),
    }
}
