//! # rv-media
//!
//! Everything that touches media bytes on disk:
//!
//! - **Range resolution** ([`range`]) -- parse `Range` headers and clamp them
//!   to the per-request chunk cap.
//! - **Bounded bodies** ([`stream`]) -- lazy file streams limited to one byte
//!   window, releasing the handle when dropped.
//! - **Storage layout** ([`storage`]) -- album folders, timestamped file
//!   names, and percent-encoded relative references.
//! - **Upload sink** ([`upload`]) -- streams uploads to disk, verifies them,
//!   and cleans up on failure.
//! - **Post-processing** ([`image`], [`transcode`]) -- lossy WebP re-encoding
//!   and ffmpeg transcoding to MP4.

pub mod image;
pub mod range;
pub mod storage;
pub mod stream;
pub mod transcode;
pub mod upload;

pub use range::{parse_range_header, ByteRange};
pub use storage::Storage;
pub use stream::FileStream;
pub use transcode::{Ffmpeg, ToolCommand, ToolOutput};
pub use upload::{IncomingFile, MediaReference, UploadSink};
