//! Marginalia Core - Platform-agnostic line annotation library
//!
//! This crate holds the document model (lines plus one optional note per
//! line), the HTML and text codecs, and the session that persists state
//! through a pluggable key-value store. It has no rendering dependency and
//! works both natively and in WASM.

pub mod codec;
pub mod model;
pub mod persist;
pub mod session;

pub use codec::{export_filename, ExportFormat};
pub use model::{Document, LineAction, Mode, DEFAULT_TITLE};
pub use persist::{BlobStore, FileStore, MemoryStore, Snapshot, STORAGE_KEY};
pub use session::Session;
