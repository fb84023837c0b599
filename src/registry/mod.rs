//! Model registry: immutable snapshots, their persisted form, and publication.
//!
//! - `snapshot`: the in-memory catalog and lookups
//! - `record`: JSON shapes and validation into runtime types
//! - `file`: registry JSON read/write
//! - `store`: atomic publication and interval refresh

pub mod file;
pub mod record;
pub mod snapshot;
pub mod store;

pub use file::*;
pub use record::*;
pub use snapshot::*;
pub use store::*;
