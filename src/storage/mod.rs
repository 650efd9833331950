// file: src/storage/mod.rs
// description: object storage, artifact codec and run lock exports
// reference: internal module structure

pub mod artifact;
pub mod lock;
pub mod object_store;

pub use artifact::{ArtifactRef, read_artifact, write_artifact};
pub use lock::RunLock;
pub use object_store::{LocalObjectStore, MemoryObjectStore, ObjectStore};
