//! Durable state of a benchmark run: the response cache and the workspace.

pub mod cache;
pub mod error;
pub mod workspace;

pub use cache::ResponseCache;
pub use error::StoreError;
pub use workspace::{FileWrite, Snapshot, Workspace};
