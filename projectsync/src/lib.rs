//! C2: keeps a worker's local filesystem in sync with a project's object
//! store artifacts, and resolves the per-invocation credential set the
//! reasoning graph runs with (spec.md §4.2).

mod credentials;
mod sync;

pub use credentials::{resolve_credentials, CredentialSet};
pub use sync::{sync_project, SyncError, SyncReport};
