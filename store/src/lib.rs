//! SQLite-backed persistence for projects, agents, data sources and tasks.
//! One connection behind a `Mutex`, wrapped in `block_in_place` everywhere —
//! this both keeps sqlite's blocking calls off the async scheduler and
//! linearises writes per task (spec.md §5).

mod agents;
mod data_sources;
mod db;
mod error;
mod projects;
mod tasks;

pub use db::Store;
pub use error::StoreError;
pub use tasks::DEFAULT_TASK_PAGE_SIZE;
