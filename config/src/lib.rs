//! Resolves the typed settings `broker` and `worker` need from three layers,
//! highest priority first: the process environment, a project `.env` file,
//! then `$XDG_CONFIG_HOME/<app>/config.toml`'s `[env]` table.
//!
//! The merge mutates `std::env` rather than staying local to the returned
//! [`Settings`] value, because keys outside the typed surface still need to
//! see it: `projectsync`'s `{PROJECT}_{TYPE}_{FIELD}` credential variables
//! are read directly from the process environment at dispatch time, and so
//! are `BROKER_DB`/`WORKER_DB`/`BROKER_ADDR` in the `broker`/`worker`
//! binaries.

mod env_layers;
mod settings;

pub use settings::{ObjectStoreSettings, QueueSettings, Settings, SettingsError};
