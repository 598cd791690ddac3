//! Per-guild notification settings for the application monitor.
//!
//! Each guild owns exactly one [`GuildConfig`], created lazily with defaults
//! and persisted through a pluggable [`Storage`] backend on every change.

pub mod error;
pub mod storage;
pub mod store;
pub mod types;

pub use {
    error::{Error, Result},
    storage::{FileStorage, MemoryStorage, Storage},
    store::ConfigStore,
    types::{ChannelId, GuildConfig, GuildId, RoleId},
};
