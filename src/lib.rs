pub mod config;
pub mod core;
pub mod domain;
pub mod store;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use config::SyncConfig;
pub use core::fetcher::CatalogClient;
pub use core::sync::{ServiceImporter, SyncMode, SyncReport};
pub use store::{MemoryStore, MongoStore};
pub use utils::error::{Result, SyncError};
