pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod workbook;
pub mod writers;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
