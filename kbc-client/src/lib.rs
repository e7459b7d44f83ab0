//! Keboola Storage API client for Rust
//!
//! This crate provides a Rust client for the parts of the Keboola Storage and file import APIs
//! that declarative resources need: uploading files, starting asynchronous table jobs, polling
//! jobs and reading or deleting tables.
//!
//! # Example
//!
//! ```no_run
//! use kbc_client::{KbcClient, StorageApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KbcClient::builder("connection.keboola.com", "your-token").build()?;
//!
//!     let table = client.get_table("in.c-main.orders").await?;
//!     println!("{} has columns {:?}", table.id, table.columns);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod storage_api;

pub use client::{KbcClient, KbcClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use storage_api::StorageApi;

#[cfg(any(test, feature = "test-utils"))]
pub use storage_api::InMemoryStorageApi;
