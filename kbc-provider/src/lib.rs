//! Keboola Storage resources for declarative infrastructure providers.
//!
//! The provider runtime owns the resource lifecycle and persists [`TableState`]; this crate
//! turns each lifecycle call into Storage API requests through an injected [`StorageApi`]
//! client.
//!
//! # Example
//!
//! ```no_run
//! use kbc_client::KbcClient;
//! use kbc_provider::{TableResource, TableSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KbcClient::builder("connection.keboola.com", "your-token").build()?;
//!     let tables = TableResource::new(&client);
//!
//!     let spec = TableSpec::new("in.c-main", "orders").with_columns(["id", "amount"]);
//!     let mut state = tables.create(spec).await?;
//!     tables.delete(&mut state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod poll;
pub mod schema;
pub mod state;
pub mod table;

pub use error::{ResourceError, Result};
pub use kbc_client::StorageApi;
pub use poll::{wait_for_job, JobPollPolicy};
pub use schema::{FieldSchema, FieldType, ResourceSchema};
pub use state::{TableSpec, TableState};
pub use table::TableResource;
