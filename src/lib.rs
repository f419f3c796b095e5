//! couchdriver: Rust client SDK for CouchDB
//!
//! A blocking HTTP client for the CouchDB REST API: databases, documents,
//! design documents, views and Mango `_find` queries.
//!
//! # Example
//!
//! ```no_run
//! use couchdriver::query::{field, and, FindOptions, ViewOptions};
//! use couchdriver::{Config, CouchClient};
//!
//! fn main() -> couchdriver::Result<()> {
//!     // Connect and load server metadata
//!     let mut client = CouchClient::connect(Config::from_env()?)?;
//!     println!("CouchDB {}", client.server_info().version);
//!
//!     // Select a database
//!     let info = client.use_database("questdb")?;
//!     println!("{} holds {} documents", info.name, info.doc_count);
//!
//!     // Query a view
//!     let view = client.query_view("test", "all_user_view", &ViewOptions::new().include_docs(true))?;
//!     println!("{} rows", view.rows.len());
//!
//!     // Run a Mango query
//!     let found = client.find(
//!         &FindOptions::new()
//!             .selector(and(vec![field("credits").lt(666), field("type").eq("user")]))
//!             .limit(3),
//!     )?;
//!     println!("Found: {:?}", found.docs);
//!
//!     Ok(())
//! }
//! ```

mod client;
pub mod config;
mod error;
pub mod models;
pub mod protocol;
pub mod query;

pub use client::{validate_database_name, CouchClient, IdSource};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use models::User;
pub use protocol::{
  Cluster, DatabaseInfo, DatabaseProps, DesignDocument, DesignDocumentInfo, Document,
  FindResponse, ServerInfo, Sizes, UpdatesPending, Vendor, ViewDefinition, ViewIndex, ViewResult,
  ViewRow, WriteResponse,
};
pub use query::{FindOptions, SortDir, UpdateMode, ViewOptions};
