//! # souk
//!
//! A small marketplace backend over flat-file JSON collections.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! Collections (`listings`, `mints`, `tradeHistory`, `escrows`, `tents`) are
//! JSON-array files on disk, read and rewritten in full on every mutation.
//! That is the whole storage story: no database, no transactions, no
//! indexes. Two requests racing to mutate one collection can lose an update
//! — acceptable because collections are small and traffic is low, and
//! stated here so nobody mistakes it for a bug.
//!
//! What souk does own:
//!
//! - **Routing** — ordered first-match dispatch over `:name` patterns
//! - **Body decoding** — capped, optional JSON payloads for mutating methods
//! - **The front door** — permissive CORS, preflight, and a uniform
//!   `{"status":"error","message":…}` envelope for every failure
//! - **Graceful shutdown** — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use souk::{CollectionStore, Server, marketplace};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(CollectionStore::new("data"));
//!     store.ensure_files().await.expect("seed collections");
//!
//!     let app = marketplace::routes(store, "treasury-address".to_owned());
//!     Server::bind(([0, 0, 0, 0], 4000).into()).serve(app).await.unwrap();
//! }
//! ```

mod body;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod store;

pub mod config;
pub mod marketplace;

pub use body::MAX_BODY_BYTES;
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use server::{Server, respond};
pub use store::{Collection, CollectionStore, record_id};
