//! `PostgreSQL` record store for Conference Central.
//!
//! This crate implements the `RecordStore` trait from `conference-core` on
//! top of a sqlx connection pool:
//!
//! - Profiles and conferences as versioned rows
//! - Atomic multi-record commits with optimistic concurrency
//! - Conference queries compiled to SQL
//! - Embedded migrations
//!
//! # Example
//!
//! ```ignore
//! use conference_postgres::PostgresRecordStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresRecordStore::connect("postgres://localhost/conference", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod query;
mod record_store;

pub use record_store::PostgresRecordStore;
