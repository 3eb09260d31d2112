//! Infrastructure layer: SQLite storage for clients and invoices.

pub mod clients;
pub mod db;
pub mod error;
pub mod invoices;

pub use db::SqliteStore;
pub use error::StoreError;
