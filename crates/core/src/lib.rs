//! Domain foundation: identifiers and the shared error type.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ClientId, InvoiceId, InvoiceItemId};
