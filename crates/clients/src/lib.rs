//! Clients domain module.
//!
//! This crate contains the client record and the rules for accepting client
//! input, implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod client;

pub use client::{Client, ClientDraft, ContactInfo};
