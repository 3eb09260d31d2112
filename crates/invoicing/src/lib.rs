//! Invoicing domain module.
//!
//! This crate contains the business rules for invoices: lifecycle status,
//! sequential invoice numbering, the totals engine, and the validation and
//! merge rules applied to invoice input. Everything here is deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod invoice;
pub mod number;
pub mod status;
pub mod totals;

pub use invoice::{
    ClientSnapshot, Invoice, InvoiceDetail, InvoiceDraft, InvoiceFields, InvoiceItem,
    InvoiceSummary, InvoiceUpdate, LineItemFields, NewInvoiceItem,
};
pub use number::InvoiceNumber;
pub use status::InvoiceStatus;
pub use totals::{LineAmount, Totals};
