use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use invoicer_core::{ClientId, DomainError, DomainResult, InvoiceId, InvoiceItemId};

use crate::number::InvoiceNumber;
use crate::status::InvoiceStatus;
use crate::totals::{LineAmount, Totals};

/// Quantity applied when a line item omits it.
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Unit price applied when a line item omits it.
pub const DEFAULT_UNIT_PRICE: f64 = 0.0;

/// Invoice header as persisted (items live in their own table).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: InvoiceNumber,
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    /// Percentage, e.g. `10.0` for 10 %.
    pub tax_rate: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted line item. Owned by exactly one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl LineAmount for InvoiceItem {
    fn quantity(&self) -> f64 {
        self.quantity
    }

    fn unit_price(&self) -> f64 {
        self.unit_price
    }
}

/// A validated line item that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl LineAmount for NewInvoiceItem {
    fn quantity(&self) -> f64 {
        self.quantity
    }

    fn unit_price(&self) -> f64 {
        self.unit_price
    }
}

/// Raw line item input, before defaults and validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemFields {
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
}

impl NewInvoiceItem {
    /// Apply defaults (quantity 1, unit price 0) and require a description.
    ///
    /// Only an absent value is defaulted; an explicit zero stays zero.
    pub fn from_fields(fields: LineItemFields) -> DomainResult<Self> {
        let description = non_blank(fields.description)
            .ok_or_else(|| DomainError::validation("item description is required"))?;

        Ok(Self {
            description,
            quantity: fields.quantity.unwrap_or(DEFAULT_QUANTITY),
            unit_price: fields.unit_price.unwrap_or(DEFAULT_UNIT_PRICE),
        })
    }
}

/// Raw invoice input as received from a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceFields {
    pub client_id: Option<ClientId>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub tax_rate: Option<f64>,
    pub notes: Option<String>,
    pub items: Option<Vec<LineItemFields>>,
}

/// Validated input for creating an invoice. The number is assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub client_id: Option<ClientId>,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub tax_rate: f64,
    pub notes: Option<String>,
    pub items: Vec<NewInvoiceItem>,
}

impl InvoiceDraft {
    pub fn new(fields: InvoiceFields) -> DomainResult<Self> {
        let (Some(date), Some(due_date)) = (non_blank(fields.date), non_blank(fields.due_date))
        else {
            return Err(DomainError::validation("date and due_date are required"));
        };

        Ok(Self {
            client_id: fields.client_id,
            date: parse_date("date", &date)?,
            due_date: parse_date("due_date", &due_date)?,
            status: parse_status(fields.status)?.unwrap_or_default(),
            tax_rate: validate_tax_rate(fields.tax_rate)?.unwrap_or(0.0),
            notes: non_blank(fields.notes),
            items: parse_items(fields.items)?,
        })
    }

    pub fn into_invoice(
        self,
        id: InvoiceId,
        invoice_number: InvoiceNumber,
        created_at: DateTime<Utc>,
    ) -> (Invoice, Vec<NewInvoiceItem>) {
        let invoice = Invoice {
            id,
            invoice_number,
            client_id: self.client_id,
            date: self.date,
            due_date: self.due_date,
            status: self.status,
            tax_rate: self.tax_rate,
            notes: self.notes,
            created_at,
        };
        (invoice, self.items)
    }
}

/// Validated input for a full invoice update.
///
/// Merge rules: the client reference is always replaced (absent clears it);
/// date, due date, status, tax rate and notes keep their stored value when
/// absent; the item list is always replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceUpdate {
    client_id: Option<ClientId>,
    date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    status: Option<InvoiceStatus>,
    tax_rate: Option<f64>,
    /// `Some("")` clears the notes; `None` keeps them.
    notes: Option<String>,
    items: Vec<NewInvoiceItem>,
}

impl InvoiceUpdate {
    pub fn new(fields: InvoiceFields) -> DomainResult<Self> {
        Ok(Self {
            client_id: fields.client_id,
            date: non_blank(fields.date)
                .map(|d| parse_date("date", &d))
                .transpose()?,
            due_date: non_blank(fields.due_date)
                .map(|d| parse_date("due_date", &d))
                .transpose()?,
            status: parse_status(fields.status)?,
            tax_rate: validate_tax_rate(fields.tax_rate)?,
            notes: fields.notes,
            items: parse_items(fields.items)?,
        })
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn items(&self) -> &[NewInvoiceItem] {
        &self.items
    }

    /// Merge this update onto the stored header. Id, number and creation time never change.
    pub fn apply_to(&self, current: &Invoice) -> Invoice {
        Invoice {
            id: current.id,
            invoice_number: current.invoice_number,
            client_id: self.client_id,
            date: self.date.unwrap_or(current.date),
            due_date: self.due_date.unwrap_or(current.due_date),
            status: self.status.unwrap_or(current.status),
            tax_rate: self.tax_rate.unwrap_or(current.tax_rate),
            notes: match &self.notes {
                Some(notes) => non_blank(Some(notes.clone())),
                None => current.notes.clone(),
            },
            created_at: current.created_at,
        }
    }
}

/// Client columns shown alongside an invoice (all absent when no client is linked).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_address: Option<String>,
}

/// Invoice list row: header, client name and derived totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client_name: Option<String>,
    #[serde(flatten)]
    pub totals: Totals,
}

impl InvoiceSummary {
    pub fn new(invoice: Invoice, client_name: Option<String>, items: &[InvoiceItem]) -> Self {
        let totals = Totals::compute(items, invoice.tax_rate);
        Self {
            invoice,
            client_name,
            totals,
        }
    }
}

/// Full invoice view: header, client details, items and derived totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    #[serde(flatten)]
    pub client: ClientSnapshot,
    pub items: Vec<InvoiceItem>,
    #[serde(flatten)]
    pub totals: Totals,
}

impl InvoiceDetail {
    pub fn new(invoice: Invoice, client: ClientSnapshot, items: Vec<InvoiceItem>) -> Self {
        let totals = Totals::compute(&items, invoice.tax_rate);
        Self {
            invoice,
            client,
            items,
            totals,
        }
    }
}

fn parse_date(field: &str, raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        DomainError::validation(format!("{field} must be a date in YYYY-MM-DD format, got '{raw}'"))
    })
}

fn parse_status(raw: Option<String>) -> DomainResult<Option<InvoiceStatus>> {
    non_blank(raw).map(|s| s.parse()).transpose()
}

fn validate_tax_rate(raw: Option<f64>) -> DomainResult<Option<f64>> {
    match raw {
        Some(rate) if !rate.is_finite() => Err(DomainError::validation(
            "tax_rate must be a finite number",
        )),
        other => Ok(other),
    }
}

fn parse_items(raw: Option<Vec<LineItemFields>>) -> DomainResult<Vec<NewInvoiceItem>> {
    raw.unwrap_or_default()
        .into_iter()
        .map(NewInvoiceItem::from_fields)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
