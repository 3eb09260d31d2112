use serde::{Deserialize, Serialize};

use invoicer_clients::ClientDraft;
use invoicer_core::{ClientId, DomainError, DomainResult};
use invoicer_invoicing::{InvoiceFields, InvoiceStatus, LineItemFields};

// -------------------------
// Request DTOs
// -------------------------
//
// Every field is optional here; required fields are enforced by the domain
// constructors so that a missing field is a 400 with a readable message.

#[derive(Debug, Default, Deserialize)]
pub struct ClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ClientRequest {
    pub fn into_draft(self) -> DomainResult<ClientDraft> {
        ClientDraft::new(self.name, self.email, self.phone, self.address)
    }
}

/// A number sent either as a JSON number or as the text of a form field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Blank text counts as absent.
    fn into_f64(self, field: &str) -> DomainResult<Option<f64>> {
        let value = match self {
            Numeric::Number(n) => n,
            Numeric::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<f64>().map_err(|_| {
                    DomainError::validation(format!("{field} must be a number, got '{raw}'"))
                })?
            }
        };

        if !value.is_finite() {
            return Err(DomainError::validation(format!("{field} must be a finite number")));
        }
        Ok(Some(value))
    }
}

fn optional_number(value: Option<Numeric>, field: &str) -> DomainResult<Option<f64>> {
    value.map(|v| v.into_f64(field)).transpose().map(Option::flatten)
}

/// Client reference on an invoice: an id, its text form, or empty/null for none.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientRef {
    Id(i64),
    Text(String),
}

impl ClientRef {
    fn into_client_id(self) -> DomainResult<Option<ClientId>> {
        match self {
            ClientRef::Id(id) => Ok(Some(ClientId::new(id))),
            ClientRef::Text(raw) if raw.trim().is_empty() => Ok(None),
            ClientRef::Text(raw) => raw.parse().map(Some),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LineItemRequest {
    pub description: Option<String>,
    pub quantity: Option<Numeric>,
    pub unit_price: Option<Numeric>,
}

impl LineItemRequest {
    pub fn into_fields(self) -> DomainResult<LineItemFields> {
        Ok(LineItemFields {
            description: self.description,
            quantity: optional_number(self.quantity, "quantity")?,
            unit_price: optional_number(self.unit_price, "unit_price")?,
        })
    }
}

/// Body of `POST /api/invoices` and `PUT /api/invoices/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceRequest {
    pub client_id: Option<ClientRef>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub tax_rate: Option<Numeric>,
    pub notes: Option<String>,
    pub items: Option<Vec<LineItemRequest>>,
}

impl InvoiceRequest {
    pub fn into_fields(self) -> DomainResult<InvoiceFields> {
        let client_id = self.client_id.map(ClientRef::into_client_id).transpose()?.flatten();
        let items = self
            .items
            .map(|items| {
                items
                    .into_iter()
                    .map(LineItemRequest::into_fields)
                    .collect()
            })
            .transpose()?;

        Ok(InvoiceFields {
            client_id,
            date: self.date,
            due_date: self.due_date,
            status: self.status,
            tax_rate: optional_number(self.tax_rate, "tax_rate")?,
            notes: self.notes,
            items,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

impl StatusRequest {
    pub fn into_status(self) -> DomainResult<InvoiceStatus> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Err(DomainError::validation("status is required")),
            Some(raw) => raw.parse(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
}

impl ListInvoicesQuery {
    /// `None` (no filter) when the parameter is absent or blank.
    pub fn status_filter(&self) -> DomainResult<Option<InvoiceStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice_request(body: serde_json::Value) -> InvoiceRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn numbers_may_arrive_as_text() {
        let fields = invoice_request(json!({
            "client_id": "3",
            "tax_rate": "7.5",
            "items": [{"description": "Widget", "quantity": "2", "unit_price": 50}]
        }))
        .into_fields()
        .unwrap();

        assert_eq!(fields.client_id, Some(ClientId::new(3)));
        assert_eq!(fields.tax_rate, Some(7.5));
        let items = fields.items.unwrap();
        assert_eq!(items[0].quantity, Some(2.0));
        assert_eq!(items[0].unit_price, Some(50.0));
    }

    #[test]
    fn blank_client_and_numbers_count_as_absent() {
        let fields = invoice_request(json!({
            "client_id": "",
            "tax_rate": null,
            "items": [{"description": "Widget", "quantity": " "}]
        }))
        .into_fields()
        .unwrap();

        assert_eq!(fields.client_id, None);
        assert_eq!(fields.tax_rate, None);
        assert_eq!(fields.items.unwrap()[0].quantity, None);
    }

    #[test]
    fn unparseable_numbers_are_validation_errors() {
        let err = invoice_request(json!({"tax_rate": "ten"}))
            .into_fields()
            .unwrap_err();
        assert_eq!(err, DomainError::validation("tax_rate must be a number, got 'ten'"));

        let err = invoice_request(json!({"client_id": "acme"}))
            .into_fields()
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn status_request_requires_a_known_status() {
        assert!(StatusRequest::default().into_status().is_err());
        let req = StatusRequest { status: Some("paid".into()) };
        assert_eq!(req.into_status().unwrap(), InvoiceStatus::Paid);
        let req = StatusRequest { status: Some("void".into()) };
        assert!(matches!(req.into_status(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn blank_status_query_means_no_filter() {
        let query = ListInvoicesQuery { status: Some(String::new()) };
        assert_eq!(query.status_filter().unwrap(), None);
        let query = ListInvoicesQuery { status: Some("sent".into()) };
        assert_eq!(query.status_filter().unwrap(), Some(InvoiceStatus::Sent));
    }
}
