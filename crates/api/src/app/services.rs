//! Application services shared by every handler.
//!
//! Turns domain input into store calls and missing rows into `NotFound`, so
//! handlers only deal with HTTP concerns.

use invoicer_clients::{Client, ClientDraft};
use invoicer_core::{ClientId, DomainError, InvoiceId};
use invoicer_infra::{SqliteStore, StoreError};
use invoicer_invoicing::{
    InvoiceDetail, InvoiceDraft, InvoiceFields, InvoiceStatus, InvoiceSummary, InvoiceUpdate,
};

pub struct AppServices {
    store: SqliteStore,
}

fn client_not_found() -> StoreError {
    DomainError::not_found("Client").into()
}

fn invoice_not_found() -> StoreError {
    DomainError::not_found("Invoice").into()
}

impl AppServices {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.store.list_clients().await
    }

    pub async fn client(&self, id: ClientId) -> Result<Client, StoreError> {
        self.store.get_client(id).await?.ok_or_else(client_not_found)
    }

    pub async fn create_client(&self, draft: ClientDraft) -> Result<Client, StoreError> {
        self.store.create_client(draft).await
    }

    pub async fn update_client(
        &self,
        id: ClientId,
        draft: ClientDraft,
    ) -> Result<Client, StoreError> {
        self.store.update_client(id, draft).await?.ok_or_else(client_not_found)
    }

    pub async fn delete_client(&self, id: ClientId) -> Result<(), StoreError> {
        if self.store.delete_client(id).await? {
            Ok(())
        } else {
            Err(client_not_found())
        }
    }

    pub async fn list_invoices(
        &self,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<InvoiceSummary>, StoreError> {
        self.store.list_invoices(status).await
    }

    pub async fn invoice(&self, id: InvoiceId) -> Result<InvoiceDetail, StoreError> {
        self.store.get_invoice(id).await?.ok_or_else(invoice_not_found)
    }

    pub async fn create_invoice(&self, fields: InvoiceFields) -> Result<InvoiceDetail, StoreError> {
        let draft = InvoiceDraft::new(fields)?;
        self.store.create_invoice(draft).await
    }

    pub async fn update_invoice(
        &self,
        id: InvoiceId,
        fields: InvoiceFields,
    ) -> Result<InvoiceDetail, StoreError> {
        let update = InvoiceUpdate::new(fields)?;
        self.store.update_invoice(id, update).await?.ok_or_else(invoice_not_found)
    }

    pub async fn set_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<InvoiceDetail, StoreError> {
        self.store.set_invoice_status(id, status).await?.ok_or_else(invoice_not_found)
    }

    pub async fn delete_invoice(&self, id: InvoiceId) -> Result<(), StoreError> {
        if self.store.delete_invoice(id).await? {
            Ok(())
        } else {
            Err(invoice_not_found())
        }
    }
}
