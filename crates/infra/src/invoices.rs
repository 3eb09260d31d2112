//! Invoice persistence.
//!
//! Every mutation runs in a single transaction: the invoice header and its
//! items are written (or replaced, or removed) together or not at all. The
//! next invoice number is read inside the same transaction that inserts the
//! invoice, and `UNIQUE(invoice_number)` turns a lost race into a conflict
//! instead of a duplicate.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::{Span, instrument};

use invoicer_core::{ClientId, DomainError, InvoiceId, InvoiceItemId};
use invoicer_invoicing::{
    ClientSnapshot, Invoice, InvoiceDetail, InvoiceDraft, InvoiceItem, InvoiceNumber,
    InvoiceStatus, InvoiceSummary, InvoiceUpdate, NewInvoiceItem,
};

use crate::db::SqliteStore;
use crate::error::{StoreError, sqlx_err};

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: i64,
    invoice_number: String,
    client_id: Option<i64>,
    date: NaiveDate,
    due_date: NaiveDate,
    status: String,
    tax_rate: f64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = StoreError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let invoice_number = row
            .invoice_number
            .parse::<InvoiceNumber>()
            .map_err(|e| StoreError::Decode(format!("invoice {}: {e}", row.id)))?;
        let status = row
            .status
            .parse::<InvoiceStatus>()
            .map_err(|e| StoreError::Decode(format!("invoice {}: {e}", row.id)))?;

        Ok(Invoice {
            id: InvoiceId::new(row.id),
            invoice_number,
            client_id: row.client_id.map(ClientId::new),
            date: row.date,
            due_date: row.due_date,
            status,
            tax_rate: row.tax_rate,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InvoiceListRow {
    #[sqlx(flatten)]
    invoice: InvoiceRow,
    client_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct InvoiceDetailRow {
    #[sqlx(flatten)]
    invoice: InvoiceRow,
    client_name: Option<String>,
    client_email: Option<String>,
    client_phone: Option<String>,
    client_address: Option<String>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    invoice_id: i64,
    description: String,
    quantity: f64,
    unit_price: f64,
}

impl From<ItemRow> for InvoiceItem {
    fn from(row: ItemRow) -> Self {
        InvoiceItem {
            id: InvoiceItemId::new(row.id),
            invoice_id: InvoiceId::new(row.invoice_id),
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

impl SqliteStore {
    /// Invoices with client name and derived totals, newest first.
    ///
    /// `status` narrows the list to exactly the invoices in that status.
    /// `created_at` is RFC 3339 text of varying precision, so it is compared
    /// through `julianday` rather than as a string.
    #[instrument(skip(self), fields(invoice_count), err)]
    pub async fn list_invoices(
        &self,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<InvoiceSummary>, StoreError> {
        let status_filter = status.map(InvoiceStatus::as_str);
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(sqlx_err("begin_transaction"))?;

        let rows: Vec<InvoiceListRow> = sqlx::query_as(
            r#"
            SELECT
                i.id, i.invoice_number, i.client_id, i.date, i.due_date,
                i.status, i.tax_rate, i.notes, i.created_at,
                c.name AS client_name
            FROM invoices i
            LEFT JOIN clients c ON c.id = i.client_id
            WHERE (?1 IS NULL OR i.status = ?1)
            ORDER BY julianday(i.created_at) DESC, i.id DESC
            "#,
        )
        .bind(status_filter)
        .fetch_all(&mut *tx)
        .await
        .map_err(sqlx_err("list_invoices"))?;

        let item_rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT it.id, it.invoice_id, it.description, it.quantity, it.unit_price
            FROM invoice_items it
            JOIN invoices i ON i.id = it.invoice_id
            WHERE (?1 IS NULL OR i.status = ?1)
            ORDER BY it.id ASC
            "#,
        )
        .bind(status_filter)
        .fetch_all(&mut *tx)
        .await
        .map_err(sqlx_err("list_invoice_items"))?;

        tx.commit().await.map_err(sqlx_err("commit_transaction"))?;

        let mut items_by_invoice: HashMap<i64, Vec<InvoiceItem>> = HashMap::new();
        for row in item_rows {
            items_by_invoice
                .entry(row.invoice_id)
                .or_default()
                .push(row.into());
        }

        Span::current().record("invoice_count", rows.len());
        rows.into_iter()
            .map(|row| {
                let items = items_by_invoice.remove(&row.invoice.id).unwrap_or_default();
                let invoice = Invoice::try_from(row.invoice)?;
                Ok::<_, StoreError>(InvoiceSummary::new(invoice, row.client_name, &items))
            })
            .collect()
    }

    #[instrument(skip(self), fields(invoice_id = %id), err)]
    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Option<InvoiceDetail>, StoreError> {
        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(sqlx_err("acquire_connection"))?;
        fetch_detail(&mut conn, id).await
    }

    /// Create an invoice and its items, assigning the next invoice number.
    #[instrument(
        skip(self, draft),
        fields(item_count = draft.items.len(), invoice_id, invoice_number),
        err
    )]
    pub async fn create_invoice(&self, draft: InvoiceDraft) -> Result<InvoiceDetail, StoreError> {
        let mut tx = self.begin_write().await?;

        let client = match draft.client_id {
            Some(client_id) => fetch_client_snapshot(&mut tx, client_id).await?,
            None => ClientSnapshot::default(),
        };

        let invoice_number = next_invoice_number(&mut tx).await?;
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_number, client_id, date, due_date, status, tax_rate, notes, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(invoice_number.to_string())
        .bind(draft.client_id.map(ClientId::get))
        .bind(draft.date)
        .bind(draft.due_date)
        .bind(draft.status.as_str())
        .bind(draft.tax_rate)
        .bind(draft.notes.as_deref())
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(sqlx_err("insert_invoice"))?;

        let id = InvoiceId::new(result.last_insert_rowid());
        let (invoice, new_items) = draft.into_invoice(id, invoice_number, created_at);
        let items = insert_items(&mut tx, id, &new_items).await?;

        tx.commit().await.map_err(sqlx_err("commit_transaction"))?;

        let span = Span::current();
        span.record("invoice_id", id.get());
        span.record("invoice_number", tracing::field::display(invoice_number));
        tracing::info!(invoice_id = %id, invoice_number = %invoice_number, "invoice created");

        Ok(InvoiceDetail::new(invoice, client, items))
    }

    /// Apply a full update: merge the header and replace every item.
    ///
    /// `None` if the invoice does not exist.
    #[instrument(
        skip(self, update),
        fields(invoice_id = %id, item_count = update.items().len()),
        err
    )]
    pub async fn update_invoice(
        &self,
        id: InvoiceId,
        update: InvoiceUpdate,
    ) -> Result<Option<InvoiceDetail>, StoreError> {
        let mut tx = self.begin_write().await?;

        let Some(current) = fetch_invoice(&mut tx, id).await? else {
            return Ok(None);
        };

        let client = match update.client_id() {
            Some(client_id) => fetch_client_snapshot(&mut tx, client_id).await?,
            None => ClientSnapshot::default(),
        };

        let merged = update.apply_to(&current);

        sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = ?1, date = ?2, due_date = ?3, status = ?4, tax_rate = ?5, notes = ?6
            WHERE id = ?7
            "#,
        )
        .bind(merged.client_id.map(ClientId::get))
        .bind(merged.date)
        .bind(merged.due_date)
        .bind(merged.status.as_str())
        .bind(merged.tax_rate)
        .bind(merged.notes.as_deref())
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(sqlx_err("update_invoice"))?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(sqlx_err("delete_invoice_items"))?;

        let items = insert_items(&mut tx, id, update.items()).await?;

        tx.commit().await.map_err(sqlx_err("commit_transaction"))?;

        Ok(Some(InvoiceDetail::new(merged, client, items)))
    }

    /// Move an invoice to `status`. `None` if the invoice does not exist.
    #[instrument(skip(self), fields(invoice_id = %id, status = %status), err)]
    pub async fn set_invoice_status(
        &self,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<Option<InvoiceDetail>, StoreError> {
        let mut tx = self.begin_write().await?;

        let updated = sqlx::query("UPDATE invoices SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(sqlx_err("set_invoice_status"))?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        let detail = fetch_detail(&mut tx, id).await?;
        tx.commit().await.map_err(sqlx_err("commit_transaction"))?;
        Ok(detail)
    }

    /// Delete an invoice; its items go with it. `false` if it did not exist.
    #[instrument(skip(self), fields(invoice_id = %id), err)]
    pub async fn delete_invoice(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id.get())
            .execute(self.pool())
            .await
            .map_err(sqlx_err("delete_invoice"))?
            .rows_affected();

        Ok(deleted > 0)
    }
}

async fn next_invoice_number(conn: &mut SqliteConnection) -> Result<InvoiceNumber, StoreError> {
    let latest: Option<String> =
        sqlx::query_scalar("SELECT invoice_number FROM invoices ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await
            .map_err(sqlx_err("latest_invoice_number"))?;

    Ok(InvoiceNumber::next_after(latest.as_deref())?)
}

/// Client columns for an invoice that references `client_id`; the client must exist.
async fn fetch_client_snapshot(
    conn: &mut SqliteConnection,
    client_id: ClientId,
) -> Result<ClientSnapshot, StoreError> {
    let row: Option<(String, Option<String>, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT name, email, phone, address FROM clients WHERE id = ?1")
            .bind(client_id.get())
            .fetch_optional(&mut *conn)
            .await
            .map_err(sqlx_err("fetch_client"))?;

    let (name, email, phone, address) = row.ok_or_else(|| {
        DomainError::validation(format!("client {client_id} does not exist"))
    })?;

    Ok(ClientSnapshot {
        client_name: Some(name),
        client_email: email,
        client_phone: phone,
        client_address: address,
    })
}

async fn insert_items(
    conn: &mut SqliteConnection,
    invoice_id: InvoiceId,
    items: &[NewInvoiceItem],
) -> Result<Vec<InvoiceItem>, StoreError> {
    let mut stored = Vec::with_capacity(items.len());
    for item in items {
        let result = sqlx::query(
            r#"
            INSERT INTO invoice_items (invoice_id, description, quantity, unit_price)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(invoice_id.get())
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await
        .map_err(sqlx_err("insert_invoice_item"))?;

        stored.push(InvoiceItem {
            id: InvoiceItemId::new(result.last_insert_rowid()),
            invoice_id,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }
    Ok(stored)
}

async fn fetch_invoice(
    conn: &mut SqliteConnection,
    id: InvoiceId,
) -> Result<Option<Invoice>, StoreError> {
    let row: Option<InvoiceRow> = sqlx::query_as(
        r#"
        SELECT id, invoice_number, client_id, date, due_date, status, tax_rate, notes, created_at
        FROM invoices
        WHERE id = ?1
        "#,
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(sqlx_err("fetch_invoice"))?;

    row.map(Invoice::try_from).transpose()
}

async fn fetch_detail(
    conn: &mut SqliteConnection,
    id: InvoiceId,
) -> Result<Option<InvoiceDetail>, StoreError> {
    let row: Option<InvoiceDetailRow> = sqlx::query_as(
        r#"
        SELECT
            i.id, i.invoice_number, i.client_id, i.date, i.due_date,
            i.status, i.tax_rate, i.notes, i.created_at,
            c.name AS client_name,
            c.email AS client_email,
            c.phone AS client_phone,
            c.address AS client_address
        FROM invoices i
        LEFT JOIN clients c ON c.id = i.client_id
        WHERE i.id = ?1
        "#,
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(sqlx_err("fetch_invoice_detail"))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items: Vec<ItemRow> = sqlx::query_as(
        r#"
        SELECT id, invoice_id, description, quantity, unit_price
        FROM invoice_items
        WHERE invoice_id = ?1
        ORDER BY id ASC
        "#,
    )
    .bind(id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(sqlx_err("fetch_invoice_items"))?;

    let client = ClientSnapshot {
        client_name: row.client_name,
        client_email: row.client_email,
        client_phone: row.client_phone,
        client_address: row.client_address,
    };

    Ok(Some(InvoiceDetail::new(
        Invoice::try_from(row.invoice)?,
        client,
        items.into_iter().map(InvoiceItem::from).collect(),
    )))
}
