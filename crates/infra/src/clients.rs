//! Client persistence.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{Span, instrument};

use invoicer_clients::{Client, ClientDraft, ContactInfo};
use invoicer_core::{ClientId, DomainError};

use crate::db::SqliteStore;
use crate::error::{StoreError, sqlx_err};

#[derive(Debug, FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: ClientId::new(row.id),
            name: row.name,
            contact: ContactInfo {
                email: row.email,
                phone: row.phone,
                address: row.address,
            },
            created_at: row.created_at,
        }
    }
}

impl SqliteStore {
    /// All clients, alphabetically by name.
    #[instrument(skip(self), fields(client_count), err)]
    pub async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, phone, address, created_at
            FROM clients
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(sqlx_err("list_clients"))?;

        Span::current().record("client_count", rows.len());
        Ok(rows.into_iter().map(Client::from).collect())
    }

    #[instrument(skip(self), fields(client_id = %id), err)]
    pub async fn get_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, phone, address, created_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id.get())
        .fetch_optional(self.pool())
        .await
        .map_err(sqlx_err("get_client"))?;

        Ok(row.map(Client::from))
    }

    #[instrument(skip(self, draft), fields(name = %draft.name()), err)]
    pub async fn create_client(&self, draft: ClientDraft) -> Result<Client, StoreError> {
        let created_at = Utc::now();
        let contact = draft.contact();

        let result = sqlx::query(
            r#"
            INSERT INTO clients (name, email, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(draft.name())
        .bind(contact.email.as_deref())
        .bind(contact.phone.as_deref())
        .bind(contact.address.as_deref())
        .bind(created_at)
        .execute(self.pool())
        .await
        .map_err(sqlx_err("create_client"))?;

        let id = ClientId::new(result.last_insert_rowid());
        tracing::info!(client_id = %id, "client created");
        Ok(draft.into_client(id, created_at))
    }

    /// Replace a client's name and contact details. `None` if the client does not exist.
    #[instrument(skip(self, draft), fields(client_id = %id), err)]
    pub async fn update_client(
        &self,
        id: ClientId,
        draft: ClientDraft,
    ) -> Result<Option<Client>, StoreError> {
        let contact = draft.contact();

        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            UPDATE clients
            SET name = ?1, email = ?2, phone = ?3, address = ?4
            WHERE id = ?5
            RETURNING id, name, email, phone, address, created_at
            "#,
        )
        .bind(draft.name())
        .bind(contact.email.as_deref())
        .bind(contact.phone.as_deref())
        .bind(contact.address.as_deref())
        .bind(id.get())
        .fetch_optional(self.pool())
        .await
        .map_err(sqlx_err("update_client"))?;

        Ok(row.map(Client::from))
    }

    /// Delete a client. `false` if it did not exist.
    ///
    /// A client still referenced by invoices cannot be deleted.
    #[instrument(skip(self), fields(client_id = %id), err)]
    pub async fn delete_client(&self, id: ClientId) -> Result<bool, StoreError> {
        let mut tx = self.begin_write().await?;

        let referencing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE client_id = ?1")
                .bind(id.get())
                .fetch_one(&mut *tx)
                .await
                .map_err(sqlx_err("count_client_invoices"))?;

        if referencing > 0 {
            return Err(DomainError::conflict(format!(
                "client {id} is referenced by {referencing} invoice(s)"
            ))
            .into());
        }

        let deleted = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(sqlx_err("delete_client"))?
            .rows_affected();

        tx.commit().await.map_err(sqlx_err("commit_transaction"))?;
        Ok(deleted > 0)
    }
}
