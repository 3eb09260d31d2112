//! Schema bootstrap. Idempotent; runs on every connect.

use sqlx::SqlitePool;

use crate::error::{StoreError, sqlx_err};

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        email       TEXT,
        phone       TEXT,
        address     TEXT,
        created_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_number  TEXT NOT NULL UNIQUE,
        client_id       INTEGER NULL REFERENCES clients(id),
        date            TEXT NOT NULL,
        due_date        TEXT NOT NULL,
        status          TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'sent', 'paid')),
        tax_rate        REAL NOT NULL DEFAULT 0,
        notes           TEXT,
        created_at      TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoice_items (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_id   INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
        description  TEXT NOT NULL,
        quantity     REAL NOT NULL DEFAULT 1,
        unit_price   REAL NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_invoice_items_invoice_id ON invoice_items (invoice_id)",
    "CREATE INDEX IF NOT EXISTS idx_invoices_client_id ON invoices (client_id)",
];

pub(crate) async fn bootstrap(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(sqlx_err("bootstrap_schema"))?;
    }
    Ok(())
}
