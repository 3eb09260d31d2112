use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicer_core::{ClientId, DomainError, DomainResult};

/// Contact information for a client.
///
/// Every field is optional; blank strings are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactInfo {
    pub fn new(email: Option<String>, phone: Option<String>, address: Option<String>) -> Self {
        Self {
            email: non_blank(email),
            phone: non_blank(phone),
            address: non_blank(address),
        }
    }
}

/// A billable client as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

/// Validated client input, used for both create and full-replacement update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    name: String,
    contact: ContactInfo,
}

impl ClientDraft {
    /// Validate raw client fields.
    ///
    /// `name` is required and must contain something other than whitespace.
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> DomainResult<Self> {
        let name = non_blank(name).ok_or_else(|| DomainError::validation("name is required"))?;

        Ok(Self {
            name,
            contact: ContactInfo::new(email, phone, address),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    /// Materialize the draft once storage has assigned an id and timestamp.
    pub fn into_client(self, id: ClientId, created_at: DateTime<Utc>) -> Client {
        Client {
            id,
            name: self.name,
            contact: self.contact,
            created_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
