//! Client entities (database row mappings).

use sqlx::FromRow;

use domain::models::client::{Client, ClientSummary, Phone};

/// Database row mapping for the client table.
#[derive(Debug, Clone, FromRow)]
pub struct ClientEntity {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<ClientEntity> for Client {
    fn from(entity: ClientEntity) -> Self {
        Self {
            id: entity.id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
        }
    }
}

/// Database row mapping for the client_phone table.
#[derive(Debug, Clone, FromRow)]
pub struct PhoneEntity {
    pub id: i32,
    pub client_id: Option<i32>,
    pub phone: Option<String>,
}

impl PhoneEntity {
    /// Converts to the domain model. Rows without an owner have no domain counterpart.
    pub fn into_domain(self) -> Option<Phone> {
        Some(Phone {
            id: self.id,
            client_id: self.client_id?,
            phone: self.phone,
        })
    }
}

/// A client row joined with its aggregated phones.
#[derive(Debug, Clone, FromRow)]
pub struct ClientSummaryEntity {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phones: Vec<String>, // TEXT[]; empty when the client owns no phones
}

impl From<ClientSummaryEntity> for ClientSummary {
    fn from(entity: ClientSummaryEntity) -> Self {
        Self {
            id: entity.id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
            phones: entity.phones,
        }
    }
}
