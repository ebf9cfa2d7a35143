use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
}

/// Raw account record as the backend serves it. The flattened `userId` /
/// `username` / `email` fields are present on list and detail responses but
/// not guaranteed on every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: Uuid,
    pub number: String,
    pub name: String,
    pub balance: Decimal,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client-side account view model.
///
/// `balance` is authoritative only as of the last successful fetch; it goes
/// stale the moment any mutating operation succeeds, until the owning cache
/// key is refetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub account_name: String,
    pub account_number: String,
    pub balance: Decimal,
    pub currency: String,
    pub account_type: AccountType,
    pub created_at: NaiveDateTime,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            account_name: record.name,
            account_number: record.number,
            balance: record.balance,
            created_at: record.created_at,
            // Compatibility shim: the backend does not persist currency or
            // account type yet. Remove the fixed defaults once it does.
            currency: "TRY".to_string(),
            account_type: AccountType::Checking,
        }
    }
}
